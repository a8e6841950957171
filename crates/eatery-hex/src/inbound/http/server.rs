use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::admin_service::{AdminService, PaymentReconciliation, SalesSummary};
use crate::errors::AppError;
use eatery_types::domain::order::{FulfillmentStatus, Order};
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::OrderRepository;
use eatery_types::ports::payment_gateway::PaymentGateway;
use eatery_types::ports::profile_repository::ProfileRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

pub struct HttpServer<R, G> {
    pub service: Arc<AdminService<R, G>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: FulfillmentStatus,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

type Svc<R, G> = State<Arc<AdminService<R, G>>>;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

impl<R, G> HttpServer<R, G>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    pub async fn new(service: AdminService<R, G>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/orders", get(list_orders::<R, G>))
            .route("/orders/{id}", get(get_order::<R, G>))
            .route("/orders/{id}/status", patch(update_status::<R, G>))
            .route("/orders/{id}/advance", post(advance_status::<R, G>))
            .route("/users/{id}/orders", get(orders_for_user::<R, G>))
            .route("/stats", get(sales_summary::<R, G>))
            .route("/customers", get(list_customers::<R, G>))
            .route("/customers/{id}/active", patch(set_customer_active::<R, G>))
            .route("/payments/{reference}", get(reconcile_payment::<R, G>))
            .layer(trace_layer)
            .with_state(self.service.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting admin server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn list_orders<R, G>(State(service): Svc<R, G>) -> Result<Json<Vec<Order>>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.list_orders().await?))
}

async fn get_order<R, G>(
    State(service): Svc<R, G>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    let order = service.get_order(parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn update_status<R, G>(
    State(service): Svc<R, G>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    let updated = service.update_status(parse_id(&id)?, payload.status).await?;
    Ok(Json(updated))
}

async fn advance_status<R, G>(
    State(service): Svc<R, G>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.advance_status(parse_id(&id)?).await?))
}

async fn orders_for_user<R, G>(
    State(service): Svc<R, G>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Order>>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.orders_for_user(parse_id(&id)?).await?))
}

async fn sales_summary<R, G>(State(service): Svc<R, G>) -> Result<Json<SalesSummary>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.sales_summary().await?))
}

async fn list_customers<R, G>(State(service): Svc<R, G>) -> Result<Json<Vec<Profile>>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.list_customers().await?))
}

async fn set_customer_active<R, G>(
    State(service): Svc<R, G>,
    Path(id): Path<String>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<Profile>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    let profile = service
        .set_customer_active(parse_id(&id)?, payload.active)
        .await?;
    Ok(Json(profile))
}

async fn reconcile_payment<R, G>(
    State(service): Svc<R, G>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentReconciliation>, AppError>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    Ok(Json(service.reconcile_payment(&reference).await?))
}
