use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eatery_types::ports::order_repository::RepoError;
use serde::Serialize;
use thiserror::Error;

use crate::application::cart_store::CartError;
use crate::application::checkout::PendingCheckout;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Internal(anyhow::anyhow!(e.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}

/// Checkout input the user has to fix before anything else happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a delivery address")]
    MissingAddress,
    #[error("Please enter your email address")]
    MissingEmail,
    #[error("Your cart is empty")]
    EmptyCart,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("no signed-in session")]
    Unauthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The gateway refused to start the payment; nothing was charged.
    #[error("payment could not be started: {0}")]
    Gateway(String),

    /// The gateway reports the payment definitively failed.
    #[error("payment failed: {0}")]
    Verification(String),

    /// Money moved but the order record was not written.
    #[error("payment settled but the order was not saved: {message}")]
    Persistence {
        pending: Box<PendingCheckout>,
        message: String,
    },

    #[error("checkout stopped before the payment was settled")]
    Interrupted,

    #[error(transparent)]
    Cart(#[from] CartError),
}

impl CheckoutError {
    /// Text shown inline on the checkout screen.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Unauthenticated => "Please log in to place an order.".into(),
            CheckoutError::Validation(v) => v.to_string(),
            CheckoutError::Gateway(m) if m.is_empty() => "Failed to initialize payment".into(),
            CheckoutError::Gateway(m) => m.clone(),
            CheckoutError::Verification(m) => {
                format!("Payment was not successful ({m}). You can try again.")
            }
            CheckoutError::Persistence { pending, message } => format!(
                "Payment successful but failed to create order: {message}. \
                 Please contact support and quote reference {}.",
                pending.reference
            ),
            CheckoutError::Interrupted => {
                "Checkout was interrupted. If you completed payment, check your Orders tab.".into()
            }
            CheckoutError::Cart(_) => "Your cart is unavailable. Please restart the app.".into(),
        }
    }

    /// The user may simply try again (with a fresh payment where one is needed).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Validation(_) | CheckoutError::Gateway(_) | CheckoutError::Verification(_)
        )
    }

    /// Paid-but-orderless: distinct from ordinary retryable errors.
    pub fn requires_support(&self) -> bool {
        matches!(self, CheckoutError::Persistence { .. })
    }
}
