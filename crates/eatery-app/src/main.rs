use std::time::Duration;

use eatery_hex::application::admin_service::AdminService;
use eatery_hex::config::Config;
use eatery_hex::inbound::http::{HttpServer, HttpServerConfig};
use eatery_paystack::PaystackClient;
use eatery_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / PAYSTACK_* when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "repository ready");

    let gateway = PaystackClient::builder(&config.paystack_secret_key)?
        .with_base_url(&config.paystack_base_url)?
        .with_timeout(Duration::from_secs(30))
        .build()?;
    let service = AdminService::new(repo, gateway);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(service, server_cfg).await?;
    http.run().await
}
