use serde::Deserialize;
use std::env;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co/";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub paystack_secret_key: String,
    pub paystack_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let paystack_secret_key = env::var("PAYSTACK_SECRET_KEY").unwrap_or_default();
        let paystack_base_url =
            env::var("PAYSTACK_BASE_URL").unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.into());
        if paystack_secret_key.is_empty() {
            tracing::warn!("PAYSTACK_SECRET_KEY is not set; payment lookups will be rejected");
        }
        Ok(Self {
            server_port,
            database_url,
            paystack_secret_key,
            paystack_base_url,
        })
    }
}
