//! eatery-paystack: Paystack transaction API adapter for the payment gateway port

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use eatery_types::domain::payment::PaymentReference;
use eatery_types::ports::payment_gateway::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway,
    TransactionStatus, VerifiedTransaction,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co/";

#[derive(Clone)]
pub struct PaystackClientBuilder {
    secret_key: String,
    base: Url,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct PaystackClient {
    base: Url,
    secret_key: String,
    client: reqwest::Client,
}

impl PaystackClient {
    pub fn new(secret_key: &str) -> anyhow::Result<Self> {
        Self::builder(secret_key)?.build()
    }

    pub fn builder(secret_key: &str) -> anyhow::Result<PaystackClientBuilder> {
        Ok(PaystackClientBuilder {
            secret_key: secret_key.to_string(),
            base: Url::parse(DEFAULT_BASE_URL).context("invalid default base url")?,
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path)
            .map_err(|e| GatewayError::Transport(format!("failed to join url: {e}")))
    }

    /// The reference is pushed as one escaped path segment.
    fn verify_url(&self, reference: &PaymentReference) -> Result<Url, GatewayError> {
        let mut url = self.url("transaction/verify/")?;
        let url_text = url.to_string();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport(format!("base url cannot carry a path: {url_text}")))?
            .pop_if_empty()
            .push(reference.as_str());
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let res = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("gateway returned {status}"));
            tracing::warn!(%status, %message, "paystack request rejected");
            return Err(GatewayError::Rejected(message));
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        match envelope.data {
            Some(data) if envelope.status => Ok(data),
            _ => Err(GatewayError::Rejected(envelope.message)),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor,
            reference: request.reference.as_str(),
            metadata: &request.metadata,
        };
        let data: InitializeData = self
            .send(self.client.post(self.url("transaction/initialize")?).json(&body))
            .await?;
        tracing::debug!(reference = %data.reference, "paystack transaction initialized");
        Ok(InitializedTransaction {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: PaymentReference::new(data.reference),
        })
    }

    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<VerifiedTransaction, GatewayError> {
        let url = self.verify_url(reference)?;
        let data: VerifyData = self.send(self.client.get(url)).await?;
        Ok(VerifiedTransaction {
            reference: data
                .reference
                .map(PaymentReference::new)
                .unwrap_or_else(|| reference.clone()),
            status: data.status,
            amount_minor: data.amount,
            gateway_response: data.gateway_response,
        })
    }
}

impl PaystackClientBuilder {
    pub fn with_base_url(mut self, base_url: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.base = base;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<PaystackClient> {
        if let Some(client) = self.client {
            return Ok(PaystackClient {
                base: self.base,
                secret_key: self.secret_key,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(PaystackClient {
            base: self.base,
            secret_key: self.secret_key,
            client,
        })
    }
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    metadata: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    #[serde(default)]
    access_code: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyData {
    status: TransactionStatus,
    reference: Option<String>,
    amount: Option<i64>,
    gateway_response: Option<String>,
}
