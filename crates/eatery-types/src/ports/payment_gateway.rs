use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentReference;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway answered and refused the request.
    #[error("{0}")]
    Rejected(String),
    #[error("gateway unreachable: {0}")]
    Transport(String),
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Integer minor currency units.
    pub amount_minor: i64,
    pub reference: PaymentReference,
    pub metadata: serde_json::Value,
}

/// Hosted-checkout session returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: PaymentReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
    Abandoned,
    /// Anything the gateway reports that is not settled either way.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedTransaction {
    pub reference: PaymentReference,
    pub status: TransactionStatus,
    pub amount_minor: Option<i64>,
    pub gateway_response: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn initialize(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError>;
    async fn verify(&self, reference: &PaymentReference)
        -> Result<VerifiedTransaction, GatewayError>;
}
