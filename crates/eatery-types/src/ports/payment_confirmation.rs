use std::time::Duration;

use async_trait::async_trait;

use crate::domain::payment::PaymentReference;
use crate::ports::payment_gateway::{GatewayError, InitializedTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The user went through the hosted page; the reference still has to be verified.
    Completed(PaymentReference),
    /// The user closed the payment UI without paying.
    Cancelled,
}

/// How the hosted payment UI is shown and how the app learns it is done.
#[async_trait]
pub trait PaymentConfirmation: Send + Sync + 'static {
    async fn await_confirmation(
        &self,
        transaction: &InitializedTransaction,
    ) -> Result<ConfirmationOutcome, GatewayError>;

    /// Wait applied once before the single verification query.
    fn settlement_delay(&self) -> Duration;
}
