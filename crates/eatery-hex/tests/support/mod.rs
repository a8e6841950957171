#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eatery_hex::domain::cart::{CartItem, ItemId};
use eatery_hex::domain::money::Money;
use eatery_hex::domain::order::{FulfillmentStatus, Order};
use eatery_hex::domain::payment::PaymentReference;
use eatery_hex::domain::profile::Session;
use eatery_hex::ports::order_repository::{InsertOutcome, OrderRepository, RepoError};
use eatery_hex::ports::payment_confirmation::{ConfirmationOutcome, PaymentConfirmation};
use eatery_hex::ports::payment_gateway::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway,
    TransactionStatus, VerifiedTransaction,
};
use eatery_repo::memory::InMemoryRepo;
use uuid::Uuid;

pub fn session() -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: "thandi@example.com".into(),
    }
}

pub fn menu_item(id: &str, cents: i64) -> CartItem {
    CartItem {
        id: ItemId::new(id),
        name: id.to_uppercase(),
        description: String::new(),
        unit_price: Money::from_cents(cents),
        customization: None,
    }
}

#[derive(Default)]
struct GatewayScript {
    reject_initialize: Option<String>,
    verify: VecDeque<Result<TransactionStatus, GatewayError>>,
    initialized: Vec<InitializeTransaction>,
    verified: Vec<PaymentReference>,
}

/// Scripted gateway. Verification answers `success` unless told otherwise.
#[derive(Clone, Default)]
pub struct FakeGateway {
    script: Arc<Mutex<GatewayScript>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(message: &str) -> Self {
        let gateway = Self::default();
        gateway.script.lock().unwrap().reject_initialize = Some(message.to_string());
        gateway
    }

    pub fn then_verify(self, answer: Result<TransactionStatus, GatewayError>) -> Self {
        self.script.lock().unwrap().verify.push_back(answer);
        self
    }

    pub fn initialized(&self) -> Vec<InitializeTransaction> {
        self.script.lock().unwrap().initialized.clone()
    }

    pub fn verified(&self) -> Vec<PaymentReference> {
        self.script.lock().unwrap().verified.clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        let mut script = self.script.lock().unwrap();
        if let Some(message) = &script.reject_initialize {
            return Err(GatewayError::Rejected(message.clone()));
        }
        let reference = request.reference.clone();
        script.initialized.push(request);
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.test/{reference}"),
            access_code: "access".into(),
            reference,
        })
    }

    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<VerifiedTransaction, GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.verified.push(reference.clone());
        let status = script
            .verify
            .pop_front()
            .unwrap_or(Ok(TransactionStatus::Success))?;
        let amount_minor = script
            .initialized
            .iter()
            .find(|t| &t.reference == reference)
            .map(|t| t.amount_minor);
        Ok(VerifiedTransaction {
            reference: reference.clone(),
            status,
            amount_minor,
            gateway_response: match status {
                TransactionStatus::Failed => Some("Declined".into()),
                _ => None,
            },
        })
    }
}

/// What the user does once the payment UI is up.
#[derive(Clone, Copy)]
pub enum UserAction {
    Pay,
    Close,
}

pub struct ScriptedConfirmation {
    action: UserAction,
    delay: Duration,
}

impl ScriptedConfirmation {
    pub fn pays() -> Self {
        Self {
            action: UserAction::Pay,
            delay: Duration::ZERO,
        }
    }

    pub fn closes() -> Self {
        Self {
            action: UserAction::Close,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PaymentConfirmation for ScriptedConfirmation {
    async fn await_confirmation(
        &self,
        transaction: &InitializedTransaction,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        Ok(match self.action {
            UserAction::Pay => ConfirmationOutcome::Completed(transaction.reference.clone()),
            UserAction::Close => ConfirmationOutcome::Cancelled,
        })
    }

    fn settlement_delay(&self) -> Duration {
        self.delay
    }
}

/// In-memory orders whose writes can be switched off.
#[derive(Clone, Default)]
pub struct FlakyRepo {
    pub inner: InMemoryRepo,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyRepo {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderRepository for FlakyRepo {
    async fn insert_if_absent(&self, order: Order) -> Result<InsertOutcome, RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::DbError("connection reset".into()));
        }
        self.inner.insert_if_absent(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.inner.get(id).await
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepoError> {
        self.inner.get_by_reference(reference).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.inner.list().await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        self.inner.list_for_user(user_id).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Option<Order>, RepoError> {
        self.inner.update_status(id, status).await
    }
}
