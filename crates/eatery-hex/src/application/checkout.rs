//! Checkout orchestration: validate, start the payment, wait for the user,
//! verify once, then record the order and empty the cart.
//!
//! Everything after the user confirms runs on a detached task, so an order is
//! still recorded for a settled payment when the caller stops waiting.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eatery_types::domain::cart::CartLineItem;
use eatery_types::domain::money::Money;
use eatery_types::domain::order::{Order, OrderLine};
use eatery_types::domain::payment::{CheckoutMetadata, PaymentReference};
use eatery_types::domain::profile::Session;
use eatery_types::ports::order_repository::OrderRepository;
use eatery_types::ports::payment_confirmation::{ConfirmationOutcome, PaymentConfirmation};
use eatery_types::ports::payment_gateway::{InitializeTransaction, PaymentGateway, TransactionStatus};
use eatery_types::ports::profile_repository::ProfileRepository;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::cart_store::CartHandle;
use crate::errors::{CheckoutError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    ValidatingInputs,
    InitializingPayment,
    AwaitingUserConfirmation,
    VerifyingPayment,
    CreatingOrder,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInput {
    pub address: String,
    pub email: String,
}

/// A payment that was started and confirmed by the user but has no order yet.
/// Holding on to it is enough to finish the checkout later without charging again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub reference: PaymentReference,
    pub user_id: Uuid,
    pub email: String,
    pub address: String,
    pub lines: Vec<OrderLine>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// `created` is false when an earlier attempt already recorded this payment.
    Completed { order: Order, created: bool },
    /// Payment UI closed; nothing was charged or changed.
    Cancelled,
    /// Verification was inconclusive. The cart is kept and no order exists.
    PaymentUnconfirmed {
        pending: PendingCheckout,
        status: Option<TransactionStatus>,
    },
}

impl CheckoutOutcome {
    pub fn user_message(&self) -> &'static str {
        match self {
            CheckoutOutcome::Completed { .. } => "Your order has been placed.",
            CheckoutOutcome::Cancelled => "Payment cancelled.",
            CheckoutOutcome::PaymentUnconfirmed { .. } => {
                "Payment pending. If you completed payment, check your Orders tab shortly."
            }
        }
    }
}

/// Reads the saved delivery address and the session email. A missing or
/// unreadable profile leaves the address blank for the user to type.
pub async fn prefill<P: ProfileRepository>(profiles: &P, session: &Session) -> CheckoutInput {
    let address = match profiles.get_profile(session.user_id).await {
        Ok(profile) => profile.and_then(|p| p.address).unwrap_or_default(),
        Err(e) => {
            warn!(user_id = %session.user_id, error = %e, "could not load saved address");
            String::new()
        }
    };
    CheckoutInput {
        address,
        email: session.email.clone(),
    }
}

pub struct CheckoutService<R, G, C> {
    settlement: Settlement<R, G>,
    confirmation: C,
}

impl<R, G, C> CheckoutService<R, G, C>
where
    R: OrderRepository,
    G: PaymentGateway,
    C: PaymentConfirmation,
{
    pub fn new(orders: R, gateway: G, confirmation: C, cart: CartHandle) -> Self {
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            settlement: Settlement {
                orders: Arc::new(orders),
                gateway: Arc::new(gateway),
                cart,
                state: Arc::new(state),
            },
            confirmation,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.settlement.state.subscribe()
    }

    pub fn state(&self) -> CheckoutState {
        *self.settlement.state.borrow()
    }

    pub fn cart(&self) -> &CartHandle {
        &self.settlement.cart
    }

    #[tracing::instrument(skip_all)]
    pub async fn checkout(
        &self,
        session: Option<&Session>,
        input: CheckoutInput,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let session = session.ok_or(CheckoutError::Unauthenticated)?;
        let pending = match self.start_payment(session, input).await {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                self.settlement.enter(CheckoutState::Idle);
                return Ok(CheckoutOutcome::Cancelled);
            }
            Err(e) => {
                self.settlement.enter(CheckoutState::Idle);
                return Err(e);
            }
        };

        let settlement = self.settlement.clone();
        let delay = self.confirmation.settlement_delay();
        detached(async move { settlement.run(pending, delay).await }).await
    }

    /// Finishes a checkout that ended in `Persistence` or `PaymentUnconfirmed`.
    /// The same reference is verified again; no new payment is started.
    #[tracing::instrument(skip_all, fields(reference = %pending.reference))]
    pub async fn resume(
        &self,
        session: Option<&Session>,
        pending: PendingCheckout,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        match session {
            Some(s) if s.user_id == pending.user_id => {}
            _ => return Err(CheckoutError::Unauthenticated),
        }
        let settlement = self.settlement.clone();
        detached(async move { settlement.run(pending, Duration::ZERO).await }).await
    }

    /// Validation, payment initialization and user confirmation.
    /// `None` means the user closed the payment UI.
    async fn start_payment(
        &self,
        session: &Session,
        input: CheckoutInput,
    ) -> Result<Option<PendingCheckout>, CheckoutError> {
        self.settlement.enter(CheckoutState::ValidatingInputs);
        let address = input.address.trim();
        let email = input.email.trim();
        if address.is_empty() {
            return Err(ValidationError::MissingAddress.into());
        }
        if email.is_empty() {
            return Err(ValidationError::MissingEmail.into());
        }
        let lines = self.settlement.cart.lines().await?;
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        self.settlement.enter(CheckoutState::InitializingPayment);
        let snapshot: Vec<OrderLine> = lines.iter().map(OrderLine::from).collect();
        let total: Money = lines.iter().map(CartLineItem::line_total).sum();
        let reference = PaymentReference::generate();
        let metadata = serde_json::to_value(CheckoutMetadata {
            user_id: session.user_id,
            order_items: snapshot.clone(),
            address: address.to_string(),
        })
        .map_err(|e| CheckoutError::Gateway(e.to_string()))?;

        let transaction = self
            .settlement
            .gateway
            .initialize(InitializeTransaction {
                email: email.to_string(),
                amount_minor: total.minor_units(),
                reference: reference.clone(),
                metadata,
            })
            .await
            .map_err(|e| {
                warn!(reference = %reference, error = %e, "payment initialization failed");
                CheckoutError::Gateway(e.to_string())
            })?;
        info!(
            reference = %transaction.reference,
            user_id = %session.user_id,
            amount = %total,
            "payment initialized"
        );

        let mut pending = PendingCheckout {
            reference: if transaction.reference.is_blank() {
                reference
            } else {
                transaction.reference.clone()
            },
            user_id: session.user_id,
            email: email.to_string(),
            address: address.to_string(),
            lines: snapshot,
            total,
        };

        self.settlement.enter(CheckoutState::AwaitingUserConfirmation);
        match self
            .confirmation
            .await_confirmation(&transaction)
            .await
            .map_err(|e| CheckoutError::Gateway(e.to_string()))?
        {
            ConfirmationOutcome::Cancelled => {
                info!(reference = %pending.reference, "payment cancelled by user");
                Ok(None)
            }
            ConfirmationOutcome::Completed(reference) => {
                if !reference.is_blank() && reference != pending.reference {
                    debug!(from = %pending.reference, to = %reference, "gateway reported a different reference");
                    pending.reference = reference;
                }
                Ok(Some(pending))
            }
        }
    }
}

/// Verification, order creation and cart clearing.
struct Settlement<R, G> {
    orders: Arc<R>,
    gateway: Arc<G>,
    cart: CartHandle,
    state: Arc<watch::Sender<CheckoutState>>,
}

impl<R, G> Clone for Settlement<R, G> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            gateway: self.gateway.clone(),
            cart: self.cart.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R, G> Settlement<R, G>
where
    R: OrderRepository,
    G: PaymentGateway,
{
    fn enter(&self, state: CheckoutState) {
        debug!(?state, "checkout state");
        self.state.send_replace(state);
    }

    async fn run(
        self,
        pending: PendingCheckout,
        delay: Duration,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let result = self.settle(pending, delay).await;
        match &result {
            Ok(CheckoutOutcome::Completed { .. }) => self.enter(CheckoutState::Complete),
            _ => self.enter(CheckoutState::Idle),
        }
        result
    }

    async fn settle(
        &self,
        pending: PendingCheckout,
        delay: Duration,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        self.enter(CheckoutState::VerifyingPayment);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let verified = match self.gateway.verify(&pending.reference).await {
            Ok(v) => v,
            Err(e) => {
                warn!(reference = %pending.reference, error = %e, "payment verification inconclusive");
                return Ok(CheckoutOutcome::PaymentUnconfirmed {
                    pending,
                    status: None,
                });
            }
        };
        match verified.status {
            TransactionStatus::Success => {}
            TransactionStatus::Failed => {
                info!(reference = %pending.reference, "payment failed");
                return Err(CheckoutError::Verification(
                    verified
                        .gateway_response
                        .unwrap_or_else(|| "declined".to_string()),
                ));
            }
            status => {
                warn!(reference = %pending.reference, ?status, "payment not settled yet");
                return Ok(CheckoutOutcome::PaymentUnconfirmed {
                    pending,
                    status: Some(status),
                });
            }
        }
        if let Some(amount) = verified.amount_minor {
            if amount != pending.total.minor_units() {
                warn!(
                    reference = %pending.reference,
                    charged = amount,
                    expected = pending.total.minor_units(),
                    "verified amount differs from cart total"
                );
            }
        }

        self.enter(CheckoutState::CreatingOrder);
        self.create_order(pending).await
    }

    async fn create_order(&self, pending: PendingCheckout) -> Result<CheckoutOutcome, CheckoutError> {
        let order = match Order::paid(
            pending.user_id,
            pending.lines.clone(),
            pending.address.clone(),
            pending.reference.clone(),
        ) {
            Ok(order) => order,
            Err(e) => return Err(self.persistence_failure(pending, e.to_string())),
        };

        let outcome = match self.orders.insert_if_absent(order).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.persistence_failure(pending, e.to_string())),
        };
        let created = outcome.was_inserted();
        let order = outcome.into_order();

        // The order is durable from here on; a cart failure must not hide it.
        let cleared = if created {
            self.cart.clear().await.map(|_| true)
        } else {
            self.cart.clear_if_unchanged(pending.lines).await
        };
        if let Err(e) = cleared {
            warn!(order_id = %order.id, error = %e, "order recorded but cart not cleared");
        }

        if created {
            info!(
                order_id = %order.id,
                reference = %order.payment_reference,
                user_id = %order.user_id,
                amount = %order.total,
                "order created"
            );
        } else {
            info!(order_id = %order.id, reference = %order.payment_reference, "order already recorded");
        }
        Ok(CheckoutOutcome::Completed { order, created })
    }

    fn persistence_failure(&self, pending: PendingCheckout, message: String) -> CheckoutError {
        error!(
            reference = %pending.reference,
            user_id = %pending.user_id,
            email = %pending.email,
            amount = %pending.total,
            error = %message,
            "payment settled but order not recorded; manual reconciliation required"
        );
        CheckoutError::Persistence {
            pending: Box::new(pending),
            message,
        }
    }
}

async fn detached<F, T>(work: F) -> Result<T, CheckoutError>
where
    F: Future<Output = Result<T, CheckoutError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(CheckoutError::Interrupted),
    }
}
