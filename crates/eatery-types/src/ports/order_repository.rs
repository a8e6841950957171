use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{FulfillmentStatus, Order};
use crate::domain::payment::PaymentReference;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Result of inserting an order keyed by its payment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Order),
    /// An order already existed for the reference; nothing was written.
    Existing(Order),
}

impl InsertOutcome {
    pub fn order(&self) -> &Order {
        match self {
            InsertOutcome::Inserted(o) | InsertOutcome::Existing(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            InsertOutcome::Inserted(o) | InsertOutcome::Existing(o) => o,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Atomic per payment reference: at most one order per reference is ever stored.
    async fn insert_if_absent(&self, order: Order) -> Result<InsertOutcome, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Order>, RepoError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Option<Order>, RepoError>;
}
