use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::{surcharge_of, CartLineItem, Customization, ItemId};
use crate::domain::money::Money;
use crate::domain::payment::{PaymentReference, PaymentStatus};

/// Kitchen/delivery lifecycle, changed only from the admin side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub const ALL: [FulfillmentStatus; 5] = [
        FulfillmentStatus::Pending,
        FulfillmentStatus::Preparing,
        FulfillmentStatus::Ready,
        FulfillmentStatus::Delivered,
        FulfillmentStatus::Cancelled,
    ];

    /// Next kitchen step; `None` once delivered or cancelled.
    pub fn next(self) -> Option<Self> {
        match self {
            FulfillmentStatus::Pending => Some(FulfillmentStatus::Preparing),
            FulfillmentStatus::Preparing => Some(FulfillmentStatus::Ready),
            FulfillmentStatus::Ready => Some(FulfillmentStatus::Delivered),
            FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Preparing => "preparing",
            FulfillmentStatus::Ready => "ready",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// Snapshot of one cart line at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        (self.price + surcharge_of(self.customization.as_ref())).times(self.quantity)
    }
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.item.id.clone(),
            name: line.item.name.clone(),
            price: line.item.unit_price,
            quantity: line.quantity,
            customization: line.item.customization.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total: Money,
    pub address: String,
    pub payment_reference: PaymentReference,
    pub payment_status: PaymentStatus,
    pub status: FulfillmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Order for a verified payment: paid, waiting for the kitchen.
    pub fn paid(
        user_id: Uuid,
        items: Vec<OrderLine>,
        address: String,
        payment_reference: PaymentReference,
    ) -> anyhow::Result<Self> {
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        if address.trim().is_empty() {
            anyhow::bail!("address empty");
        }
        if payment_reference.is_blank() {
            anyhow::bail!("payment reference empty");
        }
        for it in &items {
            if it.quantity == 0 {
                anyhow::bail!("item qty must be > 0");
            }
        }
        let total = items.iter().map(OrderLine::line_total).sum();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            total,
            address,
            payment_reference,
            payment_status: PaymentStatus::Paid,
            status: FulfillmentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_status(&mut self, status: FulfillmentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
