use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::order::OrderLine;

/// Opaque menu item identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Drink picked for a line. Drinks never change the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkChoice {
    pub name: String,
    #[serde(default)]
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    pub price: Money,
}

/// Options chosen for one line item. Only extras carry a price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    #[serde(default)]
    pub sides: Vec<String>,
    #[serde(default)]
    pub drinks: Vec<DrinkChoice>,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default)]
    pub optional_ingredients: Vec<String>,
}

impl Customization {
    pub fn surcharge(&self) -> Money {
        self.extras.iter().map(|e| e.price).sum()
    }
}

/// Per-unit surcharge of an optional customization.
pub(crate) fn surcharge_of(customization: Option<&Customization>) -> Money {
    customization.map(Customization::surcharge).unwrap_or(Money::ZERO)
}

/// An item ready to be put in the cart, without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl CartItem {
    /// Lines merge only when identity and customization are deep-equal.
    pub fn same_line_as(&self, other: &CartItem) -> bool {
        self.id == other.id && self.customization == other.customization
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(flatten)]
    pub item: CartItem,
    pub quantity: u32,
}

impl CartLineItem {
    pub fn line_total(&self) -> Money {
        (self.item.unit_price + surcharge_of(self.item.customization.as_ref())).times(self.quantity)
    }
}

/// Session-scoped collection of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges into an identical line or appends a new one. A zero quantity counts as one.
    pub fn add_item(&mut self, item: CartItem, quantity: u32) {
        let quantity = quantity.max(1);
        match self.lines.iter_mut().find(|l| l.item.same_line_as(&item)) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLineItem { item, quantity }),
        }
    }

    pub fn remove_item(&mut self, id: &ItemId) {
        self.lines.retain(|l| &l.item.id != id);
    }

    /// Sets the quantity of every line with `id`; zero or less removes them.
    pub fn update_quantity(&mut self, id: &ItemId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        for line in self.lines.iter_mut().filter(|l| &l.item.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Immutable copy of the current lines in order-record form.
    pub fn snapshot(&self) -> Vec<OrderLine> {
        self.lines.iter().map(OrderLine::from).collect()
    }
}
