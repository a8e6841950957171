use serde::{Deserialize, Serialize};

use crate::domain::cart::{CartItem, Customization, DrinkChoice, Extra, ItemId};
use crate::domain::money::Money;

/// Side limit for items that offer more sides than this.
pub const MAX_SIDES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideOption {
    pub name: String,
    pub included: bool,
}

/// `price` is for display; drinks are never charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkOption {
    pub name: String,
    pub price: Money,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraOption {
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientOption {
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub sides: Vec<SideOption>,
    #[serde(default)]
    pub drinks: Vec<DrinkOption>,
    #[serde(default)]
    pub extras: Vec<ExtraOption>,
    #[serde(default)]
    pub optional_ingredients: Vec<IngredientOption>,
}

/// Option names picked by the customer on the item screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub sides: Vec<String>,
    #[serde(default)]
    pub drinks: Vec<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub optional_ingredients: Vec<String>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{item} has no {kind} named {name:?}")]
    UnknownOption {
        item: String,
        kind: &'static str,
        name: String,
    },
    #[error("{kind} {name:?} picked more than once for {item}")]
    DuplicateOption {
        item: String,
        kind: &'static str,
        name: String,
    },
    #[error("at most two sides can be chosen for {0}")]
    TooManySides(String),
}

impl MenuItem {
    /// Starting selection: optional ingredients flagged as default are preselected.
    pub fn default_selection(&self) -> Selection {
        Selection {
            optional_ingredients: self
                .optional_ingredients
                .iter()
                .filter(|i| i.default)
                .map(|i| i.name.clone())
                .collect(),
            ..Default::default()
        }
    }

    /// Builds a cart item, pricing extras from the menu rather than the caller.
    pub fn customize(&self, selection: &Selection) -> Result<CartItem, SelectionError> {
        if self.sides.len() > MAX_SIDES && selection.sides.len() > MAX_SIDES {
            return Err(SelectionError::TooManySides(self.name.clone()));
        }
        self.distinct("side", &selection.sides)?;
        self.distinct("drink", &selection.drinks)?;
        self.distinct("extra", &selection.extras)?;
        self.distinct("optional ingredient", &selection.optional_ingredients)?;
        for side in &selection.sides {
            if !self.sides.iter().any(|s| &s.name == side) {
                return Err(self.unknown("side", side));
            }
        }
        for ingredient in &selection.optional_ingredients {
            if !self.optional_ingredients.iter().any(|i| &i.name == ingredient) {
                return Err(self.unknown("optional ingredient", ingredient));
            }
        }
        let drinks = selection
            .drinks
            .iter()
            .map(|name| {
                self.drinks
                    .iter()
                    .find(|d| &d.name == name)
                    .map(|d| DrinkChoice {
                        name: d.name.clone(),
                        included: d.included,
                    })
                    .ok_or_else(|| self.unknown("drink", name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let extras = selection
            .extras
            .iter()
            .map(|name| {
                self.extras
                    .iter()
                    .find(|e| &e.name == name)
                    .map(|e| Extra {
                        name: e.name.clone(),
                        price: e.price,
                    })
                    .ok_or_else(|| self.unknown("extra", name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartItem {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            unit_price: self.price,
            customization: Some(Customization {
                sides: selection.sides.clone(),
                drinks,
                extras,
                optional_ingredients: selection.optional_ingredients.clone(),
            }),
        })
    }

    /// Price shown on the item screen before the item is added.
    pub fn preview_total(&self, selection: &Selection, quantity: u32) -> Result<Money, SelectionError> {
        let item = self.customize(selection)?;
        let surcharge = item
            .customization
            .as_ref()
            .map(Customization::surcharge)
            .unwrap_or(Money::ZERO);
        Ok((item.unit_price + surcharge).times(quantity.max(1)))
    }

    // Each option is a toggle on the item screen.
    fn distinct(&self, kind: &'static str, names: &[String]) -> Result<(), SelectionError> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(SelectionError::DuplicateOption {
                    item: self.name.clone(),
                    kind,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn unknown(&self, kind: &'static str, name: &str) -> SelectionError {
        SelectionError::UnknownOption {
            item: self.name.clone(),
            kind,
            name: name.to_string(),
        }
    }
}
