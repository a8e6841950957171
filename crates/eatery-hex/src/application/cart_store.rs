use eatery_types::domain::cart::{Cart, CartItem, CartLineItem, ItemId};
use eatery_types::domain::money::Money;
use eatery_types::domain::order::OrderLine;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("cart store has stopped")]
    Closed,
}

/// Badge-and-footer view of the cart after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: Money,
}

impl CartSummary {
    fn of(cart: &Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

enum CartCommand {
    Add {
        item: CartItem,
        quantity: u32,
        respond_to: oneshot::Sender<CartSummary>,
    },
    Remove {
        id: ItemId,
        respond_to: oneshot::Sender<CartSummary>,
    },
    UpdateQuantity {
        id: ItemId,
        quantity: i64,
        respond_to: oneshot::Sender<CartSummary>,
    },
    Clear {
        respond_to: oneshot::Sender<CartSummary>,
    },
    ClearIfUnchanged {
        expected: Vec<OrderLine>,
        respond_to: oneshot::Sender<bool>,
    },
    Lines {
        respond_to: oneshot::Sender<Vec<CartLineItem>>,
    },
    Summary {
        respond_to: oneshot::Sender<CartSummary>,
    },
}

/// Sole owner of the session cart. Commands are applied one at a time in
/// arrival order, so concurrent callers never overwrite each other.
pub struct CartStore {
    receiver: mpsc::Receiver<CartCommand>,
    cart: Cart,
}

impl CartStore {
    /// Starts the store on the current runtime and returns a handle to it.
    /// The store stops once every handle is dropped.
    pub fn spawn(buffer: usize) -> CartHandle {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let store = CartStore {
            receiver,
            cart: Cart::new(),
        };
        tokio::spawn(store.run());
        CartHandle { sender }
    }

    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            self.handle(command);
        }
        tracing::debug!("cart store stopped");
    }

    fn handle(&mut self, command: CartCommand) {
        // A dropped reply channel only means the caller stopped waiting.
        match command {
            CartCommand::Add {
                item,
                quantity,
                respond_to,
            } => {
                self.cart.add_item(item, quantity);
                let _ = respond_to.send(CartSummary::of(&self.cart));
            }
            CartCommand::Remove { id, respond_to } => {
                self.cart.remove_item(&id);
                let _ = respond_to.send(CartSummary::of(&self.cart));
            }
            CartCommand::UpdateQuantity {
                id,
                quantity,
                respond_to,
            } => {
                self.cart.update_quantity(&id, quantity);
                let _ = respond_to.send(CartSummary::of(&self.cart));
            }
            CartCommand::Clear { respond_to } => {
                self.cart.clear();
                let _ = respond_to.send(CartSummary::of(&self.cart));
            }
            CartCommand::ClearIfUnchanged {
                expected,
                respond_to,
            } => {
                let unchanged = !self.cart.is_empty() && self.cart.snapshot() == expected;
                if unchanged {
                    self.cart.clear();
                }
                let _ = respond_to.send(unchanged);
            }
            CartCommand::Lines { respond_to } => {
                let _ = respond_to.send(self.cart.lines().to_vec());
            }
            CartCommand::Summary { respond_to } => {
                let _ = respond_to.send(CartSummary::of(&self.cart));
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct CartHandle {
    sender: mpsc::Sender<CartCommand>,
}

impl CartHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CartCommand,
    ) -> Result<T, CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .await
            .map_err(|_| CartError::Closed)?;
        response.await.map_err(|_| CartError::Closed)
    }

    pub async fn add_item(&self, item: CartItem, quantity: u32) -> Result<CartSummary, CartError> {
        self.request(|respond_to| CartCommand::Add {
            item,
            quantity,
            respond_to,
        })
        .await
    }

    pub async fn remove_item(&self, id: &ItemId) -> Result<CartSummary, CartError> {
        let id = id.clone();
        self.request(|respond_to| CartCommand::Remove { id, respond_to })
            .await
    }

    /// Zero or negative removes every line of the item.
    pub async fn update_quantity(
        &self,
        id: &ItemId,
        quantity: i64,
    ) -> Result<CartSummary, CartError> {
        let id = id.clone();
        self.request(|respond_to| CartCommand::UpdateQuantity {
            id,
            quantity,
            respond_to,
        })
        .await
    }

    pub async fn clear(&self) -> Result<CartSummary, CartError> {
        self.request(|respond_to| CartCommand::Clear { respond_to })
            .await
    }

    /// Empties the cart only if it still holds exactly `expected`.
    pub async fn clear_if_unchanged(&self, expected: Vec<OrderLine>) -> Result<bool, CartError> {
        self.request(|respond_to| CartCommand::ClearIfUnchanged {
            expected,
            respond_to,
        })
        .await
    }

    pub async fn lines(&self) -> Result<Vec<CartLineItem>, CartError> {
        self.request(|respond_to| CartCommand::Lines { respond_to })
            .await
    }

    pub async fn summary(&self) -> Result<CartSummary, CartError> {
        self.request(|respond_to| CartCommand::Summary { respond_to })
            .await
    }

    pub async fn total(&self) -> Result<Money, CartError> {
        Ok(self.summary().await?.total)
    }

    pub async fn item_count(&self) -> Result<u64, CartError> {
        Ok(self.summary().await?.item_count)
    }
}
