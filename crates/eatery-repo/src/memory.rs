use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use eatery_types::domain::order::{FulfillmentStatus, Order};
use eatery_types::domain::payment::PaymentReference;
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::{InsertOutcome, OrderRepository, RepoError};
use eatery_types::ports::profile_repository::ProfileRepository;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<Uuid, Order>>,
    references: Arc<DashMap<PaymentReference, Uuid>>,
    pub profiles: Arc<DashMap<Uuid, Profile>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            references: Arc::new(DashMap::new()),
            profiles: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn insert_if_absent(&self, order: Order) -> Result<InsertOutcome, RepoError> {
        // The reference entry stays locked until the order is in place.
        match self.references.entry(order.payment_reference.clone()) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                self.orders
                    .get(&id)
                    .map(|o| InsertOutcome::Existing(o.clone()))
                    .ok_or_else(|| {
                        RepoError::DbError(format!("reference index points at missing order {id}"))
                    })
            }
            Entry::Vacant(slot) => {
                self.orders.insert(order.id, order.clone());
                slot.insert(order.id);
                Ok(InsertOutcome::Inserted(order))
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepoError> {
        let id = match self.references.get(reference) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        Ok(newest_first(
            self.orders.iter().map(|kv| kv.value().clone()).collect(),
        ))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        Ok(newest_first(
            self.orders
                .iter()
                .filter(|kv| kv.value().user_id == user_id)
                .map(|kv| kv.value().clone())
                .collect(),
        ))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            v.update_status(status);
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepo {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self.profiles.get(&id).map(|r| r.clone()))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepoError> {
        let mut profiles: Vec<Profile> = self.profiles.iter().map(|kv| kv.value().clone()).collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError> {
        self.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Profile>, RepoError> {
        if let Some(mut v) = self.profiles.get_mut(&id) {
            v.is_active = active;
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }
}
