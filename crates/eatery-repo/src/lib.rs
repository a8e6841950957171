#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use eatery_types::domain::order::{FulfillmentStatus, Order};
use eatery_types::domain::payment::PaymentReference;
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::{InsertOutcome, OrderRepository, RepoError};
use eatery_types::ports::profile_repository::ProfileRepository;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Backend chosen at startup; one type serves both the order and profile ports.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Repo::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://eatery.db");
        Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both backends compiled in, a URL selects sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Repo::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait]
impl OrderRepository for Repo {
    async fn insert_if_absent(&self, order: Order) -> Result<InsertOutcome, RepoError> {
        delegate!(self, r => r.insert_if_absent(order).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => OrderRepository::get(r, id).await)
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.get_by_reference(reference).await)
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => OrderRepository::list(r).await)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        delegate!(self, r => r.list_for_user(user_id).await)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, r => r.update_status(id, status).await)
    }
}

#[async_trait]
impl ProfileRepository for Repo {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        delegate!(self, r => r.get_profile(id).await)
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepoError> {
        delegate!(self, r => r.list_profiles().await)
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError> {
        delegate!(self, r => r.upsert_profile(profile).await)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Profile>, RepoError> {
        delegate!(self, r => r.set_active(id, active).await)
    }
}
