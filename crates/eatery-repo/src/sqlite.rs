use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use eatery_types::domain::money::Money;
use eatery_types::domain::order::{FulfillmentStatus, Order, OrderLine};
use eatery_types::domain::payment::{PaymentReference, PaymentStatus};
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::{InsertOutcome, OrderRepository, RepoError};
use eatery_types::ports::profile_repository::ProfileRepository;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, items_json, total_cents, address, payment_reference, \
                             payment_status, status, created_at, updated_at";
const PROFILE_COLUMNS: &str =
    "id, email, full_name, phone, address, is_active, is_admin, created_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

// Fixed precision keeps `ORDER BY created_at` chronological.
fn fmt_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    total_cents: i64,
    address: String,
    payment_reference: String,
    payment_status: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = FulfillmentStatus::parse(&self.status)
            .ok_or_else(|| RepoError::DbError(format!("unknown status {:?}", self.status)))?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            RepoError::DbError(format!("unknown payment status {:?}", self.payment_status))
        })?;
        let items: Vec<OrderLine> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        Ok(Order {
            id: Uuid::parse_str(&self.id).map_err(db_err)?,
            user_id: Uuid::parse_str(&self.user_id).map_err(db_err)?,
            items,
            total: Money::from_cents(self.total_cents),
            address: self.address,
            payment_reference: PaymentReference::new(self.payment_reference),
            payment_status,
            status,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbProfile {
    id: String,
    email: String,
    full_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    is_active: bool,
    is_admin: bool,
    created_at: String,
}

impl DbProfile {
    fn into_profile(self) -> Result<Profile, RepoError> {
        Ok(Profile {
            id: Uuid::parse_str(&self.id).map_err(db_err)?,
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            address: self.address,
            is_active: self.is_active,
            is_admin: self.is_admin,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in [
            include_str!("../migrations/0001_create_orders.sql"),
            include_str!("../migrations/0002_create_profiles.sql"),
        ] {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn fetch_order(&self, clause: &str, bind: String) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {clause}"))
                .bind(bind)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn insert_if_absent(&self, order: Order) -> Result<InsertOutcome, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let res = sqlx::query(
            "INSERT INTO orders (id, user_id, items_json, total_cents, address, payment_reference,
                                 payment_status, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(payment_reference) DO NOTHING",
        )
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(items_json)
        .bind(order.total.cents())
        .bind(&order.address)
        .bind(order.payment_reference.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.status.as_str())
        .bind(fmt_time(&order.created_at))
        .bind(fmt_time(&order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 1 {
            return Ok(InsertOutcome::Inserted(order));
        }
        self.get_by_reference(&order.payment_reference)
            .await?
            .map(InsertOutcome::Existing)
            .ok_or_else(|| {
                RepoError::DbError(format!(
                    "insert for {} ignored but no row found",
                    order.payment_reference
                ))
            })
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.fetch_order("id = ?", id.to_string()).await
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepoError> {
        self.fetch_order("payment_reference = ?", reference.as_str().to_string())
            .await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Option<Order>, RepoError> {
        let updated = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(fmt_time(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepo {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        let row: Option<DbProfile> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbProfile::into_profile).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepoError> {
        let rows: Vec<DbProfile> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbProfile::into_profile).collect()
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError> {
        sqlx::query(
            "INSERT INTO profiles (id, email, full_name, phone, address, is_active, is_admin, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                phone = excluded.phone,
                address = excluded.address,
                is_active = excluded.is_active,
                is_admin = excluded.is_admin",
        )
        .bind(profile.id.to_string())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(profile.is_active)
        .bind(profile.is_admin)
        .bind(fmt_time(&profile.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(profile)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Profile>, RepoError> {
        let updated = sqlx::query("UPDATE profiles SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_profile(id).await
    }
}
