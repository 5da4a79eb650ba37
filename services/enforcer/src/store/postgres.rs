//! Postgres-backed implementation of the enforcement store.
//!
//! # Purpose
//! Implements [`EnforcementStore`] over `sqlx` so vendor and device records
//! survive restarts and can be shared by several enforcer replicas.
//!
//! # Key invariants
//! - Vendor `mobile` and device `customer_id` are unique indexes; unique
//!   violations surface as [`StoreError::Conflict`] with the same reasons the
//!   in-memory backend reports.
//! - Enforcement patches are a single `UPDATE ... RETURNING`, so `is_locked`,
//!   `status`, and `lock_message` change in one statement. Table constraints
//!   reject any row where the flag and status disagree.
//! - Listings are ordered by the insert sequence.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`.
//! - Pool timeouts are explicit so a dead database fails requests instead of
//!   hanging them. Avoid logging `pg.url`; it may contain credentials.
use super::{
    CONFLICT_CUSTOMER_ID, CONFLICT_VENDOR_MOBILE, EnforcementStore, StoreError, StoreResult,
};
use crate::config::PostgresConfig;
use crate::model::{
    Device, DeviceFilter, DeviceStatus, EnforcementPatch, KycAssets, NewDevice, NewVendor, Vendor,
    VendorFilter, VendorPatch, VendorStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use emilock_common::ids::{DeviceId, VendorId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const VENDOR_COLUMNS: &str = "id, shop_name, owner_name, mobile, email, status, kyc_id_front, \
     kyc_id_back, join_date, created_at";

const DEVICE_COLUMNS: &str = "id, imei1, imei2, customer_id, customer_name, mobile, email, model, \
     vendor_id, vendor_mobile, emi_amount, emi_months, due_date, is_locked, status, lock_message, \
     created_at, updated_at, locked_at";

#[derive(Debug, Clone, FromRow)]
struct DbVendor {
    id: Uuid,
    shop_name: String,
    owner_name: String,
    mobile: String,
    email: String,
    status: String,
    kyc_id_front: Option<String>,
    kyc_id_back: Option<String>,
    join_date: NaiveDate,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbDevice {
    id: Uuid,
    imei1: String,
    imei2: String,
    customer_id: String,
    customer_name: String,
    mobile: String,
    email: String,
    model: String,
    vendor_id: Uuid,
    vendor_mobile: String,
    emi_amount: f64,
    emi_months: i32,
    due_date: NaiveDate,
    is_locked: bool,
    status: String,
    lock_message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    locked_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbVendor> for Vendor {
    type Error = StoreError;

    fn try_from(row: DbVendor) -> Result<Self, Self::Error> {
        let status = VendorStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Unexpected(anyhow::anyhow!("invalid vendor status: {}", row.status))
        })?;
        Ok(Vendor {
            id: VendorId::from_uuid(row.id),
            shop_name: row.shop_name,
            owner_name: row.owner_name,
            mobile: row.mobile,
            email: row.email,
            status,
            kyc_assets: KycAssets {
                id_front: row.kyc_id_front,
                id_back: row.kyc_id_back,
            },
            join_date: row.join_date,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbDevice> for Device {
    type Error = StoreError;

    fn try_from(row: DbDevice) -> Result<Self, Self::Error> {
        let status = DeviceStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Unexpected(anyhow::anyhow!("invalid device status: {}", row.status))
        })?;
        let emi_months = u32::try_from(row.emi_months).map_err(|_| {
            StoreError::Unexpected(anyhow::anyhow!("invalid emi_months: {}", row.emi_months))
        })?;
        Ok(Device {
            id: DeviceId::from_uuid(row.id),
            imei1: row.imei1,
            imei2: row.imei2,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            mobile: row.mobile,
            email: row.email,
            model: row.model,
            vendor_id: VendorId::from_uuid(row.vendor_id),
            vendor_mobile: row.vendor_mobile,
            emi_amount: row.emi_amount,
            emi_months,
            due_date: row.due_date,
            is_locked: row.is_locked,
            status,
            lock_message: row.lock_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
            locked_at: row.locked_at,
        })
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open a pool and apply pending migrations before returning.
    ///
    /// # Example
    /// ```rust,no_run
    /// use enforcer::config::PostgresConfig;
    /// use enforcer::store::postgres::PostgresStore;
    ///
    /// async fn open(pg: PostgresConfig) {
    ///     let _ = PostgresStore::connect(&pg).await;
    /// }
    /// ```
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("postgres connect timed out")))??;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl EnforcementStore for PostgresStore {
    async fn insert_vendor(&self, vendor: NewVendor) -> StoreResult<Vendor> {
        let sql = format!(
            "INSERT INTO vendors (id, shop_name, owner_name, mobile, email, status, kyc_id_front, \
             kyc_id_back, join_date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {VENDOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbVendor>(&sql)
            .bind(VendorId::new().as_uuid())
            .bind(&vendor.shop_name)
            .bind(&vendor.owner_name)
            .bind(&vendor.mobile)
            .bind(&vendor.email)
            .bind(VendorStatus::Pending.as_str())
            .bind(&vendor.kyc_assets.id_front)
            .bind(&vendor.kyc_assets.id_back)
            .bind(vendor.join_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| conflict_or_unexpected(err, CONFLICT_VENDOR_MOBILE))?;
        row.try_into()
    }

    async fn get_vendor(&self, id: &VendorId) -> StoreResult<Option<Vendor>> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1");
        sqlx::query_as::<_, DbVendor>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Vendor::try_from)
            .transpose()
    }

    async fn query_vendors(&self, filter: &VendorFilter) -> StoreResult<Vec<Vendor>> {
        let sql = format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors \
             WHERE ($1::TEXT IS NULL OR mobile = $1) AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY seq"
        );
        let rows = sqlx::query_as::<_, DbVendor>(&sql)
            .bind(filter.mobile.as_deref())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Vendor::try_from).collect()
    }

    async fn update_vendor(&self, id: &VendorId, patch: VendorPatch) -> StoreResult<Vendor> {
        let sql = format!(
            "UPDATE vendors SET status = COALESCE($2, status) WHERE id = $1 \
             RETURNING {VENDOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbVendor>(&sql)
            .bind(id.as_uuid())
            .bind(patch.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("vendor".into()))?;
        row.try_into()
    }

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device> {
        let sql = format!(
            "INSERT INTO devices (id, imei1, imei2, customer_id, customer_name, mobile, email, \
             model, vendor_id, vendor_mobile, emi_amount, emi_months, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {DEVICE_COLUMNS}"
        );
        let emi_months = i32::try_from(device.emi_months).map_err(|_| {
            StoreError::Unexpected(anyhow::anyhow!("emi_months out of range"))
        })?;
        let row = sqlx::query_as::<_, DbDevice>(&sql)
            .bind(DeviceId::new().as_uuid())
            .bind(&device.imei1)
            .bind(&device.imei2)
            .bind(&device.customer_id)
            .bind(&device.customer_name)
            .bind(&device.mobile)
            .bind(&device.email)
            .bind(&device.model)
            .bind(device.vendor_id.as_uuid())
            .bind(&device.vendor_mobile)
            .bind(device.emi_amount)
            .bind(emi_months)
            .bind(device.due_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| conflict_or_unexpected(err, CONFLICT_CUSTOMER_ID))?;
        row.try_into()
    }

    async fn get_device(&self, id: &DeviceId) -> StoreResult<Option<Device>> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1");
        sqlx::query_as::<_, DbDevice>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Device::try_from)
            .transpose()
    }

    async fn query_devices(&self, filter: &DeviceFilter) -> StoreResult<Vec<Device>> {
        let sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices \
             WHERE ($1::UUID IS NULL OR vendor_id = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
               AND ($3::TEXT IS NULL OR customer_id = $3) \
             ORDER BY seq"
        );
        let rows = sqlx::query_as::<_, DbDevice>(&sql)
            .bind(filter.vendor_id.map(|v| v.as_uuid()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.customer_id.as_deref())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Device::try_from).collect()
    }

    async fn update_device_enforcement(
        &self,
        id: &DeviceId,
        patch: &EnforcementPatch,
    ) -> StoreResult<Device> {
        let state = patch.state();
        let locked_at = state.is_locked().then(|| patch.at());
        let sql = format!(
            "UPDATE devices SET is_locked = $2, status = $3, lock_message = $4, \
             locked_at = $5, updated_at = $6 WHERE id = $1 RETURNING {DEVICE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbDevice>(&sql)
            .bind(id.as_uuid())
            .bind(state.is_locked())
            .bind(state.status().as_str())
            .bind(state.lock_message())
            .bind(locked_at)
            .bind(patch.at())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("device".into()))?;
        row.try_into()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn conflict_or_unexpected(err: sqlx::Error, reason: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(reason.into())
    } else {
        StoreError::Unexpected(err.into())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}
