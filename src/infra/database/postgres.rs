//! PostgreSQL database client implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
    Address, AppError, Currency, DatabaseError, Listing, ListingRepository, ListingStatus,
    ListingTransaction, Money, RetryPolicy, UnitOfWork,
};

const LISTING_COLUMNS: &str = "id, title, price, currency, description, street, city, state, \
                               zip_code, status, created_at, updated_at";

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL listing store with connection pooling.
///
/// Serves both the read-side [`ListingRepository`] and the transactional
/// [`UnitOfWork`].
pub struct PostgresClient {
    pool: PgPool,
    retry_policy: RetryPolicy,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Wrap an existing pool, using the default retry policy.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ListingRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_listing).collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Listing>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_listing).transpose()
    }
}

#[async_trait]
impl UnitOfWork for PostgresClient {
    async fn begin(&self) -> Result<Box<dyn ListingTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgListingTransaction { tx }))
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// An open PostgreSQL transaction. Dropped without commit, it rolls back.
pub struct PgListingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ListingTransaction for PgListingTransaction {
    #[instrument(skip(self))]
    async fn get(&mut self, id: Uuid) -> Result<Option<Listing>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_listing).transpose()
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id()))]
    async fn insert(&mut self, listing: &Listing) -> Result<(), AppError> {
        let address = listing.address();
        sqlx::query(
            r#"
            INSERT INTO listings (id, title, price, currency, description,
                                  street, city, state, zip_code,
                                  status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(listing.id())
        .bind(listing.title())
        .bind(listing.price().amount())
        .bind(listing.price().currency().as_str())
        .bind(listing.description())
        .bind(address.map(Address::street))
        .bind(address.map(Address::city))
        .bind(address.and_then(Address::state))
        .bind(address.and_then(Address::zip_code))
        .bind(listing.status().as_str())
        .bind(listing.created_at())
        .bind(listing.updated_at())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id()))]
    async fn update(&mut self, listing: &Listing) -> Result<(), AppError> {
        let address = listing.address();
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET title = $2,
                price = $3,
                currency = $4,
                description = $5,
                street = $6,
                city = $7,
                state = $8,
                zip_code = $9,
                status = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(listing.id())
        .bind(listing.title())
        .bind(listing.price().amount())
        .bind(listing.price().currency().as_str())
        .bind(listing.description())
        .bind(address.map(Address::street))
        .bind(address.map(Address::city))
        .bind(address.and_then(Address::state))
        .bind(address.and_then(Address::zip_code))
        .bind(listing.status().as_str())
        .bind(listing.updated_at())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("listing {}", listing.id())).into());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Parse a database row into a Listing
fn row_to_listing(row: &PgRow) -> Result<Listing, AppError> {
    let id: Uuid = row.try_get("id")?;
    let corrupt = |what: &str, detail: String| {
        AppError::Database(DatabaseError::Query(format!(
            "listing {id} has invalid {what}: {detail}"
        )))
    };

    let amount: Decimal = row.try_get("price")?;
    let currency: String = row.try_get("currency")?;
    let currency: Currency = currency.parse().map_err(|e| corrupt("currency", e))?;

    let status: String = row.try_get("status")?;
    let status: ListingStatus = status.parse().map_err(|e| corrupt("status", e))?;

    let street: Option<String> = row.try_get("street")?;
    let city: Option<String> = row.try_get("city")?;
    let state: Option<String> = row.try_get("state")?;
    let zip_code: Option<String> = row.try_get("zip_code")?;
    let address = match (street, city) {
        (Some(street), Some(city)) => Some(
            Address::new(&street, &city, state.as_deref(), zip_code.as_deref())
                .map_err(|e| corrupt("address", e.to_string()))?,
        ),
        _ => None,
    };

    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at")?;

    Ok(Listing::restore(
        id,
        row.try_get("title")?,
        Money::new(amount, currency),
        row.try_get("description")?,
        address,
        status,
        created_at,
        updated_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_defaults() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_listing_columns_match_schema() {
        let columns: Vec<&str> = LISTING_COLUMNS.split(',').map(str::trim).collect();
        assert_eq!(columns.len(), 12);
        assert_eq!(columns.first(), Some(&"id"));
        assert!(columns.contains(&"zip_code"));
    }
}
