//! Domain traits defining the persistence boundary.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::AppError;
use super::listing::{Listing, ListingStatus};
use super::transaction::RetryPolicy;

/// Read-side access to listings, outside of any unit of work.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// List listings, newest first, optionally filtered by status
    async fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, AppError>;

    /// Get a single listing by ID
    async fn get(&self, id: Uuid) -> Result<Option<Listing>, AppError>;
}

/// Repository operations scoped to one open database transaction.
///
/// Nothing written through a transaction is visible to other callers until
/// [`ListingTransaction::commit`] succeeds. Dropping a transaction without
/// committing rolls it back.
#[async_trait]
pub trait ListingTransaction: Send {
    async fn get(&mut self, id: Uuid) -> Result<Option<Listing>, AppError>;

    async fn insert(&mut self, listing: &Listing) -> Result<(), AppError>;

    /// Persist the current state of an existing listing
    async fn update(&mut self, listing: &Listing) -> Result<(), AppError>;

    /// Delete a listing, returning whether a row was removed
    async fn delete(&mut self, id: Uuid) -> Result<bool, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Factory for transactions plus the strategy used to retry them.
///
/// Callers normally go through `<dyn UnitOfWork>::commit`, which runs an
/// action inside a transaction and retries transient failures.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> Result<Box<dyn ListingTransaction>, AppError>;

    /// Execution strategy applied by `commit`
    fn retry_policy(&self) -> &RetryPolicy;
}
