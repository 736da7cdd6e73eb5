//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of domain traits
//! that can be configured to simulate various scenarios including
//! success, failure, and edge cases.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AppError, DatabaseError, Listing, ListingRepository, ListingStatus, ListingTransaction,
    RetryPolicy, UnitOfWork,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Default)]
struct Shared {
    storage: Mutex<HashMap<Uuid, Listing>>,
    failing_commits: AtomicU32,
    lost_commits: AtomicU32,
    begins: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

/// In-memory listing store for testing.
///
/// Implements both [`ListingRepository`] and [`UnitOfWork`]. Writes made
/// through a transaction are buffered and only become visible on commit,
/// so rollback semantics match a real database.
///
/// # Example
///
/// ```
/// use real_estate_listings::test_utils::{MockListingStore, mocks::MockConfig};
///
/// // Create a store that succeeds
/// let store = MockListingStore::new();
///
/// // Make the next two commits fail with a transient error
/// store.fail_next_commits(2);
///
/// // Apply the next commit but report a dropped connection
/// store.lose_connection_on_next_commits(1);
///
/// // Create a store whose every operation fails
/// let failing = MockListingStore::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockListingStore {
    shared: Arc<Shared>,
    config: MockConfig,
    retry_policy: RetryPolicy,
    call_count: AtomicU64,
    is_healthy: AtomicBool,
}

impl MockListingStore {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    ///
    /// The default retry policy uses millisecond delays to keep tests fast.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            config,
            retry_policy: RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(10)),
            call_count: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Gets the number of times any repository method was called.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Makes the next `count` commits fail with a transient error.
    pub fn fail_next_commits(&self, count: u32) {
        self.shared.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` commits apply their writes and then report a
    /// dropped connection, as when the server commits but the reply is lost.
    pub fn lose_connection_on_next_commits(&self, count: u32) {
        self.shared.lost_commits.store(count, Ordering::SeqCst);
    }

    /// Transactions opened so far.
    pub fn begin_count(&self) -> u64 {
        self.shared.begins.load(Ordering::SeqCst)
    }

    /// Transactions committed successfully so far.
    pub fn commit_count(&self) -> u64 {
        self.shared.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> u64 {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    /// Gets all stored listings, newest first.
    pub fn get_all_listings(&self) -> Vec<Listing> {
        let mut listings: Vec<Listing> =
            self.shared.storage.lock().unwrap().values().cloned().collect();
        sort_newest_first(&mut listings);
        listings
    }

    pub fn get_listing(&self, id: Uuid) -> Option<Listing> {
        self.shared.storage.lock().unwrap().get(&id).cloned()
    }

    pub fn status_of(&self, id: Uuid) -> Option<ListingStatus> {
        self.get_listing(id).map(|listing| listing.status())
    }

    /// Stores a listing directly, bypassing transactions.
    pub fn insert_listing(&self, listing: Listing) {
        self.shared
            .storage
            .lock()
            .unwrap()
            .insert(listing.id(), listing);
    }

    async fn simulate(&self) -> Result<(), AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock database error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

impl Default for MockListingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

#[async_trait]
impl ListingRepository for MockListingStore {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }

        self.simulate().await
    }

    async fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, AppError> {
        self.simulate().await?;

        let mut listings = self.get_all_listings();
        if let Some(status) = status {
            listings.retain(|listing| listing.status() == status);
        }
        Ok(listings)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, AppError> {
        self.simulate().await?;
        Ok(self.get_listing(id))
    }
}

#[async_trait]
impl UnitOfWork for MockListingStore {
    async fn begin(&self) -> Result<Box<dyn ListingTransaction>, AppError> {
        self.simulate().await?;
        self.shared.begins.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockTransaction {
            shared: Arc::clone(&self.shared),
            changes: HashMap::new(),
        }))
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Buffered writes of one mock transaction; `None` marks a deletion.
struct MockTransaction {
    shared: Arc<Shared>,
    changes: HashMap<Uuid, Option<Listing>>,
}

impl MockTransaction {
    fn current(&self, id: Uuid) -> Option<Listing> {
        match self.changes.get(&id) {
            Some(change) => change.clone(),
            None => self.shared.storage.lock().unwrap().get(&id).cloned(),
        }
    }
}

#[async_trait]
impl ListingTransaction for MockTransaction {
    async fn get(&mut self, id: Uuid) -> Result<Option<Listing>, AppError> {
        Ok(self.current(id))
    }

    async fn insert(&mut self, listing: &Listing) -> Result<(), AppError> {
        if self.current(listing.id()).is_some() {
            return Err(AppError::Database(DatabaseError::Duplicate(format!(
                "listing {}",
                listing.id()
            ))));
        }
        self.changes.insert(listing.id(), Some(listing.clone()));
        Ok(())
    }

    async fn update(&mut self, listing: &Listing) -> Result<(), AppError> {
        if self.current(listing.id()).is_none() {
            return Err(AppError::Database(DatabaseError::NotFound(format!(
                "listing {}",
                listing.id()
            ))));
        }
        self.changes.insert(listing.id(), Some(listing.clone()));
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<bool, AppError> {
        if self.current(id).is_none() {
            return Ok(false);
        }
        self.changes.insert(id, None);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MockTransaction { shared, changes } = *self;

        let take = |counter: &AtomicU32| {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        };
        if take(&shared.failing_commits) {
            return Err(AppError::Database(DatabaseError::Transient(
                "Mock serialization failure".to_string(),
            )));
        }

        {
            let mut storage = shared.storage.lock().unwrap();
            for (id, change) in changes {
                match change {
                    Some(listing) => storage.insert(id, listing),
                    None => storage.remove(&id),
                };
            }
        }
        shared.commits.fetch_add(1, Ordering::SeqCst);

        if take(&shared.lost_commits) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock connection reset during commit".to_string(),
            )));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
