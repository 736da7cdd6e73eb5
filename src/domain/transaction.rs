//! Transactional commit with a retrying execution strategy.

use std::time::Duration;

use futures::future::BoxFuture;
use rand::Rng;
use tracing::{debug, warn};

use super::error::{AppError, DatabaseError};
use super::traits::{ListingTransaction, UnitOfWork};

/// How often, and how patiently, a failed unit of work is re-executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that runs each unit of work exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff before retry number `attempt` (1-based): exponential in the
    /// attempt, with up to 10% jitter, never above `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter: f64 = rand::thread_rng().gen_range(1.0..1.1);
        delay.mul_f64(jitter).min(self.max_delay)
    }
}

impl dyn UnitOfWork + '_ {
    /// Runs `action` inside a transaction and commits it.
    ///
    /// On any failure the transaction is rolled back and the error
    /// propagated. Transient failures re-run the whole attempt (a fresh
    /// transaction and a fresh call to `action`) according to
    /// [`UnitOfWork::retry_policy`], so `action` must not carry state
    /// between calls.
    ///
    /// A failure of the COMMIT itself is only retried when the database
    /// reported that it aborted the transaction (serialization failure or
    /// deadlock). A lost connection at that point leaves the outcome
    /// unknown, so the error is returned as is.
    ///
    /// # Example
    ///
    /// ```ignore
    /// uow.commit(|tx| {
    ///     let listing = listing.clone();
    ///     Box::pin(async move { tx.insert(&listing).await })
    /// })
    /// .await?;
    /// ```
    pub async fn commit<T, F>(&self, mut action: F) -> Result<T, AppError>
    where
        F: for<'a> FnMut(&'a mut dyn ListingTransaction) -> BoxFuture<'a, Result<T, AppError>>
            + Send,
        T: Send,
    {
        let policy = self.retry_policy().clone();
        let mut attempt = 0;

        loop {
            match self.attempt(&mut action).await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.is_retryable() && attempt < policy.max_retries => {
                    let err = failure.into_error();
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    warn!(
                        error = %err,
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure in unit of work, retrying"
                    );
                    metrics::counter!("unit_of_work_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.into_error()),
            }
        }
    }

    async fn attempt<T, F>(&self, action: &mut F) -> Result<T, AttemptFailure>
    where
        F: for<'a> FnMut(&'a mut dyn ListingTransaction) -> BoxFuture<'a, Result<T, AppError>>
            + Send,
        T: Send,
    {
        let mut tx = self.begin().await.map_err(AttemptFailure::BeforeCommit)?;

        let result = action(tx.as_mut()).await;
        match result {
            Ok(value) => {
                tx.commit().await.map_err(AttemptFailure::AtCommit)?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back unit of work");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(AttemptFailure::BeforeCommit(err))
            }
        }
    }
}

/// Where a single attempt stopped.
enum AttemptFailure {
    /// Nothing was committed.
    BeforeCommit(AppError),
    /// The COMMIT statement failed.
    AtCommit(AppError),
}

impl AttemptFailure {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::BeforeCommit(err) => err.is_transient(),
            AttemptFailure::AtCommit(err) => {
                matches!(err, AppError::Database(DatabaseError::Transient(_)))
            }
        }
    }

    fn into_error(self) -> AppError {
        match self {
            AttemptFailure::BeforeCommit(err) | AttemptFailure::AtCommit(err) => err,
        }
    }
}
