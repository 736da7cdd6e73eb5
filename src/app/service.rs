//! Application service layer.
//!
//! This module contains the listing use cases. Every write runs inside a
//! unit of work so a listing is loaded, changed, and saved atomically.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    AppError, HealthResponse, HealthStatus, Listing, ListingRepository, ListingStatus,
    ServiceError, Transition, UnitOfWork,
};

use super::commands::{CreateListingCommand, UpdateListingCommand};

/// Application service orchestrating listing use cases.
///
/// Reads go straight to the [`ListingRepository`]; writes go through the
/// [`UnitOfWork`], which retries transient database failures.
///
/// # Example
///
/// ```ignore
/// let db = Arc::new(PostgresClient::new(&url, PostgresConfig::default()).await?);
/// let service = ListingService::new(db.clone(), db);
///
/// let listing = service.create(command).await?;
/// service.publish(listing.id()).await?;
/// ```
pub struct ListingService {
    repository: Arc<dyn ListingRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl ListingService {
    #[must_use]
    pub fn new(repository: Arc<dyn ListingRepository>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { repository, uow }
    }

    /// Lists listings, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Listing>, AppError> {
        self.repository.list(status).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Listing>, AppError> {
        self.repository.get(id).await
    }

    /// Creates a draft listing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Domain`] when the title, price, or address break a
    /// listing invariant, or [`AppError::Database`] when persisting fails.
    #[instrument(skip(self, command), fields(title = %command.title))]
    pub async fn create(&self, command: CreateListingCommand) -> Result<Listing, AppError> {
        let address = command
            .address
            .as_ref()
            .map(|input| input.to_address())
            .transpose()?;
        let listing = Listing::create(
            &command.title,
            command.price,
            command.description,
            address,
        )?;

        self.uow
            .commit(|tx| {
                let listing = listing.clone();
                Box::pin(async move { tx.insert(&listing).await })
            })
            .await?;

        metrics::counter!("listings_created_total").increment(1);
        info!(listing_id = %listing.id(), "Listing created");
        Ok(listing)
    }

    /// Replaces a listing's details, address, and optionally its status.
    #[instrument(skip(self, command))]
    pub async fn update(&self, id: Uuid, command: UpdateListingCommand) -> Result<(), AppError> {
        let applied = self
            .uow
            .commit(|tx| {
                let command = command.clone();
                Box::pin(async move {
                    let mut listing = tx
                        .get(id)
                        .await?
                        .ok_or_else(|| ServiceError::listing_not_found(id))?;

                    listing.update_details(
                        &command.title,
                        Some(command.price),
                        command.description,
                    )?;
                    if let Some(input) = &command.address {
                        listing.update_address(Some(input.to_address()?))?;
                    }
                    let applied = match command.status {
                        Some(status) => listing.transition_to(status)?,
                        None => None,
                    };

                    tx.update(&listing).await?;
                    Ok::<_, AppError>(applied)
                })
            })
            .await?;

        if let Some(transition) = applied {
            record_transition(transition);
        }
        info!(listing_id = %id, "Listing updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn publish(&self, id: Uuid) -> Result<(), AppError> {
        self.transition(id, Transition::Publish).await
    }

    #[instrument(skip(self))]
    pub async fn archive(&self, id: Uuid) -> Result<(), AppError> {
        self.transition(id, Transition::Archive).await
    }

    /// Returns an archived listing to draft.
    #[instrument(skip(self))]
    pub async fn reactivate(&self, id: Uuid) -> Result<(), AppError> {
        self.transition(id, Transition::Reactivate).await
    }

    /// Deletes a listing in any status.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.uow
            .commit(|tx| {
                Box::pin(async move {
                    if tx.delete(id).await? {
                        Ok(())
                    } else {
                        Err(AppError::from(ServiceError::listing_not_found(id)))
                    }
                })
            })
            .await?;

        metrics::counter!("listings_deleted_total").increment(1);
        info!(listing_id = %id, "Listing deleted");
        Ok(())
    }

    /// Performs a health check on the database.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let db_health = match self.repository.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = ?e, "Database health check failed");
                HealthStatus::Unhealthy
            }
        };

        HealthResponse::new(db_health)
    }

    async fn transition(&self, id: Uuid, transition: Transition) -> Result<(), AppError> {
        self.uow
            .commit(|tx| {
                Box::pin(async move {
                    let mut listing = tx
                        .get(id)
                        .await?
                        .ok_or_else(|| ServiceError::listing_not_found(id))?;
                    listing.apply(transition)?;
                    tx.update(&listing).await
                })
            })
            .await?;

        record_transition(transition);
        info!(listing_id = %id, transition = transition.as_str(), "Listing status changed");
        Ok(())
    }
}

fn record_transition(transition: Transition) {
    metrics::counter!("listing_transitions_total", "transition" => transition.as_str())
        .increment(1);
}
