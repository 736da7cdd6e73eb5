//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::domain::{ListingRepository, UnitOfWork};
use crate::infra::PrometheusHandle;

use super::service::ListingService;

/// Shared application state for the Axum web server.
///
/// Handlers only see the [`ListingService`]; the concrete persistence
/// adapter is chosen at startup.
///
/// # Example
///
/// ```ignore
/// let db = Arc::new(PostgresClient::new(&url, PostgresConfig::default()).await?);
/// let state = AppState::new(db.clone(), db).with_metrics(init_metrics_handle());
///
/// let router = create_router(Arc::new(state));
/// ```
#[derive(Clone)]
pub struct AppState {
    /// The listing use cases.
    pub service: Arc<ListingService>,

    /// Renders `GET /metrics` when a Prometheus recorder is installed.
    pub metrics_handle: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates the state, wiring a [`ListingService`] to the given adapters.
    #[must_use]
    pub fn new(repository: Arc<dyn ListingRepository>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self {
            service: Arc::new(ListingService::new(repository, uow)),
            metrics_handle: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: Option<Arc<PrometheusHandle>>) -> Self {
        self.metrics_handle = handle;
        self
    }
}
