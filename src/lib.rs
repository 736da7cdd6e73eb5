//! Real-Estate Listing Service
//!
//! An HTTP service for creating, browsing and managing real-estate listings.
//! Each listing moves through a validated lifecycle (Draft, Published,
//! Archived) and every write goes through a retrying unit of work backed by
//! PostgreSQL.
//!
//! # Architecture Overview
//!
//! This crate is organized into four main layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │  HTTP handlers, routing, request validation  │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │   Listing use cases, transactional writes    │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │  Listing aggregate, money, address, traits   │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │      PostgreSQL adapter, tracing, metrics    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use real_estate_listings::api::create_router;
//! use real_estate_listings::app::AppState;
//! use real_estate_listings::infra::PostgresClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
//!     db.run_migrations().await?;
//!
//!     // The same client serves reads and opens transactions
//!     let state = Arc::new(AppState::new(db.clone(), db));
//!
//!     let router = create_router(state);
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
