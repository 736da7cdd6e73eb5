//! Concrete database adapters.
//!
//! This module contains the PostgreSQL adapter that implements the
//! `ListingRepository` and `UnitOfWork` traits defined in the domain layer.

pub mod postgres;

pub use postgres::{PgListingTransaction, PostgresClient, PostgresConfig};
