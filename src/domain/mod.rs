//! Domain layer containing the listing aggregate, value objects, persistence
//! traits, and error definitions.

pub mod address;
pub mod error;
pub mod listing;
pub mod money;
pub mod traits;
pub mod transaction;
pub mod types;

pub use address::Address;
pub use error::{
    AppError, ConfigError, DatabaseError, DomainError, MoneyError, ServiceError, ServiceErrorCode,
    ValidationError,
};
pub use listing::{Listing, ListingStatus, Transition};
pub use money::{Currency, Money};
pub use traits::{ListingRepository, ListingTransaction, UnitOfWork};
pub use transaction::RetryPolicy;
pub use types::{HealthResponse, HealthStatus};
