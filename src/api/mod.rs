//! The API layer, containing web handlers, request models, and routing.

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod router;

pub use router::{RateLimitConfig, create_router, create_router_with_rate_limit};
