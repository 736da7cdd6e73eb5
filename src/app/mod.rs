//! Application layer containing the listing use cases and shared state.

pub mod commands;
pub mod service;
pub mod state;

pub use commands::{AddressInput, CreateListingCommand, UpdateListingCommand};
pub use service::ListingService;
pub use state::AppState;
