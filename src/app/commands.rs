//! Use-case inputs accepted by [`ListingService`](super::ListingService).

use crate::domain::{Address, DomainError, ListingStatus, Money};

/// Unvalidated address parts as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl AddressInput {
    pub fn to_address(&self) -> Result<Address, DomainError> {
        Address::new(
            &self.street,
            &self.city,
            self.state.as_deref(),
            self.zip_code.as_deref(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateListingCommand {
    pub title: String,
    pub price: Money,
    pub description: Option<String>,
    pub address: Option<AddressInput>,
}

/// Full replacement of a listing's details.
///
/// A missing description or address keeps the stored value; `status`, when
/// present and different from the current one, is applied as a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateListingCommand {
    pub title: String,
    pub price: Money,
    pub description: Option<String>,
    pub address: Option<AddressInput>,
    pub status: Option<ListingStatus>,
}
