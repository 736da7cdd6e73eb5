//! HTTP request and response models.
//!
//! Request models carry `validator` length rules that mirror the column
//! sizes; business rules (blank title, non-positive price) stay in the
//! domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::app::{AddressInput, CreateListingCommand, UpdateListingCommand};
use crate::domain::{Address, Listing, ListingStatus, Money};

/// Postal address of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[schema(example = "123 Maple Ave", max_length = 200)]
    #[validate(length(max = 200, message = "Street must be at most 200 characters"))]
    pub street: String,
    #[schema(example = "Springfield", max_length = 100)]
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    pub city: String,
    #[schema(example = "IL", max_length = 50)]
    #[validate(length(max = 50, message = "State must be at most 50 characters"))]
    pub state: Option<String>,
    #[schema(example = "62704", max_length = 20)]
    #[validate(length(max = 20, message = "Zip code must be at most 20 characters"))]
    pub zip_code: Option<String>,
}

impl From<AddressRequest> for AddressInput {
    fn from(request: AddressRequest) -> Self {
        Self {
            street: request.street,
            city: request.city,
            state: request.state,
            zip_code: request.zip_code,
        }
    }
}

/// Request payload for creating a new listing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "title": "Light-filled 3-bed near downtown",
    "price": {"amount": 350000.00, "currency": "USD"},
    "description": "Renovated kitchen, hardwood floors, walk to transit.",
    "address": {"street": "123 Maple Ave", "city": "Springfield", "state": "IL", "zipCode": "62704"}
}))]
pub struct CreateListingRequest {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: String,
    pub price: Money,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(nested)]
    pub address: Option<AddressRequest>,
}

impl From<CreateListingRequest> for CreateListingCommand {
    fn from(request: CreateListingRequest) -> Self {
        Self {
            title: request.title,
            price: request.price,
            description: request.description,
            address: request.address.map(AddressInput::from),
        }
    }
}

/// Request payload for replacing a listing's details.
///
/// A missing `description` or `address` keeps the stored value. `status`,
/// when present, must be reachable by a single lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "title": "Light-filled 3-bed near downtown (price reduced)",
    "price": {"amount": 335000.00, "currency": "USD"},
    "description": "Renovated kitchen, hardwood floors, walk to transit.",
    "address": {"street": "123 Maple Ave", "city": "Springfield", "state": "IL", "zipCode": "62704"},
    "status": "Published"
}))]
pub struct UpdateListingRequest {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: String,
    pub price: Money,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(nested)]
    pub address: Option<AddressRequest>,
    pub status: Option<ListingStatus>,
}

impl From<UpdateListingRequest> for UpdateListingCommand {
    fn from(request: UpdateListingRequest) -> Self {
        Self {
            title: request.title,
            price: request.price,
            description: request.description,
            address: request.address.map(AddressInput::from),
            status: request.status,
        }
    }
}

/// Query parameters for listing listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only return listings in this status
    pub status: Option<ListingStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    /// Single-line form, e.g. "123 Maple Ave, Springfield, IL 62704"
    pub formatted: String,
}

impl From<&Address> for AddressResponse {
    fn from(address: &Address) -> Self {
        Self {
            street: address.street().to_string(),
            city: address.city().to_string(),
            state: address.state().map(str::to_string),
            zip_code: address.zip_code().map(str::to_string),
            formatted: address.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
    "title": "Light-filled 3-bed near downtown",
    "price": {"amount": 350000.00, "currency": "USD"},
    "description": "Renovated kitchen, hardwood floors, walk to transit.",
    "address": {
        "street": "123 Maple Ave",
        "city": "Springfield",
        "state": "IL",
        "zipCode": "62704",
        "formatted": "123 Maple Ave, Springfield, IL 62704"
    },
    "status": "Draft",
    "createdAt": "2024-05-01T12:00:00Z",
    "updatedAt": null
}))]
pub struct ListingResponse {
    pub id: Uuid,
    pub title: String,
    pub price: Money,
    pub description: Option<String>,
    pub address: Option<AddressResponse>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Listing> for ListingResponse {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id(),
            title: listing.title().to_string(),
            price: listing.price(),
            description: listing.description().map(str::to_string),
            address: listing.address().map(AddressResponse::from),
            status: listing.status(),
            created_at: listing.created_at(),
            updated_at: listing.updated_at(),
        }
    }
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "not_found")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Listing with id '3fa85f64-5717-4562-b3fc-2c963f66afa6' was not found.")]
    pub message: String,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    /// Seconds until the client may retry
    pub retry_after: u64,
}
