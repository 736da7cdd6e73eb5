//! The listing aggregate and its lifecycle.
//!
//! ```text
//!   Draft ──publish──▶ Published ──archive──▶ Archived
//!     ▲                                          │
//!     └───────────────── reactivate ─────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::Address;
use super::error::DomainError;
use super::money::{Currency, Money};

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Prices are stored as `NUMERIC(18,2)`.
pub const PRICE_MAX_SCALE: u32 = 2;
/// 9,999,999,999,999,999.99
pub const PRICE_MAX: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

/// Lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum ListingStatus {
    /// Initial state, not publicly visible.
    #[default]
    Draft,
    /// Publicly visible and active.
    Published,
    /// Removed from public view; read-only until reactivated.
    Archived,
}

impl ListingStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "Draft",
            ListingStatus::Published => "Published",
            ListingStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(ListingStatus::Draft),
            "Published" => Ok(ListingStatus::Published),
            "Archived" => Ok(ListingStatus::Archived),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

/// A lifecycle transition between two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Publish,
    Archive,
    Reactivate,
}

impl Transition {
    #[must_use]
    pub fn from_status(&self) -> ListingStatus {
        match self {
            Transition::Publish => ListingStatus::Draft,
            Transition::Archive => ListingStatus::Published,
            Transition::Reactivate => ListingStatus::Archived,
        }
    }

    #[must_use]
    pub fn to_status(&self) -> ListingStatus {
        match self {
            Transition::Publish => ListingStatus::Published,
            Transition::Archive => ListingStatus::Archived,
            Transition::Reactivate => ListingStatus::Draft,
        }
    }

    /// The transition whose target is `status`.
    #[must_use]
    pub fn into_status(status: ListingStatus) -> Self {
        match status {
            ListingStatus::Published => Transition::Publish,
            ListingStatus::Archived => Transition::Archive,
            ListingStatus::Draft => Transition::Reactivate,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Publish => "publish",
            Transition::Archive => "archive",
            Transition::Reactivate => "reactivate",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Transition::Publish => "published",
            Transition::Archive => "archived",
            Transition::Reactivate => "reactivated",
        }
    }
}

/// Aggregate root for a real-estate listing.
///
/// Fields are only reachable through accessors so every mutation goes
/// through a validating method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    id: Uuid,
    title: String,
    price: Money,
    description: Option<String>,
    address: Option<Address>,
    status: ListingStatus,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Creates a new listing in [`ListingStatus::Draft`].
    pub fn create(
        title: &str,
        price: Money,
        description: Option<String>,
        address: Option<Address>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::invalid("Title must have a value."));
        }
        validate_title_length(title)?;
        validate_price(&price)?;
        validate_description(description.as_deref())?;

        Ok(Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            price,
            description,
            address,
            status: ListingStatus::Draft,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    /// Rebuilds a listing from persisted state without re-validating it.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn restore(
        id: Uuid,
        title: String,
        price: Money,
        description: Option<String>,
        address: Option<Address>,
        status: ListingStatus,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title,
            price,
            description,
            address,
            status,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn price(&self) -> Money {
        self.price
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> ListingStatus {
        self.status
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn publish(&mut self) -> Result<(), DomainError> {
        self.apply(Transition::Publish)
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        self.apply(Transition::Archive)
    }

    pub fn reactivate(&mut self) -> Result<(), DomainError> {
        self.apply(Transition::Reactivate)
    }

    /// Applies a lifecycle transition if the current status allows it.
    pub fn apply(&mut self, transition: Transition) -> Result<(), DomainError> {
        if self.status != transition.from_status() {
            return Err(DomainError::InvalidTransition {
                required: transition.from_status(),
                current: self.status,
                verb: transition.past_tense(),
            });
        }
        self.status = transition.to_status();
        self.touch();
        Ok(())
    }

    /// Moves the listing to `target`, or does nothing when already there.
    ///
    /// Returns the transition that was applied.
    pub fn transition_to(
        &mut self,
        target: ListingStatus,
    ) -> Result<Option<Transition>, DomainError> {
        if self.status == target {
            return Ok(None);
        }
        let transition = Transition::into_status(target);
        self.apply(transition)?;
        Ok(Some(transition))
    }

    /// Replaces the title and, when given, the price and description.
    pub fn update_details(
        &mut self,
        title: &str,
        price: Option<Money>,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_mutable()?;

        if title.trim().is_empty() {
            return Err(DomainError::invalid("Title cannot be empty"));
        }
        validate_title_length(title)?;
        if let Some(price) = &price {
            validate_price(price)?;
        }
        validate_description(description.as_deref())?;

        self.title = title.to_string();
        if let Some(price) = price {
            self.price = price;
        }
        if description.is_some() {
            self.description = description;
        }
        self.touch();
        Ok(())
    }

    /// Replaces the address; `None` clears it.
    pub fn update_address(&mut self, address: Option<Address>) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.address = address;
        self.touch();
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.status == ListingStatus::Archived {
            return Err(DomainError::ArchivedListing);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

fn validate_title_length(title: &str) -> Result<(), DomainError> {
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::invalid(format!(
            "Title cannot exceed {TITLE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: &Money) -> Result<(), DomainError> {
    let amount = price.amount();
    if price.currency() == Currency::Xxx || amount <= Decimal::ZERO {
        return Err(DomainError::invalid(
            "Price must be a positive monetary value.",
        ));
    }
    if amount.normalize().scale() > PRICE_MAX_SCALE {
        return Err(DomainError::invalid(format!(
            "Price cannot have more than {PRICE_MAX_SCALE} decimal places."
        )));
    }
    if amount > PRICE_MAX {
        return Err(DomainError::invalid(format!("Price cannot exceed {PRICE_MAX}.")));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), DomainError> {
    if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_LEN) {
        return Err(DomainError::invalid(format!(
            "Description cannot exceed {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(())
}
