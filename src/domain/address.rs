//! Postal address value object.

use std::fmt;

use super::error::DomainError;

pub const STREET_MAX_LEN: usize = 200;
pub const CITY_MAX_LEN: usize = 100;
pub const STATE_MAX_LEN: usize = 50;
pub const ZIP_CODE_MAX_LEN: usize = 20;

/// A validated, whitespace-trimmed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    street: String,
    city: String,
    state: Option<String>,
    zip_code: Option<String>,
}

impl Address {
    /// Builds an address, trimming every part.
    ///
    /// Street and city are required; blank optional parts are dropped.
    pub fn new(
        street: &str,
        city: &str,
        state: Option<&str>,
        zip_code: Option<&str>,
    ) -> Result<Self, DomainError> {
        let street = street.trim();
        if street.is_empty() {
            return Err(DomainError::invalid("Street is required"));
        }
        if street.chars().count() > STREET_MAX_LEN {
            return Err(DomainError::invalid(format!(
                "Street cannot exceed {STREET_MAX_LEN} characters"
            )));
        }

        let city = city.trim();
        if city.is_empty() {
            return Err(DomainError::invalid("City is required"));
        }
        if city.chars().count() > CITY_MAX_LEN {
            return Err(DomainError::invalid(format!(
                "City cannot exceed {CITY_MAX_LEN} characters"
            )));
        }

        let state = optional_part(state, "State", STATE_MAX_LEN)?;
        let zip_code = optional_part(zip_code, "Zip code", ZIP_CODE_MAX_LEN)?;

        Ok(Self {
            street: street.to_string(),
            city: city.to_string(),
            state,
            zip_code,
        })
    }

    #[must_use]
    pub fn street(&self) -> &str {
        &self.street
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    #[must_use]
    pub fn zip_code(&self) -> Option<&str> {
        self.zip_code.as_deref()
    }
}

fn optional_part(
    value: Option<&str>,
    label: &str,
    max_len: usize,
) -> Result<Option<String>, DomainError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_len {
        return Err(DomainError::invalid(format!(
            "{label} cannot exceed {max_len} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            None => write!(f, "{}, {}", self.street, self.city),
            Some(state) => {
                let line = format!(
                    "{}, {}, {} {}",
                    self.street,
                    self.city,
                    state,
                    self.zip_code.as_deref().unwrap_or_default()
                );
                f.write_str(line.trim())
            }
        }
    }
}
