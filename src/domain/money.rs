//! Monetary value object.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::MoneyError;

/// ISO-4217 currency code.
///
/// `XXX` is the ISO code for "no currency" and is only meaningful for
/// [`Money::ZERO`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Xxx,
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
    Chf,
    Jpy,
    Cny,
    Inr,
    Mxn,
    Brl,
}

impl Currency {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Xxx => "XXX",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
            Currency::Inr => "INR",
            Currency::Mxn => "MXN",
            Currency::Brl => "BRL",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XXX" => Ok(Currency::Xxx),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CAD" => Ok(Currency::Cad),
            "AUD" => Ok(Currency::Aud),
            "CHF" => Ok(Currency::Chf),
            "JPY" => Ok(Currency::Jpy),
            "CNY" => Ok(Currency::Cny),
            "INR" => Ok(Currency::Inr),
            "MXN" => Ok(Currency::Mxn),
            "BRL" => Ok(Currency::Brl),
            other => Err(format!("unknown currency code '{other}'")),
        }
    }
}

/// An amount of money in a single currency.
///
/// [`Money::ZERO`] is a currency-agnostic sentinel: it compares against and
/// combines with any currency. Any other pair of values must share a
/// currency, otherwise comparison and arithmetic fail with
/// [`MoneyError::CurrencyMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"amount": 350000.00, "currency": "USD"}))]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub const ZERO: Money = Money {
        amount: Decimal::ZERO,
        currency: Currency::Xxx,
    };

    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    #[must_use]
    pub fn from_dollars(amount: impl Into<Decimal>) -> Self {
        Self::new(amount.into(), Currency::Usd)
    }

    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// True only for the currency-less sentinel, not for `0 USD`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Compares two amounts, treating [`Money::ZERO`] as comparable to anything.
    pub fn try_cmp(&self, other: &Money) -> Result<Ordering, MoneyError> {
        if other.is_zero() {
            return Ok(self.amount.cmp(&Decimal::ZERO));
        }
        if self.is_zero() {
            return Ok(Decimal::ZERO.cmp(&other.amount));
        }
        self.ensure_same_currency(other, "compare")?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        if other.is_zero() {
            return Ok(self);
        }
        if self.is_zero() {
            return Ok(other);
        }
        self.ensure_same_currency(&other, "add")?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow { operation: "add" })?;
        Ok(Money::new(amount, self.currency))
    }

    pub fn checked_sub(self, other: Money) -> Result<Money, MoneyError> {
        if other.is_zero() {
            return Ok(self);
        }
        if self.is_zero() {
            return Ok(Money::new(-other.amount, other.currency));
        }
        self.ensure_same_currency(&other, "subtract")?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow { operation: "subtract" })?;
        Ok(Money::new(amount, self.currency))
    }

    pub fn checked_mul(self, multiplier: Decimal) -> Result<Money, MoneyError> {
        if self.is_zero() || multiplier.is_zero() {
            return Ok(Money::ZERO);
        }
        let amount = self
            .amount
            .checked_mul(multiplier)
            .ok_or(MoneyError::Overflow { operation: "multiply" })?;
        Ok(Money::new(amount, self.currency))
    }

    pub fn checked_div(self, divisor: Decimal) -> Result<Money, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivideByZero);
        }
        if self.is_zero() {
            return Ok(Money::ZERO);
        }
        let amount = self
            .amount
            .checked_div(divisor)
            .ok_or(MoneyError::Overflow { operation: "divide" })?;
        Ok(Money::new(amount, self.currency))
    }

    fn ensure_same_currency(&self, other: &Money, operation: &'static str) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                operation,
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    /// # Panics
    ///
    /// Panics when the product does not fit in a [`Decimal`]; use
    /// [`Money::checked_mul`] for untrusted factors.
    fn mul(self, multiplier: Decimal) -> Money {
        match self.checked_mul(multiplier) {
            Ok(product) => product,
            Err(err) => panic!("{err}"),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.2}", rounded.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{} {sign}{grouped}.{fraction}", self.currency)
    }
}
