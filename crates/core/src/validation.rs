//! Typed tool inputs.
//!
//! Every value in this module can only be constructed through a checking
//! constructor, so holding one is proof that the input passed validation.
//! Constructors are pure: validating the same raw input twice always yields
//! the same outcome.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_YEAR: u16 = 2024;
pub const MAX_YEAR: u16 = 2100;

pub const CANONICAL_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const BOUNDARY_DATE_FORMATS: &str = "DD-MM-YYYY or YYYY-MM-DD";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} must be a number, got `{raw}`")]
    NotNumeric { field: &'static str, raw: String },
    #[error("{field} must be greater than 0")]
    NotPositive { field: &'static str },
    #[error("{field} `{raw}` must be in {expected} format")]
    DateFormat { field: &'static str, raw: String, expected: &'static str },
    #[error("{field} year {year} must be within 2024..=2100")]
    YearOutOfRange { field: &'static str, year: u16 },
    #[error("{field} month {month} must be within 1..=12")]
    MonthOutOfRange { field: &'static str, month: u8 },
    #[error("{field} day {day} must be within 1..=31")]
    DayOutOfRange { field: &'static str, day: u8 },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::NotNumeric { field, .. }
            | Self::NotPositive { field }
            | Self::DateFormat { field, .. }
            | Self::YearOutOfRange { field, .. }
            | Self::MonthOutOfRange { field, .. }
            | Self::DayOutOfRange { field, .. } => field,
        }
    }
}

fn non_empty(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

macro_rules! non_empty_text {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub const FIELD: &'static str = $field;

            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                non_empty($field, raw).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

non_empty_text!(
    /// Destination city or airport code.
    Destination,
    "destination"
);
non_empty_text!(
    /// Departure city or airport code.
    Departure,
    "departure"
);
non_empty_text!(PassengerName, "passenger_name");
non_empty_text!(
    /// Identifier of a bookable flight, usually the flight number.
    FlightId,
    "flight_id"
);
non_empty_text!(EventDetails, "details");

/// Strictly positive amount of currency units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const FIELD: &'static str = "max_price";

    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        Self::new_for(Self::FIELD, amount)
    }

    pub fn new_for(field: &'static str, amount: Decimal) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NotPositive { field });
        }
        Ok(Self(amount.normalize()))
    }

    /// Rejects NaN and infinities as non-numeric.
    pub fn from_f64(amount: f64) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::NotNumeric {
                field: Self::FIELD,
                raw: amount.to_string(),
            });
        }
        let decimal = Decimal::from_f64(amount).ok_or_else(|| ValidationError::NotNumeric {
            field: Self::FIELD,
            raw: amount.to_string(),
        })?;
        Self::new(decimal)
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let cleaned = trimmed.trim_start_matches(['$', '₹']).replace(',', "");
        let decimal = Decimal::from_str(&cleaned).map_err(|_| ValidationError::NotNumeric {
            field: Self::FIELD,
            raw: trimmed.to_string(),
        })?;
        Self::new(decimal)
    }

    /// Accepts a JSON number or a numeric string; anything else is non-numeric.
    pub fn from_json(value: Option<&serde_json::Value>) -> Result<Self, ValidationError> {
        match value {
            None | Some(serde_json::Value::Null) => Err(ValidationError::Empty { field: Self::FIELD }),
            Some(serde_json::Value::Number(number)) => match number.as_f64() {
                Some(amount) => Self::from_f64(amount),
                None => Err(ValidationError::NotNumeric {
                    field: Self::FIELD,
                    raw: number.to_string(),
                }),
            },
            Some(serde_json::Value::String(raw)) => Self::parse(raw),
            Some(other) => {
                Err(ValidationError::NotNumeric { field: Self::FIELD, raw: other.to_string() })
            }
        }
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether a whole-unit fare fits under this price.
    pub fn covers(&self, fare: u32) -> bool {
        Decimal::from(fare) <= self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Calendar date held in the canonical `YYYY-MM-DD` form.
///
/// Day range is checked as 1..=31 for every month; days-per-month and leap
/// years are not taken into account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TravelDate {
    year: u16,
    month: u8,
    day: u8,
}

impl TravelDate {
    pub const FIELD: &'static str = "date";

    /// Accepts only the canonical `YYYY-MM-DD` form.
    pub fn parse_canonical(raw: &str) -> Result<Self, ValidationError> {
        Self::parse_canonical_for(Self::FIELD, raw)
    }

    pub fn parse_canonical_for(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }
        match split_digits(trimmed).as_deref() {
            Some([year, month, day]) if year.len() == 4 && month.len() == 2 && day.len() == 2 => {
                Self::from_parts(field, year, month, day)
            }
            _ => Err(ValidationError::DateFormat {
                field,
                raw: trimmed.to_string(),
                expected: CANONICAL_DATE_FORMAT,
            }),
        }
    }

    /// Accepts `DD-MM-YYYY` or `YYYY-MM-DD`, as sent by HTTP clients, and
    /// converts to the canonical form.
    pub fn parse_flexible(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }
        match split_digits(trimmed).as_deref() {
            Some([year, month, day]) if year.len() == 4 && month.len() == 2 && day.len() == 2 => {
                Self::from_parts(field, year, month, day)
            }
            Some([day, month, year]) if day.len() == 2 && month.len() == 2 && year.len() == 4 => {
                Self::from_parts(field, year, month, day)
            }
            _ => Err(ValidationError::DateFormat {
                field,
                raw: trimmed.to_string(),
                expected: BOUNDARY_DATE_FORMATS,
            }),
        }
    }

    fn from_parts(
        field: &'static str,
        year: &str,
        month: &str,
        day: &str,
    ) -> Result<Self, ValidationError> {
        // split_digits guarantees ASCII digits of bounded length
        let year = year.parse::<u16>().unwrap_or_default();
        let month = month.parse::<u8>().unwrap_or_default();
        let day = day.parse::<u8>().unwrap_or_default();

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::YearOutOfRange { field, year });
        }
        if !(1..=12).contains(&month) {
            return Err(ValidationError::MonthOutOfRange { field, month });
        }
        if !(1..=31).contains(&day) {
            return Err(ValidationError::DayOutOfRange { field, day });
        }
        Ok(Self { year, month, day })
    }

    /// `DD-MM-YYYY`, the form shown to passengers.
    pub fn to_day_first(&self) -> String {
        format!("{:02}-{:02}-{:04}", self.day, self.month, self.year)
    }
}

fn split_digits(raw: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = raw.split('-').collect();
    let all_digits = parts
        .iter()
        .all(|part| !part.is_empty() && part.len() <= 4 && part.bytes().all(|b| b.is_ascii_digit()));
    (parts.len() == 3 && all_digits).then_some(parts)
}

impl fmt::Display for TravelDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for TravelDate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_canonical(&value)
    }
}

impl From<TravelDate> for String {
    fn from(value: TravelDate) -> Self {
        value.to_string()
    }
}
