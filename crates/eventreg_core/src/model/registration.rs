//! Registration domain model and phone rules.
//!
//! # Responsibility
//! - Define one participant's claim on one event slot.
//! - Own the canonical phone grammar and the normalization of typed input.
//!
//! # Invariants
//! - `name` is non-empty after trim.
//! - `phone` is canonical: `+`, country code, then 10-11 national digits.
//! - (`event_id`, `phone`) is unique across stored registrations.

use crate::model::event::EventId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Country code used when none is configured.
pub const DEFAULT_COUNTRY_CODE: &str = "55";
const NATIONAL_DIGITS_MAX: usize = 11;

static COUNTRY_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]\d{0,2}$").expect("valid country code regex"));
static DEFAULT_PHONE_RULES: Lazy<PhoneRules> = Lazy::new(|| {
    PhoneRules::new(DEFAULT_COUNTRY_CODE).expect("default country code is valid")
});

/// Stable identifier of one registration.
pub type RegistrationId = Uuid;

/// Input violations for the admission path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    /// Participant name is blank after trim.
    EmptyName,
    /// Phone does not match the canonical grammar.
    InvalidPhone(String),
    /// Configured country code is not 1-3 digits.
    InvalidCountryCode(String),
}

impl Display for RegistrationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "participant name must not be blank"),
            Self::InvalidPhone(_) => write!(
                f,
                "phone must be `+` followed by country code and 10-11 digits"
            ),
            Self::InvalidCountryCode(value) => {
                write!(f, "invalid phone country code `{value}`")
            }
        }
    }
}

impl Error for RegistrationValidationError {}

/// Persisted registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub name: String,
    pub phone: String,
    /// Epoch milliseconds, assigned by storage on insert.
    pub created_at: i64,
}

impl Registration {
    /// Builds a not-yet-persisted registration with a fresh id.
    ///
    /// Callers are expected to have validated `name` and `phone` already.
    pub fn new(event_id: EventId, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: name.into(),
            phone: phone.into(),
            created_at: 0,
        }
    }
}

/// Canonical phone grammar for one country code.
#[derive(Debug, Clone)]
pub struct PhoneRules {
    country_code: String,
    canonical: Regex,
}

impl PhoneRules {
    /// Creates rules for `country_code` (digits only, no leading `+`).
    pub fn new(country_code: &str) -> Result<Self, RegistrationValidationError> {
        let country_code = country_code.trim().trim_start_matches('+');
        if !COUNTRY_CODE_RE.is_match(country_code) {
            return Err(RegistrationValidationError::InvalidCountryCode(
                country_code.to_string(),
            ));
        }
        let canonical = Regex::new(&format!(r"^\+{country_code}\d{{10,11}}$"))
            .map_err(|_| RegistrationValidationError::InvalidCountryCode(country_code.to_string()))?;
        Ok(Self {
            country_code: country_code.to_string(),
            canonical,
        })
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Returns `true` when `phone` is already in canonical form.
    pub fn is_canonical(&self, phone: &str) -> bool {
        self.canonical.is_match(phone)
    }

    pub fn validate(&self, phone: &str) -> Result<(), RegistrationValidationError> {
        if self.is_canonical(phone) {
            Ok(())
        } else {
            Err(RegistrationValidationError::InvalidPhone(phone.to_string()))
        }
    }

    /// Converts user-typed input into canonical form.
    ///
    /// Input starting with `+` keeps its own country code. Anything else is
    /// treated as a national number (masks such as `(11) 91234-5678` are
    /// stripped, extra digits past 11 dropped) and gets the configured
    /// country code prepended.
    pub fn normalize(&self, raw: &str) -> Result<String, RegistrationValidationError> {
        let trimmed = raw.trim();
        let candidate = match trimmed.strip_prefix('+') {
            Some(rest) => format!("+{}", digits_only(rest)),
            None => {
                let national: String = digits_only(trimmed)
                    .chars()
                    .take(NATIONAL_DIGITS_MAX)
                    .collect();
                format!("+{}{national}", self.country_code)
            }
        };
        if self.is_canonical(&candidate) {
            Ok(candidate)
        } else {
            Err(RegistrationValidationError::InvalidPhone(trimmed.to_string()))
        }
    }
}

impl Default for PhoneRules {
    fn default() -> Self {
        DEFAULT_PHONE_RULES.clone()
    }
}

/// Validates a participant name and returns its trimmed form.
pub fn normalize_name(name: &str) -> Result<String, RegistrationValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistrationValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
