//! Core domain logic for event registration.
//! This crate is the single source of truth for admission invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{Event, EventId, EventPatch, EventStatus, EventValidationError, NewEvent};
pub use model::registration::{
    PhoneRules, Registration, RegistrationId, RegistrationValidationError, DEFAULT_COUNTRY_CODE,
};
pub use repo::event_repo::{EventListQuery, EventRepository, SqliteEventRepository};
pub use repo::registration_repo::{
    InsertOutcome, RegistrationRepository, SqliteRegistrationRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::admission::{AdmissionController, AdmissionError, Availability};
pub use service::event_registry::{EventRegistry, RegistryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
