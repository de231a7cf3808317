//! Admission use-case service.
//!
//! # Responsibility
//! - Decide and commit accept/reject for one registration attempt.
//! - Expose count/list/cancel over an event's registration set.
//!
//! # Invariants
//! - Registrations for an event never exceed its capacity at commit time.
//! - No two registrations for one event share a phone.
//! - Rejections leave storage untouched.
//! - Event status is not an admission precondition; admissions into a
//!   `Closed` event are accepted and logged with a flag.
//! - Logs carry ids and outcomes only, never names or phones.

use crate::model::event::{Event, EventId, EventStatus};
use crate::model::registration::{
    normalize_name, PhoneRules, Registration, RegistrationValidationError,
};
use crate::repo::event_repo::EventRepository;
use crate::repo::registration_repo::{InsertOutcome, RegistrationRepository};
use crate::repo::RepoError;
use crate::service::event_registry::{EventRegistry, RegistryError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from admission operations.
#[derive(Debug)]
pub enum AdmissionError {
    /// Name or phone is malformed.
    ValidationFailed(RegistrationValidationError),
    /// Referenced event does not exist.
    EventNotFound(EventId),
    /// Event already holds `capacity` registrations.
    EventFull { event_id: EventId, capacity: i64 },
    /// Phone already registered for this event.
    DuplicatePhone { event_id: EventId },
    /// No registration for this (event, phone) pair.
    RegistrationNotFound { event_id: EventId },
    /// Storage failure unrelated to admission rules.
    Repo(RepoError),
}

impl AdmissionError {
    /// Stable machine-readable code for transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation_failed",
            Self::EventNotFound(_) => "event_not_found",
            Self::EventFull { .. } => "event_full",
            Self::DuplicatePhone { .. } => "duplicate_phone",
            Self::RegistrationNotFound { .. } => "registration_not_found",
            Self::Repo(_) => "internal",
        }
    }
}

impl Display for AdmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(err) => write!(f, "{err}"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::EventFull { event_id, capacity } => {
                write!(f, "event {event_id} is full (capacity {capacity})")
            }
            Self::DuplicatePhone { event_id } => {
                write!(f, "phone already registered for event {event_id}")
            }
            Self::RegistrationNotFound { event_id } => {
                write!(f, "no registration for this phone in event {event_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdmissionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistrationValidationError> for AdmissionError {
    fn from(value: RegistrationValidationError) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<RepoError> for AdmissionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<RegistryError> for AdmissionError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound(id) => Self::EventNotFound(id),
            RegistryError::Repo(err) => Self::Repo(err),
            RegistryError::InvalidInput(err) => {
                Self::Repo(RepoError::InvalidData(err.to_string()))
            }
        }
    }
}

/// Point-in-time seat summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub capacity: i64,
    pub registered: i64,
    /// Zero when grandfathered registrations exceed a lowered capacity.
    pub remaining: i64,
}

/// Admission facade over the event registry and a registration repository.
pub struct AdmissionController<E: EventRepository, R: RegistrationRepository> {
    events: EventRegistry<E>,
    registrations: R,
    phone_rules: PhoneRules,
}

impl<E: EventRepository, R: RegistrationRepository> AdmissionController<E, R> {
    /// Creates service with the default phone rules.
    pub fn new(events: EventRegistry<E>, registrations: R) -> Self {
        Self::with_phone_rules(events, registrations, PhoneRules::default())
    }

    pub fn with_phone_rules(
        events: EventRegistry<E>,
        registrations: R,
        phone_rules: PhoneRules,
    ) -> Self {
        Self {
            events,
            registrations,
            phone_rules,
        }
    }

    /// Registry this controller reads events from.
    pub fn events(&self) -> &EventRegistry<E> {
        &self.events
    }

    pub fn phone_rules(&self) -> &PhoneRules {
        &self.phone_rules
    }

    /// Admits one participant into `event_id`.
    ///
    /// `phone` must already be canonical; see [`Self::admit_raw`] for typed
    /// input. Checks run in order: input, event existence, capacity,
    /// duplicate phone. Capacity and duplicate checks are atomic with the
    /// insert against concurrent callers.
    pub fn admit(
        &self,
        event_id: EventId,
        name: &str,
        phone: &str,
    ) -> Result<Registration, AdmissionError> {
        let started_at = Instant::now();
        let result = self.admit_inner(event_id, name, phone);
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok((registration, event)) => {
                info!(
                    "event=registration_admit module=admission status=ok outcome=admitted event_id={} registration_id={} duration_ms={}",
                    event_id, registration.id, duration_ms
                );
                if event.status == EventStatus::Closed {
                    warn!(
                        "event=registration_admit module=admission status=ok flag=closed_event_admission event_id={}",
                        event_id
                    );
                }
            }
            Err(AdmissionError::Repo(err)) => {
                error!(
                    "event=registration_admit module=admission status=error error_code=internal event_id={} duration_ms={} error={}",
                    event_id, duration_ms, err
                );
            }
            Err(err) => {
                info!(
                    "event=registration_admit module=admission status=rejected outcome={} event_id={} duration_ms={}",
                    err.code(),
                    event_id,
                    duration_ms
                );
            }
        }

        result.map(|(registration, _)| registration)
    }

    /// Normalizes user-typed phone input, then admits.
    pub fn admit_raw(
        &self,
        event_id: EventId,
        name: &str,
        raw_phone: &str,
    ) -> Result<Registration, AdmissionError> {
        let phone = self.phone_rules.normalize(raw_phone)?;
        self.admit(event_id, name, &phone)
    }

    /// Current registration count. Not serialized against `admit`.
    pub fn count(&self, event_id: EventId) -> Result<i64, AdmissionError> {
        self.events.get(event_id)?;
        Ok(self.registrations.count_for_event(event_id)?)
    }

    /// Registrations ordered by name, ties in insertion order.
    pub fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>, AdmissionError> {
        self.events.get(event_id)?;
        Ok(self.registrations.list_for_event(event_id)?)
    }

    pub fn availability(&self, event_id: EventId) -> Result<Availability, AdmissionError> {
        let event = self.events.get(event_id)?;
        let registered = self.registrations.count_for_event(event_id)?;
        Ok(Availability {
            capacity: event.capacity,
            registered,
            remaining: (event.capacity - registered).max(0),
        })
    }

    /// Removes the registration for (`event_id`, `phone`).
    ///
    /// Not idempotent: cancelling an already removed registration fails with
    /// `RegistrationNotFound`.
    pub fn cancel(&self, event_id: EventId, phone: &str) -> Result<(), AdmissionError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(RegistrationValidationError::InvalidPhone(String::new()).into());
        }

        if !self
            .registrations
            .delete_by_event_and_phone(event_id, phone)?
        {
            info!(
                "event=registration_cancel module=admission status=rejected outcome=registration_not_found event_id={}",
                event_id
            );
            return Err(AdmissionError::RegistrationNotFound { event_id });
        }

        info!(
            "event=registration_cancel module=admission status=ok event_id={}",
            event_id
        );
        Ok(())
    }

    fn admit_inner(
        &self,
        event_id: EventId,
        name: &str,
        phone: &str,
    ) -> Result<(Registration, Event), AdmissionError> {
        let name = normalize_name(name)?;
        self.phone_rules.validate(phone)?;

        let event = self.events.get(event_id)?;

        let candidate = Registration::new(event_id, name, phone);
        match self.registrations.insert_if_admissible(&candidate)? {
            InsertOutcome::Inserted(registration) => Ok((registration, event)),
            InsertOutcome::EventMissing => Err(AdmissionError::EventNotFound(event_id)),
            InsertOutcome::Full {
                capacity,
                registered,
            } => {
                debug!(
                    "event=registration_admit module=admission status=rejected outcome=event_full event_id={} capacity={} registered={}",
                    event_id, capacity, registered
                );
                Err(AdmissionError::EventFull { event_id, capacity })
            }
            InsertOutcome::DuplicatePhone => Err(AdmissionError::DuplicatePhone { event_id }),
        }
    }
}
