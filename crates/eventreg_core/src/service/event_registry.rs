//! Event registry use-case service.
//!
//! # Responsibility
//! - Own create/get/update/delete/list over event records.
//! - Be the authoritative source of `capacity` and `status`.
//!
//! # Invariants
//! - Field constraints are checked before any repository write.
//! - `Open`/`Closed` transitions only happen through `update`.
//! - The registry never depends on admission logic.

use crate::model::event::{Event, EventId, EventPatch, EventValidationError, NewEvent};
use crate::repo::event_repo::{EventListQuery, EventRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from event registry operations.
#[derive(Debug)]
pub enum RegistryError {
    /// Title/capacity constraints violated.
    InvalidInput(EventValidationError),
    /// Target event does not exist.
    NotFound(EventId),
    /// Storage failure unrelated to registry rules.
    Repo(RepoError),
}

impl RegistryError {
    /// Stable machine-readable code for transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Repo(_) => "internal",
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<EventValidationError> for RegistryError {
    fn from(value: EventValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for RegistryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Event registry facade over an event repository.
pub struct EventRegistry<R: EventRepository> {
    repo: R,
}

impl<R: EventRepository> EventRegistry<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one event. Status defaults to `Open`.
    pub fn create(&self, request: NewEvent) -> Result<Event, RegistryError> {
        let event = request.into_event()?;
        let stored = self.repo.create_event(&event)?;
        info!(
            "event=event_create module=registry status=ok event_id={} capacity={} event_status={}",
            stored.id, stored.capacity, stored.status
        );
        Ok(stored)
    }

    pub fn get(&self, id: EventId) -> Result<Event, RegistryError> {
        self.repo.get_event(id)?.ok_or(RegistryError::NotFound(id))
    }

    pub fn list(&self, query: &EventListQuery) -> Result<Vec<Event>, RegistryError> {
        Ok(self.repo.list_events(query)?)
    }

    /// Applies a partial update; unset fields keep their stored values.
    ///
    /// Capacity may drop below the current registration count. Existing
    /// registrations are kept; only new admissions are blocked.
    pub fn update(&self, id: EventId, patch: &EventPatch) -> Result<Event, RegistryError> {
        patch.validate()?;
        let updated = self
            .repo
            .update_event(id, patch)?
            .ok_or(RegistryError::NotFound(id))?;
        info!(
            "event=event_update module=registry status=ok event_id={} capacity={} event_status={}",
            updated.id, updated.capacity, updated.status
        );
        Ok(updated)
    }

    /// Deletes one event together with all its registrations.
    ///
    /// Returns how many registrations were removed by the cascade.
    pub fn delete(&self, id: EventId) -> Result<u64, RegistryError> {
        let cascaded = self
            .repo
            .delete_event(id)?
            .ok_or(RegistryError::NotFound(id))?;
        info!(
            "event=event_delete module=registry status=ok event_id={} cascaded_registrations={}",
            id, cascaded
        );
        Ok(cascaded)
    }
}
