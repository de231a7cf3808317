//! Event domain model.
//!
//! # Responsibility
//! - Define the organizer-owned event record and its lifecycle status.
//! - Validate title/capacity constraints for create and partial update.
//!
//! # Invariants
//! - `title` is non-empty after trim.
//! - `capacity` is never negative.
//! - `status` only moves between `Open` and `Closed` by explicit update.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one event.
pub type EventId = Uuid;

/// Lifecycle status of an event.
///
/// Advisory only: admission does not consult it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Accepting registrations.
    #[default]
    Open,
    /// Marked closed by the organizer.
    Closed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field constraint violations for event create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    /// Title is blank after trim.
    EmptyTitle,
    /// Capacity is below zero.
    NegativeCapacity(i64),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "event title must not be blank"),
            Self::NegativeCapacity(value) => {
                write!(f, "event capacity must be >= 0, got {value}")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Persisted event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    /// Maximum number of registrations new admissions may reach.
    pub capacity: i64,
    pub status: EventStatus,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Event {
    /// Applies a partial update in memory, leaving unset fields untouched.
    pub fn apply(&mut self, patch: &EventPatch) -> Result<(), EventValidationError> {
        patch.validate()?;
        if let Some(title) = patch.title.as_deref() {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description.as_deref() {
            self.description = normalize_description(Some(description));
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

/// Create request for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub capacity: i64,
    #[serde(default)]
    pub status: EventStatus,
}

impl NewEvent {
    /// Builds an `Open` event request without description.
    pub fn new(title: impl Into<String>, capacity: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            capacity,
            status: EventStatus::Open,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<(), EventValidationError> {
        validate_title(&self.title)?;
        validate_capacity(self.capacity)
    }

    /// Materializes the record that will be persisted.
    ///
    /// Timestamps are placeholders until the repository reads the row back.
    pub fn into_event(self) -> Result<Event, EventValidationError> {
        self.validate()?;
        Ok(Event {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: normalize_description(self.description.as_deref()),
            capacity: self.capacity,
            status: self.status,
            created_at: 0,
            updated_at: 0,
        })
    }
}

/// Partial update for one event. `None` fields are left untouched.
///
/// A blank `description` clears the stored description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i64>,
    pub status: Option<EventStatus>,
}

impl EventPatch {
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), EventValidationError> {
    if title.trim().is_empty() {
        return Err(EventValidationError::EmptyTitle);
    }
    Ok(())
}

fn validate_capacity(capacity: i64) -> Result<(), EventValidationError> {
    if capacity < 0 {
        return Err(EventValidationError::NegativeCapacity(capacity));
    }
    Ok(())
}

fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{EventPatch, EventStatus, EventValidationError, NewEvent};

    #[test]
    fn new_event_rejects_blank_title_and_negative_capacity() {
        assert_eq!(
            NewEvent::new("   ", 10).validate(),
            Err(EventValidationError::EmptyTitle)
        );
        assert_eq!(
            NewEvent::new("Workshop", -1).validate(),
            Err(EventValidationError::NegativeCapacity(-1))
        );
        assert!(NewEvent::new("Workshop", 0).validate().is_ok());
    }

    #[test]
    fn apply_patch_leaves_unset_fields_untouched() {
        let mut event = NewEvent::new("  Docker talk ", 50)
            .with_description("containers")
            .into_event()
            .unwrap();
        assert_eq!(event.title, "Docker talk");

        let patch = EventPatch {
            status: Some(EventStatus::Closed),
            ..EventPatch::default()
        };
        event.apply(&patch).unwrap();

        assert_eq!(event.status, EventStatus::Closed);
        assert_eq!(event.capacity, 50);
        assert_eq!(event.description.as_deref(), Some("containers"));
    }

    #[test]
    fn blank_description_in_patch_clears_it() {
        let mut event = NewEvent::new("Talk", 1)
            .with_description("old")
            .into_event()
            .unwrap();
        let patch = EventPatch {
            description: Some(" ".to_string()),
            ..EventPatch::default()
        };
        event.apply(&patch).unwrap();
        assert_eq!(event.description, None);
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [EventStatus::Open, EventStatus::Closed] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("aberto"), None);
    }

    #[test]
    fn new_event_json_defaults_status_to_open() {
        let request: NewEvent =
            serde_json::from_str(r#"{"title":"Workshop","description":null,"capacity":3}"#)
                .unwrap();
        assert_eq!(request.status, EventStatus::Open);
        assert_eq!(
            serde_json::to_string(&EventStatus::Closed).unwrap(),
            r#""closed""#
        );
    }
}
