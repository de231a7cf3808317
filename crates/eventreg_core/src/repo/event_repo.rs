//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over canonical `events` storage.
//! - Apply partial updates read-modify-write inside one transaction.
//!
//! # Invariants
//! - Write paths validate the record before SQL mutations.
//! - Deleting an event removes its registrations through the
//!   `ON DELETE CASCADE` foreign key.
//! - Listing is deterministic: `created_at ASC`, then insertion order.

use crate::model::event::{Event, EventId, EventPatch, EventStatus};
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const EVENTS_DEFAULT_LIMIT: u32 = 50;
const EVENTS_LIMIT_MAX: u32 = 200;

const EVENT_COLUMNS: &[&str] = &[
    "uuid",
    "title",
    "description",
    "capacity",
    "status",
    "created_at",
    "updated_at",
];

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    capacity,
    status,
    created_at,
    updated_at
FROM events";

/// Query options for listing events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventListQuery {
    /// Optional exact status filter.
    pub status: Option<EventStatus>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for event records.
pub trait EventRepository {
    /// Inserts one validated event and returns the stored row.
    fn create_event(&self, event: &Event) -> RepoResult<Event>;
    /// Loads one event by id.
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Lists events using status filter + pagination.
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>>;
    /// Applies a validated partial update. Returns `None` when missing.
    fn update_event(&self, id: EventId, patch: &EventPatch) -> RepoResult<Option<Event>>;
    /// Deletes one event and its registrations.
    ///
    /// Returns the number of cascaded registrations, or `None` when missing.
    fn delete_event(&self, id: EventId) -> RepoResult<Option<u64>>;
}

/// SQLite-backed event repository.
#[derive(Clone, Copy)]
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("events", EVENT_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<Event> {
        self.conn.execute(
            "INSERT INTO events (
                uuid,
                title,
                description,
                capacity,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                event.id.to_string(),
                event.title.as_str(),
                event.description.as_deref(),
                event.capacity,
                event.status.as_str(),
            ],
        )?;

        load_event(self.conn, event.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created event {} not found in read-back", event.id))
        })
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        load_event(self.conn, id)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_event_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }

    fn update_event(&self, id: EventId, patch: &EventPatch) -> RepoResult<Option<Event>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(mut event) = load_event(&tx, id)? else {
            return Ok(None);
        };
        event
            .apply(patch)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        tx.execute(
            "UPDATE events
             SET
                title = ?2,
                description = ?3,
                capacity = ?4,
                status = ?5,
                updated_at = CAST(ROUND(unixepoch('subsec') * 1000) AS INTEGER)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                event.title.as_str(),
                event.description.as_deref(),
                event.capacity,
                event.status.as_str(),
            ],
        )?;
        let updated = load_event(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_event(&self, id: EventId) -> RepoResult<Option<u64>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let cascaded: i64 = tx.query_row(
            "SELECT COUNT(*) FROM registrations WHERE event_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        let changed = tx.execute("DELETE FROM events WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Ok(None);
        }
        tx.commit()?;
        Ok(Some(cascaded.max(0) as u64))
    }
}

/// Normalizes list limit according to events contract.
pub fn normalize_event_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => EVENTS_DEFAULT_LIMIT,
        Some(value) if value > EVENTS_LIMIT_MAX => EVENTS_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn load_event(conn: &Connection, id: EventId) -> RepoResult<Option<Event>> {
    let mut stmt = conn.prepare(&format!("{EVENT_SELECT_SQL} WHERE uuid = ?1;"))?;
    stmt.query_row([id.to_string()], |row| Ok(parse_event_row(row)))
        .optional()?
        .transpose()
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "events.uuid")?;

    let status_text: String = row.get("status")?;
    let status = EventStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid event status `{status_text}` in events.status"))
    })?;

    let capacity: i64 = row.get("capacity")?;
    if capacity < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative capacity `{capacity}` in events.capacity"
        )));
    }

    Ok(Event {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        capacity,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
