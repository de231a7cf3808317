//! Registration repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the atomic "insert if admissible" primitive for one event.
//! - Provide count/list/cancel access to an event's registration set.
//!
//! # Invariants
//! - Capacity and duplicate checks and the insert run in one IMMEDIATE
//!   transaction; no other writer can interleave between them.
//! - `UNIQUE(event_uuid, phone)` backs the duplicate check at storage level.
//! - Event rows are only read here, never written.
//! - The IMMEDIATE transaction takes SQLite's database-wide writer lock, so
//!   admissions for different events are independent only up to that lock.

use crate::model::event::EventId;
use crate::model::registration::Registration;
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use crate::repo::RepoResult;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const REGISTRATION_COLUMNS: &[&str] = &["uuid", "event_uuid", "name", "phone", "created_at"];
const EVENT_CAPACITY_COLUMNS: &[&str] = &["uuid", "capacity"];

/// Result of one conditional insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row committed; carries the stored record.
    Inserted(Registration),
    /// Owning event does not exist (anymore).
    EventMissing,
    /// Registration count already reached capacity.
    Full { capacity: i64, registered: i64 },
    /// Phone already registered for this event.
    DuplicatePhone,
}

/// Repository interface for registrations.
pub trait RegistrationRepository {
    /// Inserts `registration` only if its event has room and the phone is
    /// unused for that event, as one atomic step.
    fn insert_if_admissible(&self, registration: &Registration) -> RepoResult<InsertOutcome>;
    /// Counts registrations for one event.
    fn count_for_event(&self, event_id: EventId) -> RepoResult<i64>;
    /// Lists registrations sorted by `name ASC`, then insertion order.
    fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Registration>>;
    /// Deletes the registration for (`event_id`, `phone`).
    ///
    /// Returns `false` when no such registration exists.
    fn delete_by_event_and_phone(&self, event_id: EventId, phone: &str) -> RepoResult<bool>;
}

/// SQLite-backed registration repository.
#[derive(Clone, Copy)]
pub struct SqliteRegistrationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistrationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("events", EVENT_CAPACITY_COLUMNS),
                ("registrations", REGISTRATION_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl RegistrationRepository for SqliteRegistrationRepository<'_> {
    fn insert_if_admissible(&self, registration: &Registration) -> RepoResult<InsertOutcome> {
        let event_uuid = registration.event_id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let capacity: Option<i64> = tx
            .query_row(
                "SELECT capacity FROM events WHERE uuid = ?1;",
                [event_uuid.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(capacity) = capacity else {
            return Ok(InsertOutcome::EventMissing);
        };

        let registered = count_in(&tx, event_uuid.as_str())?;
        if registered >= capacity {
            return Ok(InsertOutcome::Full {
                capacity,
                registered,
            });
        }

        let duplicate: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM registrations
                WHERE event_uuid = ?1 AND phone = ?2
            );",
            params![event_uuid.as_str(), registration.phone.as_str()],
            |row| row.get(0),
        )?;
        if duplicate == 1 {
            return Ok(InsertOutcome::DuplicatePhone);
        }

        let inserted = tx.query_row(
            "INSERT INTO registrations (uuid, event_uuid, name, phone)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING created_at;",
            params![
                registration.id.to_string(),
                event_uuid.as_str(),
                registration.name.as_str(),
                registration.phone.as_str(),
            ],
            |row| row.get::<_, i64>(0),
        );
        let created_at = match inserted {
            Ok(created_at) => created_at,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Ok(InsertOutcome::DuplicatePhone);
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                return Ok(InsertOutcome::EventMissing);
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit()?;

        Ok(InsertOutcome::Inserted(Registration {
            created_at,
            ..registration.clone()
        }))
    }

    fn count_for_event(&self, event_id: EventId) -> RepoResult<i64> {
        count_in(self.conn, event_id.to_string().as_str())
    }

    fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Registration>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                event_uuid,
                name,
                phone,
                created_at
             FROM registrations
             WHERE event_uuid = ?1
             ORDER BY name ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([event_id.to_string()])?;
        let mut registrations = Vec::new();
        while let Some(row) = rows.next()? {
            registrations.push(parse_registration_row(row)?);
        }
        Ok(registrations)
    }

    fn delete_by_event_and_phone(&self, event_id: EventId, phone: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM registrations WHERE event_uuid = ?1 AND phone = ?2;",
            params![event_id.to_string(), phone],
        )?;
        Ok(changed > 0)
    }
}

fn count_in(conn: &Connection, event_uuid: &str) -> RepoResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM registrations WHERE event_uuid = ?1;",
        [event_uuid],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_registration_row(row: &Row<'_>) -> RepoResult<Registration> {
    let uuid_text: String = row.get("uuid")?;
    let event_text: String = row.get("event_uuid")?;
    Ok(Registration {
        id: parse_uuid(&uuid_text, "registrations.uuid")?,
        event_id: parse_uuid(&event_text, "registrations.event_uuid")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}
