//! Command handlers mapping CLI input onto core services.
//!
//! # Responsibility
//! - Open one connection per invocation and inject it into the services.
//! - Print results as JSON and translate core errors into exit codes.

use crate::config::{Command, Config, EventCommand, UpdateFields};
use eventreg_core::db::{open_db, DbError};
use eventreg_core::{
    AdmissionController, AdmissionError, Event, EventListQuery, EventPatch, EventRegistry,
    EventStatus, NewEvent, PhoneRules, RegistrationValidationError, RegistryError, RepoError,
    SqliteEventRepository, SqliteRegistrationRepository,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of one CLI invocation.
#[derive(Debug)]
pub enum CliError {
    Config(String),
    Db(DbError),
    Repo(RepoError),
    Registry(RegistryError),
    Admission(AdmissionError),
    Output(serde_json::Error),
}

impl CliError {
    /// Process exit status: 2 bad input, 3 missing entity, 4 rule conflict,
    /// 1 anything else.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            Self::Config(_) => return 2,
            Self::Registry(err) => err.code(),
            Self::Admission(err) => err.code(),
            Self::Db(_) | Self::Repo(_) | Self::Output(_) => return 1,
        };
        match code {
            "invalid_input" | "validation_failed" => 2,
            "not_found" | "event_not_found" | "registration_not_found" => 3,
            "event_full" | "duplicate_phone" => 4,
            _ => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Admission(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Admission(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<RegistryError> for CliError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<AdmissionError> for CliError {
    fn from(value: AdmissionError) -> Self {
        Self::Admission(value)
    }
}

impl From<RegistrationValidationError> for CliError {
    fn from(value: RegistrationValidationError) -> Self {
        Self::Admission(AdmissionError::ValidationFailed(value))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[derive(Serialize)]
struct Deleted {
    event_id: uuid::Uuid,
    cascaded_registrations: u64,
}

/// Runs one command against the configured database.
pub fn run(config: &Config, command: Command) -> Result<(), CliError> {
    let phone_rules = PhoneRules::new(&config.country_code)?;
    let conn = open_db(&config.db_path)?;
    let event_repo = SqliteEventRepository::try_new(&conn)?;
    let registry = EventRegistry::new(event_repo);
    let admission = AdmissionController::with_phone_rules(
        EventRegistry::new(event_repo),
        SqliteRegistrationRepository::try_new(&conn)?,
        phone_rules,
    );

    match command {
        Command::Event(command) => run_event(&registry, command),
        Command::Register {
            event_id,
            name,
            phone,
        } => print_json(&admission.admit_raw(event_id, &name, &phone)?),
        Command::Registrations { event_id } => print_json(&admission.list_by_event(event_id)?),
        Command::Count { event_id } => print_json(&admission.availability(event_id)?),
        Command::Cancel { event_id, phone } => {
            let phone = cancel_phone(admission.phone_rules(), &phone)?;
            admission.cancel(event_id, &phone)?;
            println!("cancelled");
            Ok(())
        }
        Command::Seed => {
            let events = seed_demo_events(&registry)?;
            info!(
                "event=seed module=cli status=ok events_created={}",
                events.len()
            );
            print_json(&events)
        }
    }
}

fn run_event(
    registry: &EventRegistry<SqliteEventRepository<'_>>,
    command: EventCommand,
) -> Result<(), CliError> {
    match command {
        EventCommand::Create {
            title,
            description,
            capacity,
            status,
        } => {
            let request = NewEvent {
                title,
                description,
                capacity,
                status: status.into(),
            };
            print_json(&registry.create(request)?)
        }
        EventCommand::Get { event_id } => print_json(&registry.get(event_id)?),
        EventCommand::List {
            status,
            limit,
            offset,
        } => {
            let query = EventListQuery {
                status: status.map(EventStatus::from),
                limit,
                offset,
            };
            print_json(&registry.list(&query)?)
        }
        EventCommand::Update { event_id, fields } => {
            let patch = patch_from(fields);
            print_json(&registry.update(event_id, &patch)?)
        }
        EventCommand::Delete { event_id } => {
            let cascaded_registrations = registry.delete(event_id)?;
            print_json(&Deleted {
                event_id,
                cascaded_registrations,
            })
        }
    }
}

fn patch_from(fields: UpdateFields) -> EventPatch {
    EventPatch {
        title: fields.title,
        description: fields.description,
        capacity: fields.capacity,
        status: fields.status.map(EventStatus::from),
    }
}

/// Creates the three demo events used for local trials.
fn seed_demo_events(
    registry: &EventRegistry<SqliteEventRepository<'_>>,
) -> Result<Vec<Event>, CliError> {
    let requests = [
        NewEvent::new("Workshop de TypeScript", 30)
            .with_description("Aprenda TypeScript do zero ao avançado"),
        NewEvent::new("Palestra sobre Docker", 50)
            .with_description("Containerização para iniciantes")
            .with_status(EventStatus::Closed),
        NewEvent::new("Node.js na Prática", 25)
            .with_description("Desenvolvimento backend com Node.js"),
    ];

    let mut created = Vec::with_capacity(requests.len());
    for request in requests {
        created.push(registry.create(request)?);
    }
    Ok(created)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves the phone to cancel by.
///
/// Canonical input is used as-is so registrations stored under another
/// country code stay reachable; masked input goes through `rules`.
fn cancel_phone(rules: &PhoneRules, raw: &str) -> Result<String, RegistrationValidationError> {
    let trimmed = raw.trim();
    let is_canonical_shape = trimmed
        .strip_prefix('+')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
    if is_canonical_shape {
        return Ok(trimmed.to_string());
    }
    rules.normalize(trimmed)
}
