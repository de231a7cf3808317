//! Races between admissions that each own a connection to one database file.

use eventreg_core::db::open_db;
use eventreg_core::{
    AdmissionController, AdmissionError, EventId, EventRegistry, NewEvent, Registration,
    SqliteEventRepository, SqliteRegistrationRepository,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Barrier;

fn create_event(path: &Path, capacity: i64) -> EventId {
    let conn = open_db(path).unwrap();
    let registry = EventRegistry::new(SqliteEventRepository::try_new(&conn).unwrap());
    registry.create(NewEvent::new("Race", capacity)).unwrap().id
}

fn admit_on_fresh_connection(
    path: &Path,
    barrier: &Barrier,
    event_id: EventId,
    name: &str,
    phone: &str,
) -> Result<Registration, AdmissionError> {
    let conn = open_db(path).unwrap();
    let admission = AdmissionController::new(
        EventRegistry::new(SqliteEventRepository::try_new(&conn).unwrap()),
        SqliteRegistrationRepository::try_new(&conn).unwrap(),
    );
    barrier.wait();
    admission.admit(event_id, name, phone)
}

fn count(path: &Path, event_id: EventId) -> i64 {
    let conn = open_db(path).unwrap();
    let admission = AdmissionController::new(
        EventRegistry::new(SqliteEventRepository::try_new(&conn).unwrap()),
        SqliteRegistrationRepository::try_new(&conn).unwrap(),
    );
    admission.count(event_id).unwrap()
}

#[test]
fn last_slot_race_admits_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let event_id = create_event(&path, 1);
    let barrier = Barrier::new(2);

    let (alice, bob) = std::thread::scope(|scope| {
        let alice = scope.spawn(|| {
            admit_on_fresh_connection(&path, &barrier, event_id, "Alice", "+5511111111111")
        });
        let bob = scope.spawn(|| {
            admit_on_fresh_connection(&path, &barrier, event_id, "Bob", "+5511222222222")
        });
        (alice.join().unwrap(), bob.join().unwrap())
    });

    let outcomes = [alice, bob];
    let admitted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let full = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(AdmissionError::EventFull { .. })))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(full, 1);
    assert_eq!(count(&path, event_id), 1);
}

#[test]
fn same_phone_race_admits_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.db");
    let event_id = create_event(&path, 10);
    let barrier = Barrier::new(2);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["Carol", "Carol again"]
            .into_iter()
            .map(|name| {
                let path = &path;
                let barrier = &barrier;
                scope.spawn(move || {
                    admit_on_fresh_connection(path, barrier, event_id, name, "+5511333333333")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(AdmissionError::DuplicatePhone { .. })))
            .count(),
        1
    );
    assert_eq!(count(&path, event_id), 1);
}

#[test]
fn many_concurrent_admissions_never_exceed_capacity_or_duplicate() {
    const CAPACITY: i64 = 5;
    const ATTEMPTS: usize = 16;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crowd.db");
    let event_id = create_event(&path, CAPACITY);
    let barrier = Barrier::new(ATTEMPTS);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|idx| {
                let path = &path;
                let barrier = &barrier;
                // Pairs of attempts share a phone.
                let phone = format!("+55119{:08}", idx / 2);
                scope.spawn(move || {
                    admit_on_fresh_connection(path, barrier, event_id, "Guest", &phone)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let admitted: Vec<&Registration> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().ok())
        .collect();
    assert_eq!(admitted.len() as i64, CAPACITY);

    let phones: HashSet<&str> = admitted
        .iter()
        .map(|registration| registration.phone.as_str())
        .collect();
    assert_eq!(phones.len(), admitted.len());

    for outcome in &outcomes {
        match outcome {
            Ok(_)
            | Err(AdmissionError::EventFull { .. })
            | Err(AdmissionError::DuplicatePhone { .. }) => {}
            Err(other) => panic!("unexpected admission error: {other}"),
        }
    }
    assert_eq!(count(&path, event_id), CAPACITY);
}

#[test]
fn admissions_for_different_events_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("independent.db");
    let first = create_event(&path, 1);
    let second = create_event(&path, 1);
    let barrier = Barrier::new(2);

    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| {
            admit_on_fresh_connection(&path, &barrier, first, "Alice", "+5511111111111")
        });
        let b = scope.spawn(|| {
            admit_on_fresh_connection(&path, &barrier, second, "Bob", "+5511111111111")
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    assert!(a.is_ok());
    assert!(b.is_ok());
}
