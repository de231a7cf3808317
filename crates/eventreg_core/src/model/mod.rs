//! Domain model for events and their registrations.
//!
//! # Responsibility
//! - Define canonical data structures used by registry and admission logic.
//! - Own field-level validation rules shared by create/update/admit paths.
//!
//! # Invariants
//! - Every event and registration is identified by a stable UUID.
//! - A registration never outlives its owning event.

pub mod event;
pub mod registration;
