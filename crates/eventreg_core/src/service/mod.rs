//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into registry and admission APIs.
//! - Keep CLI/transport layers decoupled from storage details.

pub mod admission;
pub mod event_registry;
