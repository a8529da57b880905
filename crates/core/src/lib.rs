//! # Census Core
//!
//! Core logic for the ward census system.
//!
//! This crate owns the census data model and everything that operates on it:
//! - the canonical encoded-line grammar (`codec`)
//! - record-level access to the census sheet (`store`) over pluggable backends (`sheet`)
//! - free-text search (`query`) and the two census reports (`report`)
//! - per-operator conversation flows (`conversation`)
//!
//! **No transport concerns**: HTTP servers and command-line parsing belong in `api-rest` and
//! `cli`.

pub mod codec;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod query;
pub mod record;
pub mod report;
pub mod sheet;
pub mod store;

pub use config::{CensusConfig, DerivedColumns};
pub use conversation::{Command, ConversationService, Inbound, OperatorId, Reply};
pub use error::{CensusError, CensusResult};
pub use record::{Disposition, PatientRecord, SpecialTag};
pub use store::{CensusStore, NewRecord};
