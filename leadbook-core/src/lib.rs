//! Leadbook Core - Entity Types
//!
//! Lead and agent records, the assignment history model, the status table,
//! configuration and the error taxonomy. All other crates depend on this.
//! This crate contains no storage or engine logic.

pub mod agent;
pub mod config;
pub mod error;
pub mod identity;
pub mod lead;
pub mod status;

pub use agent::{Agent, AgentRole};
pub use config::AssignmentConfig;
pub use error::{
    AssignmentError, ConfigError, LeadbookError, LeadbookResult, StorageError, ValidationError,
};
pub use identity::{new_entity_id, AgentId, EntityId, EntityType, LeadId, Timestamp};
pub use lead::{validate_phone, AssignmentHistoryEntry, Inconsistency, Lead, PHONE_DIGITS};
pub use status::LeadStatus;
