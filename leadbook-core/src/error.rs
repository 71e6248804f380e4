//! Error types for Leadbook operations

use crate::{AgentId, EntityType};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Serialization failed for {entity_type:?}: {reason}")]
    SerializationFailed { entity_type: EntityType, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors. Always raised before any store mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Assignment business-rule failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: AgentId },

    #[error(
        "All {requested} selected leads have already been assigned to this agent before ({already_seen} previously seen)"
    )]
    NoQualifyingLeads {
        agent_id: AgentId,
        requested: usize,
        already_seen: usize,
    },

    #[error("No unassigned leads available that this agent has not already seen")]
    NoCandidates { agent_id: AgentId },

    #[error("Agent {agent_id} has no assigned leads to unassign")]
    NothingToUnassign { agent_id: AgentId },

    #[error("Agent {agent_id} still has {count} assigned leads")]
    AgentHasAssignments { agent_id: AgentId, count: u64 },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Leadbook errors.
#[derive(Debug, Clone, Error)]
pub enum LeadbookError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Leadbook operations.
pub type LeadbookResult<T> = Result<T, LeadbookError>;

impl ValidationError {
    /// Shorthand for an [`ValidationError::InvalidValue`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Lead,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Lead"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_no_qualifying_leads_display() {
        let err = AssignmentError::NoQualifyingLeads {
            agent_id: Uuid::nil(),
            requested: 3,
            already_seen: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("already been assigned to this agent"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_no_candidates_is_distinct_from_no_qualifying() {
        let none = AssignmentError::NoCandidates { agent_id: Uuid::nil() };
        let seen = AssignmentError::NoQualifyingLeads {
            agent_id: Uuid::nil(),
            requested: 1,
            already_seen: 1,
        };
        assert_ne!(none.to_string(), seen.to_string());
    }

    #[test]
    fn test_leadbook_error_from_variants() {
        let storage = LeadbookError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, LeadbookError::Storage(_)));

        let validation = LeadbookError::from(ValidationError::RequiredFieldMissing {
            field: "leadIds".to_string(),
        });
        assert!(matches!(validation, LeadbookError::Validation(_)));

        let assignment = LeadbookError::from(AssignmentError::AgentNotFound {
            agent_id: Uuid::nil(),
        });
        assert!(matches!(assignment, LeadbookError::Assignment(_)));

        let config = LeadbookError::from(ConfigError::MissingRequired {
            field: "lmdb_path".to_string(),
        });
        assert!(matches!(config, LeadbookError::Config(_)));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "max_random_count".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("max_random_count"));
        assert!(msg.contains("must be positive"));
    }
}
