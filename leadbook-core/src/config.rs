//! Configuration types

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Limits applied by the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignmentConfig {
    /// Largest `count` accepted by random assignment.
    pub max_random_count: usize,
    /// Largest number of lead ids accepted by a specific assignment.
    pub max_specific_batch: usize,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            max_random_count: 1000,
            max_specific_batch: 5000,
        }
    }
}

impl AssignmentConfig {
    /// Validate that all limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_random_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_random_count".to_string(),
                value: self.max_random_count.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.max_specific_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_specific_batch".to_string(),
                value: self.max_specific_batch.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AssignmentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = AssignmentConfig {
            max_random_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "max_random_count"
        ));
    }
}
