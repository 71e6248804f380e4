//! Lead pipeline status and the substatus table.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Interested,
    SiteVisit,
    Negotiation,
    Closed,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 7] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Interested,
        LeadStatus::SiteVisit,
        LeadStatus::Negotiation,
        LeadStatus::Closed,
        LeadStatus::Lost,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Interested => "interested",
            LeadStatus::SiteVisit => "site_visit",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Closed => "closed",
            LeadStatus::Lost => "lost",
        }
    }

    /// Substatus values permitted for this status.
    pub fn allowed_substatuses(&self) -> &'static [&'static str] {
        match self {
            LeadStatus::New => &["fresh", "re_enquiry"],
            LeadStatus::Contacted => &["call_back", "not_reachable", "switched_off", "wrong_number"],
            LeadStatus::Interested => &["hot", "warm", "cold"],
            LeadStatus::SiteVisit => &["scheduled", "done", "rescheduled", "cancelled"],
            LeadStatus::Negotiation => &["price", "documentation", "loan"],
            LeadStatus::Closed => &["booked", "registered"],
            LeadStatus::Lost => &["budget", "location", "bought_elsewhere", "not_interested"],
        }
    }

    /// Validate an optional substatus against this status.
    pub fn validate_substatus(&self, substatus: Option<&str>) -> Result<(), ValidationError> {
        match substatus {
            None => Ok(()),
            Some(sub) if self.allowed_substatuses().contains(&sub) => Ok(()),
            Some(sub) => Err(ValidationError::ConstraintViolation {
                constraint: "status_substatus".to_string(),
                reason: format!(
                    "substatus '{}' is not allowed for status '{}' (allowed: {})",
                    sub,
                    self.as_str(),
                    self.allowed_substatuses().join(", ")
                ),
            }),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::invalid("status", format!("unknown status '{}'", s)))
    }
}
