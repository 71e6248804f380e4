//! Consistency auditing.
//!
//! Two defect classes are tracked:
//! - phone duplicates: one agent currently holds several leads with the same
//!   exact phone string (history and formatting variants are not considered)
//! - inconsistent records: `is_assigned` disagrees with `assigned_to`
//!
//! Leads whose history lists the same agent more than once are reported as
//! repeated history. History is append-only, so they are not repaired.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use leadbook_core::{
    Agent, AgentId, Lead, LeadbookResult, ValidationError,
};
use leadbook_storage::{
    AgentDirectory, AssignedToFilter, LeadFilter, LeadStore, LeadUpdate, LeadWriteOp,
};
use serde::{Deserialize, Serialize};

use crate::outcome::{
    AgentDuplicateReport, DetectReport, DetectSummary, InconsistentLead, LeadRef,
    PhoneDuplicateGroup, RepairOutcome, RepeatedHistory, UnassignedLead,
};
use crate::unassign::release_op;
use crate::{plural, LeadEngine};

/// Which defect class a repair targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum FixType {
    PhoneDuplicates,
    InconsistentData,
    All,
}

impl FixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixType::PhoneDuplicates => "phone-duplicates",
            FixType::InconsistentData => "inconsistent-data",
            FixType::All => "all",
        }
    }

    fn includes_phone_duplicates(&self) -> bool {
        matches!(self, FixType::PhoneDuplicates | FixType::All)
    }

    fn includes_inconsistent_data(&self) -> bool {
        matches!(self, FixType::InconsistentData | FixType::All)
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "phone-duplicates" => Ok(FixType::PhoneDuplicates),
            "inconsistent-data" => Ok(FixType::InconsistentData),
            "all" => Ok(FixType::All),
            _ => Err(ValidationError::invalid(
                "fixType",
                format!(
                    "'{}' is not one of phone-duplicates, inconsistent-data, all",
                    s
                ),
            )),
        }
    }
}

/// Group held leads by exact phone; only groups of two or more are returned.
///
/// Each group is ordered keeper-first: latest `assigned_at`, ties broken by
/// the larger id.
fn phone_duplicate_groups(held: &[Lead]) -> Vec<(String, Vec<&Lead>)> {
    let mut by_phone: BTreeMap<&str, Vec<&Lead>> = BTreeMap::new();
    for lead in held {
        by_phone.entry(lead.phone.as_str()).or_default().push(lead);
    }
    by_phone
        .into_iter()
        .filter(|(_, leads)| leads.len() > 1)
        .map(|(phone, mut leads)| {
            leads.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at).then(b.id.cmp(&a.id)));
            (phone.to_string(), leads)
        })
        .collect()
}

impl LeadEngine {
    /// Assignable agents, or just the one named.
    async fn audit_scope(&self, agent_id: Option<AgentId>) -> LeadbookResult<Vec<Agent>> {
        match agent_id {
            Some(id) => Ok(vec![self.resolve_agent(id).await?]),
            None => Ok(self
                .store
                .agent_list()
                .await?
                .into_iter()
                .filter(Agent::is_assignable)
                .collect()),
        }
    }

    async fn find_inconsistent(&self) -> LeadbookResult<Vec<Lead>> {
        let mut leads = self
            .store
            .lead_find(
                &LeadFilter::new()
                    .is_assigned(true)
                    .assigned_to(AssignedToFilter::IsNull),
            )
            .await?;
        leads.extend(
            self.store
                .lead_find(
                    &LeadFilter::new()
                        .is_assigned(false)
                        .assigned_to(AssignedToFilter::NotNull),
                )
                .await?,
        );
        Ok(leads)
    }

    /// Read-only scan for phone duplicates, repeated history and
    /// flag/reference mismatches.
    #[tracing::instrument(skip(self))]
    pub async fn detect_duplicates(&self) -> LeadbookResult<DetectReport> {
        let agents = self.audit_scope(None).await?;
        let mut summary = DetectSummary {
            agents_checked: agents.len(),
            ..Default::default()
        };
        let mut duplicate_report = Vec::new();
        let all_leads = self.store.lead_find(&LeadFilter::new()).await?;

        for agent in &agents {
            let held = self
                .store
                .lead_find(&LeadFilter::new().held_by(agent.id))
                .await?;

            let phone_duplicates: Vec<PhoneDuplicateGroup> = phone_duplicate_groups(&held)
                .into_iter()
                .map(|(phone, leads)| PhoneDuplicateGroup {
                    phone,
                    count: leads.len(),
                    leads: leads.into_iter().map(LeadRef::from).collect(),
                })
                .collect();

            // Any lead in the store, held or not.
            let repeated_history: Vec<RepeatedHistory> = all_leads
                .iter()
                .filter_map(|lead| {
                    let history_count = lead.history_count_for(agent.id);
                    (history_count > 1).then(|| RepeatedHistory {
                        lead_id: lead.id,
                        name: lead.name.clone(),
                        phone: lead.phone.clone(),
                        history_count,
                    })
                })
                .collect();

            if phone_duplicates.is_empty() && repeated_history.is_empty() {
                continue;
            }
            summary.agents_with_issues += 1;
            summary.total_duplicates_found +=
                phone_duplicates.iter().map(|g| g.count - 1).sum::<usize>();
            summary.repeated_history_found += repeated_history.len();
            duplicate_report.push(AgentDuplicateReport {
                agent_id: agent.id,
                agent_name: agent.name.clone(),
                assigned_lead_count: held.len(),
                phone_duplicates,
                repeated_history,
            });
        }

        let inconsistent_leads: Vec<InconsistentLead> = self
            .find_inconsistent()
            .await?
            .iter()
            .filter_map(|lead| {
                lead.inconsistency().map(|kind| InconsistentLead {
                    lead_id: lead.id,
                    name: lead.name.clone(),
                    phone: lead.phone.clone(),
                    is_assigned: lead.is_assigned,
                    assigned_to: lead.assigned_to,
                    kind,
                    reason: kind.reason().to_string(),
                })
            })
            .collect();
        summary.inconsistent_leads_found = inconsistent_leads.len();

        let message = if summary.total_duplicates_found == 0
            && summary.repeated_history_found == 0
            && summary.inconsistent_leads_found == 0
        {
            format!(
                "No duplicates or inconsistencies found across {}",
                plural(summary.agents_checked, "agent")
            )
        } else {
            format!(
                "Found {} across {}, {} with repeated history and {}",
                plural(summary.total_duplicates_found, "duplicate lead"),
                plural(summary.agents_with_issues, "agent"),
                plural(summary.repeated_history_found, "lead"),
                plural(summary.inconsistent_leads_found, "inconsistent lead")
            )
        };

        tracing::info!(
            agents_checked = summary.agents_checked,
            agents_with_issues = summary.agents_with_issues,
            duplicates = summary.total_duplicates_found,
            repeated_history = summary.repeated_history_found,
            inconsistent = summary.inconsistent_leads_found,
            "Duplicate detection complete"
        );

        Ok(DetectReport {
            summary,
            duplicate_report,
            inconsistent_leads,
            message,
        })
    }

    /// Repair the selected defect class.
    ///
    /// `agent_id` narrows phone-duplicate repair to one agent; the
    /// inconsistent-data pass is always global.
    #[tracing::instrument(skip(self))]
    pub async fn repair_duplicates(
        &self,
        fix_type: FixType,
        agent_id: Option<AgentId>,
    ) -> LeadbookResult<RepairOutcome> {
        let mut outcome = RepairOutcome {
            fix_type,
            phone_duplicates_fixed: 0,
            inconsistent_data_fixed: 0,
            leads_unassigned: Vec::new(),
            errors: Vec::new(),
            message: String::new(),
        };

        if fix_type.includes_phone_duplicates() {
            self.repair_phone_duplicates(agent_id, &mut outcome).await?;
        } else if let Some(id) = agent_id {
            self.resolve_agent(id).await?;
        }
        if fix_type.includes_inconsistent_data() {
            outcome.inconsistent_data_fixed = self.repair_inconsistent_data().await?;
        }

        let mut message = format!(
            "Repair ({}) complete: {} unassigned as phone duplicates, {} corrected",
            fix_type,
            plural(outcome.phone_duplicates_fixed, "lead"),
            plural(outcome.inconsistent_data_fixed, "inconsistent lead")
        );
        if !outcome.errors.is_empty() {
            message.push_str(&format!(" ({} failed)", plural(outcome.errors.len(), "lead")));
        }
        outcome.message = message;

        tracing::info!(
            fix_type = %fix_type,
            phone_duplicates_fixed = outcome.phone_duplicates_fixed,
            inconsistent_data_fixed = outcome.inconsistent_data_fixed,
            failed = outcome.errors.len(),
            "Repair complete"
        );
        Ok(outcome)
    }

    async fn repair_phone_duplicates(
        &self,
        agent_id: Option<AgentId>,
        outcome: &mut RepairOutcome,
    ) -> LeadbookResult<()> {
        let now = Utc::now();
        for agent in self.audit_scope(agent_id).await? {
            let held = self
                .store
                .lead_find(&LeadFilter::new().held_by(agent.id))
                .await?;
            let groups = phone_duplicate_groups(&held);
            if groups.is_empty() {
                continue;
            }

            let mut ops: Vec<LeadWriteOp> = Vec::new();
            let mut released: Vec<UnassignedLead> = Vec::new();
            for (_, leads) in &groups {
                let keeper = leads[0].id;
                for lead in &leads[1..] {
                    let (op, closed) = release_op(lead, agent.id, now);
                    if !closed {
                        tracing::warn!(lead_id = %lead.id, agent_id = %agent.id, "No open history entry for duplicate lead");
                    }
                    ops.push(op);
                    released.push(UnassignedLead {
                        lead_id: lead.id,
                        name: lead.name.clone(),
                        phone: lead.phone.clone(),
                        agent_id: agent.id,
                        agent_name: agent.name.clone(),
                        kept_lead_id: keeper,
                    });
                }
            }

            let result = self.store.lead_bulk_write(ops).await?;
            released.retain(|r| !result.failures.iter().any(|f| f.lead_id == r.lead_id));
            outcome.phone_duplicates_fixed += released.len();
            outcome.leads_unassigned.extend(released);
            outcome.errors.extend(result.failures);

            self.refresh_assigned_count(agent.id).await?;
        }
        Ok(())
    }

    /// Two filtered bulk updates, one per mismatch pattern.
    async fn repair_inconsistent_data(&self) -> LeadbookResult<usize> {
        let flag_without_agent = self
            .store
            .lead_update_many(
                &LeadFilter::new()
                    .is_assigned(true)
                    .assigned_to(AssignedToFilter::IsNull),
                &LeadUpdate::mark_unassigned(),
            )
            .await?;
        let agent_without_flag = self
            .store
            .lead_update_many(
                &LeadFilter::new()
                    .is_assigned(false)
                    .assigned_to(AssignedToFilter::NotNull),
                &LeadUpdate::clear_references(),
            )
            .await?;
        tracing::debug!(flag_without_agent, agent_without_flag, "Corrected inconsistent leads");
        Ok(flag_without_agent + agent_without_flag)
    }
}
