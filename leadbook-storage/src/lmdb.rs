//! LMDB-backed store.
//!
//! Documents are JSON-encoded under `lead:{id}` / `agent:{id}` keys in a
//! single unnamed database. Every document write runs in its own write
//! transaction, so a bulk write is a batch of independent commits: readers
//! may observe a partially applied batch.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use leadbook_core::{
    Agent, AgentId, EntityType, Lead, LeadId, LeadbookError, LeadbookResult, StorageError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    sample_uniform, AgentDirectory, BulkWriteResult, LeadFilter, LeadStore, LeadUpdate,
    LeadWriteOp,
};

const LEAD_PREFIX: &str = "lead:";
const AGENT_PREFIX: &str = "agent:";

/// Error type for LMDB store operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbStoreError> for StorageError {
    fn from(e: LmdbStoreError) -> Self {
        StorageError::TransactionFailed {
            reason: e.to_string(),
        }
    }
}

impl From<LmdbStoreError> for LeadbookError {
    fn from(e: LmdbStoreError) -> Self {
        LeadbookError::Storage(e.into())
    }
}

fn txn_err(e: heed::Error) -> LmdbStoreError {
    LmdbStoreError::Transaction(e.to_string())
}

fn lead_key(id: LeadId) -> String {
    format!("{}{}", LEAD_PREFIX, id)
}

fn agent_key(id: AgentId) -> String {
    format!("{}{}", AGENT_PREFIX, id)
}

/// Persistent store on an LMDB environment.
pub struct LmdbStore {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl std::fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbStore").finish_non_exhaustive()
    }
}

impl LmdbStore {
    /// Open (or create) a store in `path` with a map of `max_size_mb`.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.as_ref().display(), max_size_mb, "Opened LMDB store");
        Ok(Self { env, db })
    }

    fn read_doc<T: DeserializeOwned>(
        &self,
        rtxn: &RoTxn<'_>,
        key: &str,
    ) -> Result<Option<T>, LmdbStoreError> {
        match self.db.get(rtxn, key.as_bytes()).map_err(txn_err)? {
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| LmdbStoreError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LmdbStoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        self.read_doc(&rtxn, key)
    }

    /// Write one document in its own transaction.
    fn put_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<(), LmdbStoreError> {
        let bytes =
            serde_json::to_vec(doc).map_err(|e| LmdbStoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)
    }

    fn delete_doc(&self, key: &str) -> Result<bool, LmdbStoreError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let existed = self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(existed)
    }

    fn exists(&self, key: &str) -> Result<bool, LmdbStoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        Ok(self.db.get(&rtxn, key.as_bytes()).map_err(txn_err)?.is_some())
    }

    /// Decode every document whose key starts with `prefix`.
    ///
    /// Undecodable documents are skipped with a warning; a scan never fails
    /// because of one corrupt record.
    fn collect_with_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, LmdbStoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let prefix = prefix.as_bytes();
        let mut docs = Vec::new();
        for entry in self.db.iter(&rtxn).map_err(txn_err)? {
            let (key, value) = entry.map_err(txn_err)?;
            if !key.starts_with(prefix) {
                continue;
            }
            match serde_json::from_slice(value) {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    error = %e,
                    "Skipping undecodable document"
                ),
            }
        }
        Ok(docs)
    }

    fn matching_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LmdbStoreError> {
        let mut leads: Vec<Lead> = self
            .collect_with_prefix::<Lead>(LEAD_PREFIX)?
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect();
        leads.sort_by_key(|l| l.id);
        Ok(leads)
    }

    /// Read, modify and write back one lead in a single write transaction.
    fn update_lead_doc(&self, id: LeadId, update: &LeadUpdate) -> LeadbookResult<bool> {
        let key = lead_key(id);
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let Some(bytes) = self.db.get(&wtxn, key.as_bytes()).map_err(txn_err)? else {
            return Ok(false);
        };
        let mut lead: Lead = serde_json::from_slice(bytes)
            .map_err(|e| LmdbStoreError::Deserialization(e.to_string()))?;
        update.apply(&mut lead)?;
        let encoded = serde_json::to_vec(&lead).map_err(|e| StorageError::SerializationFailed {
            entity_type: EntityType::Lead,
            reason: e.to_string(),
        })?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &encoded)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(true)
    }
}

#[async_trait]
impl LeadStore for LmdbStore {
    async fn lead_insert(&self, lead: &Lead) -> LeadbookResult<()> {
        let key = lead_key(lead.id);
        if self.exists(&key)? {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Lead,
                reason: "already exists".to_string(),
            }
            .into());
        }
        self.put_doc(&key, lead)?;
        Ok(())
    }

    async fn lead_get(&self, id: LeadId) -> LeadbookResult<Option<Lead>> {
        Ok(self.get_doc(&lead_key(id))?)
    }

    async fn lead_find(&self, filter: &LeadFilter) -> LeadbookResult<Vec<Lead>> {
        Ok(self.matching_leads(filter)?)
    }

    async fn lead_update_many(
        &self,
        filter: &LeadFilter,
        update: &LeadUpdate,
    ) -> LeadbookResult<usize> {
        let ids: Vec<Uuid> = self.matching_leads(filter)?.into_iter().map(|l| l.id).collect();
        let mut modified = 0;
        for id in ids {
            match self.update_lead_doc(id, update) {
                Ok(true) => modified += 1,
                Ok(false) => {}
                Err(LeadbookError::Storage(StorageError::UpdateFailed { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(modified)
    }

    async fn lead_bulk_write(&self, ops: Vec<LeadWriteOp>) -> LeadbookResult<BulkWriteResult> {
        let mut result = BulkWriteResult::default();
        for op in ops {
            match self.update_lead_doc(op.lead_id, &op.update) {
                Ok(true) => {
                    result.matched += 1;
                    result.modified += 1;
                }
                Ok(false) => result.record_failure(op.lead_id, "lead not found"),
                Err(LeadbookError::Storage(e @ StorageError::UpdateFailed { .. })) => {
                    result.matched += 1;
                    result.record_failure(op.lead_id, e.to_string());
                }
                Err(e) => {
                    tracing::warn!(lead_id = %op.lead_id, error = %e, "Bulk write entry failed");
                    result.record_failure(op.lead_id, e.to_string());
                }
            }
        }
        Ok(result)
    }

    async fn lead_delete(&self, id: LeadId) -> LeadbookResult<bool> {
        Ok(self.delete_doc(&lead_key(id))?)
    }

    async fn lead_count(&self, filter: &LeadFilter) -> LeadbookResult<usize> {
        Ok(self.matching_leads(filter)?.len())
    }

    async fn lead_sample(&self, filter: &LeadFilter, size: usize) -> LeadbookResult<Vec<Lead>> {
        Ok(sample_uniform(self.matching_leads(filter)?, size))
    }
}

#[async_trait]
impl AgentDirectory for LmdbStore {
    async fn agent_insert(&self, agent: &Agent) -> LeadbookResult<()> {
        let key = agent_key(agent.id);
        if self.exists(&key)? {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Agent,
                reason: "already exists".to_string(),
            }
            .into());
        }
        self.put_doc(&key, agent)?;
        Ok(())
    }

    async fn agent_get(&self, id: AgentId) -> LeadbookResult<Option<Agent>> {
        Ok(self.get_doc(&agent_key(id))?)
    }

    async fn agent_list(&self) -> LeadbookResult<Vec<Agent>> {
        let mut agents: Vec<Agent> = self.collect_with_prefix(AGENT_PREFIX)?;
        agents.sort_by_key(|a| a.id);
        Ok(agents)
    }

    async fn agent_set_assigned_count(&self, id: AgentId, count: u64) -> LeadbookResult<()> {
        let key = agent_key(id);
        let mut agent: Agent = self.get_doc(&key)?.ok_or(StorageError::NotFound {
            entity_type: EntityType::Agent,
            id,
        })?;
        agent.assigned_lead_count = count;
        agent.updated_at = Utc::now();
        self.put_doc(&key, &agent)?;
        Ok(())
    }

    async fn agent_delete(&self, id: AgentId) -> LeadbookResult<bool> {
        Ok(self.delete_doc(&agent_key(id))?)
    }
}
