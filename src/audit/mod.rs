//! Decision log
//!
//! Every handled request leaves one record, stamped with a hash of the
//! request it answered so the record can later be checked against it.

use crate::models::{Capability, Language, Request, ResponseStatus};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: Uuid,
    pub request_id: Uuid,
    pub user_id: String,
    pub capability: Capability,
    pub language: Language,
    pub status: ResponseStatus,
    pub request_hash: String,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Decision record storage
pub struct DecisionLog {
    records: Arc<RwLock<HashMap<Uuid, DecisionRecord>>>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a decision record
    pub async fn record(&self, record: DecisionRecord) -> Result<Uuid> {
        let decision_id = record.decision_id;
        let mut records = self.records.write().await;
        records.insert(decision_id, record);
        Ok(decision_id)
    }

    pub async fn get(&self, decision_id: Uuid) -> Result<Option<DecisionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&decision_id).cloned())
    }

    /// All records for a user, oldest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<DecisionRecord>> {
        let records = self.records.read().await;

        let mut items: Vec<_> = records
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();

        items.sort_by_key(|record| record.created_at);

        Ok(items)
    }

    /// True when `request` hashes to what was stored for `decision_id`
    pub async fn verify_integrity(&self, decision_id: Uuid, request: &Request) -> Result<bool> {
        let records = self.records.read().await;

        match records.get(&decision_id) {
            Some(record) => Ok(compute_request_hash(request) == record.request_hash),
            None => Ok(false),
        }
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 of the request's JSON form, hex encoded
pub fn compute_request_hash(request: &Request) -> String {
    let mut hasher = Sha256::new();

    // Stream JSON straight into the hasher
    if serde_json::to_writer(&mut HashWriter(&mut hasher), request).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
