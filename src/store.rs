//! Keyed storage for in-flight grants and created resources.
//!
//! Flows share no mutable state except this store. The contract is a narrow
//! key-value surface (`put`/`get`/`list`) with per-key atomicity; a durable
//! backend can replace the in-memory implementation without touching the
//! orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::types::{Grant, IncomingPayment, OutgoingPayment, PaymentFlow, Quote};

/// A record held by the flow store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FlowRecord {
    Grant(Grant),
    IncomingPayment(IncomingPayment),
    Quote(Quote),
    OutgoingPayment(OutgoingPayment),
    Flow(PaymentFlow),
}

impl FlowRecord {
    pub fn as_grant(&self) -> Option<&Grant> {
        match self {
            FlowRecord::Grant(grant) => Some(grant),
            _ => None,
        }
    }

    pub fn as_incoming_payment(&self) -> Option<&IncomingPayment> {
        match self {
            FlowRecord::IncomingPayment(payment) => Some(payment),
            _ => None,
        }
    }

    pub fn as_outgoing_payment(&self) -> Option<&OutgoingPayment> {
        match self {
            FlowRecord::OutgoingPayment(payment) => Some(payment),
            _ => None,
        }
    }

    pub fn as_flow(&self) -> Option<&PaymentFlow> {
        match self {
            FlowRecord::Flow(flow) => Some(flow),
            _ => None,
        }
    }
}

/// Store key construction, one prefix per record kind.
pub mod keys {
    use uuid::Uuid;

    pub const GRANT_PREFIX: &str = "g_";
    pub const INCOMING_PAYMENT_PREFIX: &str = "ip_";
    pub const QUOTE_PREFIX: &str = "q_";
    pub const OUTGOING_PAYMENT_PREFIX: &str = "op_";
    pub const FLOW_PREFIX: &str = "flow_";

    pub fn grant() -> String {
        format!("{GRANT_PREFIX}{}", Uuid::new_v4().simple())
    }

    pub fn incoming_payment() -> String {
        format!("{INCOMING_PAYMENT_PREFIX}{}", Uuid::new_v4().simple())
    }

    pub fn quote() -> String {
        format!("{QUOTE_PREFIX}{}", Uuid::new_v4().simple())
    }

    pub fn outgoing_payment() -> String {
        format!("{OUTGOING_PAYMENT_PREFIX}{}", Uuid::new_v4().simple())
    }

    pub fn flow() -> String {
        format!("{FLOW_PREFIX}{}", Uuid::new_v4().simple())
    }
}

/// Keyed storage shared by concurrently running flows.
///
/// Implementations must provide per-key atomicity for `put`; no cross-key
/// transactions are required.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn put(&self, key: &str, record: FlowRecord) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<FlowRecord>, StoreError>;
    /// All records whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> Result<Vec<(String, FlowRecord)>, StoreError>;
}

/// A thread-safe in-memory flow store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. Suitable for
/// tests and single-process deployments; lives for the process lifetime.
#[derive(Default, Clone)]
pub struct InMemoryFlowStore {
    records: Arc<RwLock<HashMap<String, FlowRecord>>>,
}

impl InMemoryFlowStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for InMemoryFlowStore {
    async fn put(&self, key: &str, record: FlowRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<FlowRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, FlowRecord)>, StoreError> {
        let records = self.records.read().await;
        let mut matches: Vec<(String, FlowRecord)> = records
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches)
    }
}
