use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreConfig, StoreSession, TransactionOptions};
use crate::core::{RecordId, Result, TxnError, WriteOutcome, WriteRecord};

/// A committed record: the document plus its store-assigned identifier.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: WriteRecord,
}

/// In-process document store with session-scoped transactions.
///
/// Writes are staged per session and become visible to other sessions
/// only when the transaction commits. Stands in for the replicated
/// store behind the same trait the coordinator is written against.
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<StoredRecord>>>>,
    config: StoreConfig,
}

impl MemoryStore {
    /// Number of committed records in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, Vec::len)
    }

    /// Committed records in `collection`, in insertion order.
    pub async fn find_all(&self, collection: &str) -> Vec<StoredRecord> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Session = MemorySession;

    async fn connect(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(TxnError::Connection)?;

        tracing::debug!(
            replica_set = %config.replica_set,
            endpoints = config.endpoints.len(),
            "connected to document store"
        );

        Ok(Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            config,
        })
    }

    async fn start_session(&self) -> Result<MemorySession> {
        Ok(MemorySession {
            collections: Arc::clone(&self.collections),
            active: None,
            ended: false,
        })
    }
}

/// Staged state of one active transaction.
struct StagedTxn {
    options: TransactionOptions,
    pending: Vec<(String, StoredRecord)>,
}

/// One logical session against a [`MemoryStore`].
pub struct MemorySession {
    collections: Arc<RwLock<HashMap<String, Vec<StoredRecord>>>>,
    active: Option<StagedTxn>,
    ended: bool,
}

impl MemorySession {
    fn check_open(&self) -> Result<()> {
        if self.ended {
            return Err(TxnError::Operation("session has been released".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn begin(&mut self, options: TransactionOptions) -> Result<()> {
        if self.ended {
            return Err(TxnError::TransactionBegin("session has been released".into()));
        }

        if self.active.is_some() {
            return Err(TxnError::TransactionBegin(
                "transaction already active on this session".into(),
            ));
        }

        self.active = Some(StagedTxn {
            options,
            pending: Vec::new(),
        });

        Ok(())
    }

    async fn insert(&mut self, collection: &str, record: WriteRecord) -> Result<WriteOutcome> {
        self.check_open()?;

        let staged = self
            .active
            .as_mut()
            .ok_or_else(|| TxnError::Operation("no active transaction".into()))?;

        let id = RecordId::new();
        staged
            .pending
            .push((collection.to_string(), StoredRecord { id, record }));

        Ok(WriteOutcome { id })
    }

    async fn commit(&mut self) -> Result<()> {
        if self.ended {
            return Err(TxnError::Commit("session has been released".into()));
        }

        let staged = self
            .active
            .take()
            .ok_or_else(|| TxnError::Commit("no active transaction".into()))?;

        let mut collections = self.collections.write().await;
        let applied = staged.pending.len();
        for (collection, stored) in staged.pending {
            collections.entry(collection).or_default().push(stored);
        }

        tracing::debug!(
            records = applied,
            durability = ?staged.options.durability,
            "transaction committed"
        );

        Ok(())
    }

    async fn abort(&mut self) -> Result<()> {
        self.check_open()?;

        match self.active.take() {
            Some(staged) => {
                tracing::debug!(discarded = staged.pending.len(), "transaction aborted");
                Ok(())
            }
            None => Err(TxnError::Operation("no active transaction to abort".into())),
        }
    }

    async fn end(&mut self) -> Result<()> {
        if let Some(staged) = self.active.take() {
            // Open transaction at release time: discard, matching driver
            // behavior for a session that dies mid-transaction.
            tracing::debug!(
                discarded = staged.pending.len(),
                "session released with open transaction"
            );
        }
        self.ended = true;
        Ok(())
    }
}
