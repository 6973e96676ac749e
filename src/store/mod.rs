pub mod memory;

pub use memory::{MemorySession, MemoryStore, StoredRecord};

use async_trait::async_trait;

use crate::core::{WriteOutcome, WriteRecord};

/// Connection descriptor for a replicated document store.
///
/// Lists the replica endpoints plus the replica-set identity. Resolved
/// once at process start; the store client owns everything past this
/// boundary.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Replica endpoints, `host:port` each.
    pub endpoints: Vec<String>,

    /// Replica-set identity the endpoints belong to.
    pub replica_set: String,

    /// Logical database name.
    pub database: String,
}

impl StoreConfig {
    pub fn new(replica_set: &str) -> Self {
        Self {
            endpoints: Vec::new(),
            replica_set: replica_set.to_string(),
            database: "quickstart".to_string(),
        }
    }

    /// Add a replica endpoint.
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoints.push(endpoint.to_string());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Parse from a connection string.
    ///
    /// Format: `docstore://host1:port1,host2:port2/?replicaSet=name`
    pub fn from_url(url: &str) -> Result<Self, String> {
        const SCHEME: &str = "docstore://";

        if !url.starts_with(SCHEME) {
            return Err(format!("URL must start with '{}'", SCHEME));
        }

        let url = &url[SCHEME.len()..];
        let (hosts, query) = match url.split_once("/?") {
            Some((hosts, query)) => (hosts, Some(query)),
            None => (url.trim_end_matches('/'), None),
        };

        let replica_set = query
            .and_then(|query| {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("replicaSet="))
            })
            .ok_or_else(|| "URL must name a replica set via '?replicaSet='".to_string())?;

        if replica_set.is_empty() {
            return Err("Replica set name cannot be empty".to_string());
        }

        let mut config = Self::new(replica_set);
        for host in hosts.split(',') {
            if host.is_empty() {
                return Err("Empty replica endpoint".to_string());
            }
            config = config.endpoint(host);
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoints.is_empty() {
            return Err("At least one replica endpoint is required".to_string());
        }

        if self.replica_set.is_empty() {
            return Err("Replica set name cannot be empty".to_string());
        }

        if self.database.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// How many replica-set members must acknowledge a write before the
/// commit counts as durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDurability {
    /// A majority of replica-set members acknowledge.
    #[default]
    Majority,

    /// A fixed number of members acknowledge.
    Acknowledged(u32),
}

/// The consistency snapshot a transaction reads against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadIsolation {
    /// Reads see a majority-committed snapshot taken at transaction start.
    #[default]
    Snapshot,

    /// Reads see the latest node-local data.
    Local,
}

/// Durability and isolation requirements for one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionOptions {
    pub durability: WriteDurability,
    pub isolation: ReadIsolation,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn isolation(mut self, isolation: ReadIsolation) -> Self {
        self.isolation = isolation;
        self
    }
}

/// A replicated document store reachable through logical sessions.
///
/// The store client may be shared across requests; the sessions it hands
/// out may not.
#[async_trait]
pub trait DocumentStore: Send + Sync + Sized {
    type Session: StoreSession;

    /// Establish connectivity to the store described by `config`.
    ///
    /// Connectivity failures surface as [`TxnError::Connection`],
    /// distinct from any transaction-level error.
    ///
    /// [`TxnError::Connection`]: crate::core::TxnError::Connection
    async fn connect(config: StoreConfig) -> crate::core::Result<Self>;

    /// Open a fresh logical session scoped to one request.
    async fn start_session(&self) -> crate::core::Result<Self::Session>;
}

/// A logical session: a stateful connection context hosting at most one
/// active transaction at a time.
///
/// Sessions are exclusively owned by one in-flight request; the `&mut`
/// receivers make sharing one across concurrent transactions a compile
/// error.
#[async_trait]
pub trait StoreSession: Send {
    /// Begin a transaction with the given durability and isolation.
    async fn begin(&mut self, options: TransactionOptions) -> crate::core::Result<()>;

    /// Insert one record within the active transaction.
    async fn insert(
        &mut self,
        collection: &str,
        record: WriteRecord,
    ) -> crate::core::Result<WriteOutcome>;

    /// Make the transaction's writes durable.
    async fn commit(&mut self) -> crate::core::Result<()>;

    /// Discard the transaction's writes.
    async fn abort(&mut self) -> crate::core::Result<()>;

    /// Release the session. Idempotent; an open transaction is discarded.
    async fn end(&mut self) -> crate::core::Result<()>;
}
