// ============================================================================
// doctxn Library
// ============================================================================
//
// Transactional write coordinator for replicated document stores: a
// session manager with guaranteed release, and a transaction
// coordinator that resolves every transaction to exactly one terminal
// state (committed, or aborted with the cause surfaced).
//
// ============================================================================

pub mod core;
pub mod session;
pub mod store;
pub mod transaction;
pub mod web;

// Re-export main types for convenience
pub use core::{RecordId, Result, TxnError, WriteOutcome, WriteRecord};
pub use session::{SessionGuard, SessionManager};
pub use store::{
    DocumentStore, MemorySession, MemoryStore, ReadIsolation, StoreConfig, StoreSession,
    TransactionOptions, WriteDurability,
};
pub use transaction::{run_transaction, Operation, TransactionPlan, Txn, TxnState};
