// ============================================================================
// Transaction Coordination Module
// ============================================================================
//
// Wraps a session-based, multi-statement transaction with explicit
// commit/abort resolution and majority-acknowledged durability.
//
// Design Patterns Used:
// - State Pattern: transaction lifecycle (NotStarted through terminal)
// - Command Pattern: write operations as replayable plan data
//
// ============================================================================

pub mod coordinator;
pub mod plan;
pub mod state;

pub use coordinator::run_transaction;
pub use plan::{Operation, TransactionPlan};
pub use state::{Txn, TxnState};
