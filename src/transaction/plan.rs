// ============================================================================
// Transaction Write Plans
// ============================================================================
//
// Command Pattern for the write steps of a transaction. Operations are
// plain data applied by the transaction driver, so a plan can be built
// before any session exists and run against whichever session the
// request acquires.
//
// ============================================================================

use crate::core::{Result, WriteOutcome, WriteRecord};
use crate::store::StoreSession;

/// One write step executed inside a transaction.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert `record` into `collection`.
    Insert {
        collection: String,
        record: WriteRecord,
    },
}

impl Operation {
    pub fn insert(collection: impl Into<String>, record: WriteRecord) -> Self {
        Operation::Insert {
            collection: collection.into(),
            record,
        }
    }

    /// The collection this operation writes to.
    pub fn collection(&self) -> &str {
        match self {
            Operation::Insert { collection, .. } => collection,
        }
    }

    pub(crate) async fn apply<S: StoreSession>(self, session: &mut S) -> Result<WriteOutcome> {
        match self {
            Operation::Insert { collection, record } => session.insert(&collection, record).await,
        }
    }
}

type PostCommit = Box<dyn FnOnce() -> std::result::Result<(), String> + Send>;

/// Ordered write operations plus an optional post-commit step.
///
/// Operations run strictly in the order given. Later operations may
/// depend on earlier ones having succeeded, so nothing is reordered or
/// batched.
pub struct TransactionPlan {
    pub(crate) operations: Vec<Operation>,
    pub(crate) post_commit: Option<PostCommit>,
}

impl TransactionPlan {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            post_commit: None,
        }
    }

    /// Append an operation.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Append an insert of `record` into `collection`.
    pub fn insert(self, collection: impl Into<String>, record: WriteRecord) -> Self {
        self.operation(Operation::insert(collection, record))
    }

    /// Attach a step that runs only after a successful commit.
    ///
    /// Models a downstream failure after the write is already durable:
    /// the commit stands, the failure surfaces as its own error kind,
    /// and no abort is attempted.
    pub fn post_commit<F>(mut self, step: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), String> + Send + 'static,
    {
        self.post_commit = Some(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for TransactionPlan {
    fn default() -> Self {
        Self::new()
    }
}
