// ============================================================================
// Transaction State Management
// ============================================================================
//
// State Pattern for the transaction lifecycle. A transaction moves from
// NotStarted through Active into exactly one terminal state; the driver
// below validates every transition before touching the store.
//
// ============================================================================

use crate::core::{Result, TxnError, WriteOutcome};
use crate::store::{StoreSession, TransactionOptions};

use super::Operation;

/// Transaction lifecycle states.
///
/// ```text
/// NotStarted --begin--> Active --(all ops ok)--> Committing --ok--> Committed
///                                                          \--fail--> CommitFailed
/// Active --(op fails)--> Aborting --ok--> Aborted
///                                  \--fail--> AbortFailed
/// ```
///
/// Committed, CommitFailed, Aborted and AbortFailed are terminal. An
/// abort attempted on a committed transaction is rejected and leaves
/// the terminal state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    NotStarted,
    Active,
    Committing,
    Committed,
    CommitFailed,
    Aborting,
    Aborted,
    AbortFailed,
}

impl TxnState {
    /// Check if the transaction can execute operations.
    pub fn is_active(&self) -> bool {
        matches!(self, TxnState::Active)
    }

    /// Check if the transaction has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxnState::Committed
                | TxnState::CommitFailed
                | TxnState::Aborted
                | TxnState::AbortFailed
        )
    }
}

impl std::fmt::Display for TxnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnState::NotStarted => write!(f, "NOT_STARTED"),
            TxnState::Active => write!(f, "ACTIVE"),
            TxnState::Committing => write!(f, "COMMITTING"),
            TxnState::Committed => write!(f, "COMMITTED"),
            TxnState::CommitFailed => write!(f, "COMMIT_FAILED"),
            TxnState::Aborting => write!(f, "ABORTING"),
            TxnState::Aborted => write!(f, "ABORTED"),
            TxnState::AbortFailed => write!(f, "ABORT_FAILED"),
        }
    }
}

/// Drives one transaction on an exclusively borrowed session.
///
/// The `&mut` borrow makes it a compile error to run two transactions
/// on one session concurrently; the store forbids it at runtime too.
pub struct Txn<'a, S: StoreSession> {
    session: &'a mut S,
    state: TxnState,
}

impl<'a, S: StoreSession> Txn<'a, S> {
    pub fn new(session: &'a mut S) -> Self {
        Self {
            session,
            state: TxnState::NotStarted,
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    /// NotStarted -> Active.
    pub async fn begin(&mut self, options: TransactionOptions) -> Result<()> {
        if self.state != TxnState::NotStarted {
            return Err(TxnError::TransactionBegin(format!(
                "cannot begin: transaction is {}",
                self.state
            )));
        }

        match self.session.begin(options).await {
            Ok(()) => {
                self.state = TxnState::Active;
                Ok(())
            }
            Err(error @ TxnError::TransactionBegin(_)) => Err(error),
            Err(error) => Err(TxnError::TransactionBegin(error.to_string())),
        }
    }

    /// Run one write operation inside the active transaction.
    pub async fn apply(&mut self, operation: Operation) -> Result<WriteOutcome> {
        if !self.state.is_active() {
            return Err(TxnError::Operation(format!(
                "cannot apply write: transaction is {}",
                self.state
            )));
        }

        match operation.apply(self.session).await {
            Ok(outcome) => Ok(outcome),
            Err(error @ TxnError::Operation(_)) => Err(error),
            Err(error) => Err(TxnError::Operation(error.to_string())),
        }
    }

    /// Active -> Committing -> Committed | CommitFailed.
    ///
    /// A commit failure is terminal: the coordinator neither retries it
    /// nor aborts after it.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(TxnError::Commit(format!(
                "cannot commit: transaction is {}",
                self.state
            )));
        }

        self.state = TxnState::Committing;
        match self.session.commit().await {
            Ok(()) => {
                self.state = TxnState::Committed;
                Ok(())
            }
            Err(error @ TxnError::Commit(_)) => {
                self.state = TxnState::CommitFailed;
                Err(error)
            }
            Err(error) => {
                self.state = TxnState::CommitFailed;
                Err(TxnError::Commit(error.to_string()))
            }
        }
    }

    /// Resolve a failed transaction: Active -> Aborting -> Aborted | AbortFailed.
    ///
    /// Returns the error the caller must surface: `cause` itself when the
    /// abort succeeds, an abort failure carrying `cause` when it does not.
    /// Once committed, the attempt is rejected with
    /// [`TxnError::InvalidAbortAfterCommit`] and the state stays Committed.
    pub async fn abort(&mut self, cause: TxnError) -> TxnError {
        match self.state {
            TxnState::Committed => {
                tracing::error!(%cause, "abort requested after successful commit; rejecting");
                return TxnError::InvalidAbortAfterCommit;
            }
            TxnState::Active => {}
            // Nothing to roll back in any other state.
            _ => return cause,
        }

        self.state = TxnState::Aborting;
        match self.session.abort().await {
            Ok(()) => {
                self.state = TxnState::Aborted;
                cause
            }
            Err(abort_error) => {
                self.state = TxnState::AbortFailed;
                tracing::error!(error = %abort_error, original = %cause, "abort failed");
                TxnError::Abort {
                    reason: abort_error.to_string(),
                    original: Box::new(cause),
                }
            }
        }
    }
}
