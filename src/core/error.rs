use thiserror::Error;

/// Errors surfaced by the session manager and the transaction coordinator.
///
/// Each failure mode has its own kind so callers can pick a response
/// without parsing message strings. Nothing here is retried internally:
/// a blind commit retry could double-apply non-idempotent writes, so
/// retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum TxnError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transaction begin error: {0}")]
    TransactionBegin(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Commit error: {0}")]
    Commit(String),

    /// Abort itself failed. Supersedes the error that triggered the
    /// abort; that error stays attached as the source and is never
    /// dropped.
    #[error("Abort error: {reason}")]
    Abort {
        reason: String,
        #[source]
        original: Box<TxnError>,
    },

    /// Abort attempted after a successful commit. The transaction stays
    /// committed; the attempt itself is the bug being reported.
    #[error("Cannot abort transaction: already committed")]
    InvalidAbortAfterCommit,

    /// The commit is durable, but a post-commit step reported failure.
    #[error("Transaction committed but reported as failed: {0}")]
    CommittedButReported(String),
}

pub type Result<T> = std::result::Result<T, TxnError>;

impl TxnError {
    /// The error that triggered an abort, when this is an abort failure.
    pub fn original(&self) -> Option<&TxnError> {
        match self {
            TxnError::Abort { original, .. } => Some(original),
            _ => None,
        }
    }
}
