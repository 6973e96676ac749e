// ============================================================================
// Transaction Coordinator
// ============================================================================

use crate::core::{Result, TxnError, WriteOutcome};
use crate::store::{StoreSession, TransactionOptions};

use super::{TransactionPlan, Txn};

/// Run `plan` inside one transaction on `session`.
///
/// Operations execute strictly in caller order and short-circuit on the
/// first failure, which aborts the transaction. When every operation
/// succeeds the transaction commits exactly once; a commit failure is
/// surfaced as-is, with no abort and no retry. On success the
/// store-assigned identifiers come back in operation order.
///
/// Every store call is awaited in sequence; the caller cancels by
/// dropping the returned future or racing it against a deadline.
pub async fn run_transaction<S: StoreSession>(
    session: &mut S,
    options: TransactionOptions,
    plan: TransactionPlan,
) -> Result<Vec<WriteOutcome>> {
    let TransactionPlan {
        operations,
        post_commit,
    } = plan;

    let mut txn = Txn::new(session);
    txn.begin(options).await?;

    let mut outcomes = Vec::with_capacity(operations.len());
    for operation in operations {
        match txn.apply(operation).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(cause) => {
                tracing::warn!(error = %cause, "write failed, aborting transaction");
                return Err(txn.abort(cause).await);
            }
        }
    }

    if let Err(error) = txn.commit().await {
        tracing::error!(%error, "commit failed; not retrying, not aborting");
        return Err(error);
    }

    if let Some(step) = post_commit {
        if let Err(reason) = step() {
            tracing::warn!(%reason, "post-commit step reported failure; commit stands");
            return Err(TxnError::CommittedButReported(reason));
        }
    }

    Ok(outcomes)
}
