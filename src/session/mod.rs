use crate::core::{Result, WriteOutcome};
use crate::store::{DocumentStore, StoreConfig, StoreSession, TransactionOptions};
use crate::transaction::{run_transaction, TransactionPlan};

/// Hands out logical sessions, one per inbound request.
///
/// The store client it wraps may be shared across requests; each session
/// is exclusively owned by one request for its whole lifetime.
pub struct SessionManager<D: DocumentStore> {
    store: D,
}

impl<D: DocumentStore> SessionManager<D> {
    /// Connect to the replicated store described by `config`.
    ///
    /// Fails fast with a connection-kind error, distinct from any
    /// transaction-level error.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let store = D::connect(config).await?;
        Ok(Self { store })
    }

    /// Wrap an already-connected store client.
    pub fn with_store(store: D) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Acquire a session scoped to one request.
    pub async fn acquire(&self) -> Result<SessionGuard<D::Session>> {
        let session = self.store.start_session().await?;
        Ok(SessionGuard {
            session: Some(session),
        })
    }

    /// Acquire a session, run `plan` in one transaction, release.
    ///
    /// Release runs on every exit path: success, operation failure,
    /// commit failure, abort failure. A release failure is logged, never
    /// surfaced in place of the transaction outcome.
    pub async fn run(
        &self,
        options: TransactionOptions,
        plan: TransactionPlan,
    ) -> Result<Vec<WriteOutcome>> {
        let mut guard = self.acquire().await?;
        let outcome = run_transaction(guard.session(), options, plan).await;

        if let Err(error) = guard.release().await {
            tracing::warn!(%error, "failed to release session");
        }

        outcome
    }
}

/// Scoped owner of one session.
///
/// Call [`SessionGuard::release`] on every exit path. Drop cannot await
/// the store, so a guard dropped without release only logs; the
/// store-side session then lives until the store times it out.
pub struct SessionGuard<S: StoreSession> {
    session: Option<S>,
}

impl<S: StoreSession> SessionGuard<S> {
    /// The underlying session.
    pub fn session(&mut self) -> &mut S {
        self.session
            .as_mut()
            .expect("session already released")
    }

    /// End the session. Idempotent: releasing twice is not an error.
    pub async fn release(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            session.end().await?;
        }
        Ok(())
    }
}

impl<S: StoreSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!(
                "session guard dropped without release; store-side session leaked until timeout"
            );
        }
    }
}
