/// Transaction coordinator tests
///
/// Drives the session manager and coordinator against a scripted store
/// whose sessions fail on command, plus the in-memory store for
/// end-to-end visibility checks.
/// Run with: cargo test --test coordinator_tests
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use doctxn::{
    DocumentStore, MemoryStore, RecordId, SessionManager, StoreConfig, StoreSession,
    TransactionOptions, TransactionPlan, TxnError, WriteOutcome, WriteRecord,
};

/// Call counters shared between a scripted store and the test body.
#[derive(Clone, Default)]
struct Calls {
    begins: Arc<AtomicUsize>,
    inserts: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    aborts: Arc<AtomicUsize>,
    ends: Arc<AtomicUsize>,
}

impl Calls {
    fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }
    fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
    fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
    fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
    fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Default)]
struct Faults {
    fail_begin: bool,
    /// Zero-based index of the insert that fails.
    fail_insert_at: Option<usize>,
    fail_commit: bool,
    fail_abort: bool,
}

struct ScriptedStore {
    calls: Calls,
    faults: Faults,
}

impl ScriptedStore {
    fn new(faults: Faults) -> Self {
        Self {
            calls: Calls::default(),
            faults,
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    type Session = ScriptedSession;

    async fn connect(config: StoreConfig) -> doctxn::Result<Self> {
        config.validate().map_err(TxnError::Connection)?;
        Ok(Self::new(Faults::default()))
    }

    async fn start_session(&self) -> doctxn::Result<ScriptedSession> {
        Ok(ScriptedSession {
            calls: self.calls.clone(),
            faults: self.faults,
            in_txn: false,
        })
    }
}

struct ScriptedSession {
    calls: Calls,
    faults: Faults,
    in_txn: bool,
}

#[async_trait]
impl StoreSession for ScriptedSession {
    async fn begin(&mut self, _options: TransactionOptions) -> doctxn::Result<()> {
        self.calls.begins.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_begin {
            return Err(TxnError::TransactionBegin(
                "transactions require a replica set member".into(),
            ));
        }
        if self.in_txn {
            return Err(TxnError::TransactionBegin(
                "transaction already active".into(),
            ));
        }
        self.in_txn = true;
        Ok(())
    }

    async fn insert(
        &mut self,
        _collection: &str,
        _record: WriteRecord,
    ) -> doctxn::Result<WriteOutcome> {
        let index = self.calls.inserts.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_insert_at == Some(index) {
            return Err(TxnError::Operation("duplicate key".into()));
        }
        Ok(WriteOutcome { id: RecordId::new() })
    }

    async fn commit(&mut self) -> doctxn::Result<()> {
        self.calls.commits.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_commit {
            return Err(TxnError::Commit("transient network partition".into()));
        }
        self.in_txn = false;
        Ok(())
    }

    async fn abort(&mut self) -> doctxn::Result<()> {
        self.calls.aborts.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_abort {
            return Err(TxnError::Connection("primary stepped down".into()));
        }
        self.in_txn = false;
        Ok(())
    }

    async fn end(&mut self) -> doctxn::Result<()> {
        self.calls.ends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn manager_with(faults: Faults) -> (SessionManager<ScriptedStore>, Calls) {
    let store = ScriptedStore::new(faults);
    let calls = store.calls.clone();
    (SessionManager::with_store(store), calls)
}

fn two_insert_plan() -> TransactionPlan {
    TransactionPlan::new()
        .insert(
            "episodes",
            WriteRecord::new("A Transaction Episode for the Ages", 15),
        )
        .insert("episodes", WriteRecord::new("Transactions for All", 4))
}

#[tokio::test]
async fn test_scenario_a_all_operations_commit() {
    let (manager, calls) = manager_with(Faults::default());

    let outcomes = manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_ne!(outcomes[0].id, outcomes[1].id);
    assert_eq!(calls.begins(), 1);
    assert_eq!(calls.commits(), 1);
    assert_eq!(calls.aborts(), 0);
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_scenario_b_post_commit_failure_no_abort() {
    let (manager, calls) = manager_with(Faults::default());

    let plan = TransactionPlan::new()
        .insert(
            "episodes",
            WriteRecord::new("A Transaction Episode for the Ages", 15),
        )
        .post_commit(|| Err("wanted error for failing transaction".to_string()));

    let result = manager.run(TransactionOptions::new(), plan).await;

    assert!(matches!(result, Err(TxnError::CommittedButReported(_))));
    assert_eq!(calls.commits(), 1);
    // The deliberate failure arrived after commit: no abort attempted.
    assert_eq!(calls.aborts(), 0);
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_scenario_c_operation_failure_aborts() {
    let (manager, calls) = manager_with(Faults {
        fail_insert_at: Some(1),
        ..Faults::default()
    });

    let plan = two_insert_plan().insert("episodes", WriteRecord::new("never runs", 1));
    let result = manager.run(TransactionOptions::new(), plan).await;

    assert!(matches!(result, Err(TxnError::Operation(_))));
    // Short-circuit: the third insert never executed.
    assert_eq!(calls.inserts(), 2);
    assert_eq!(calls.aborts(), 1);
    assert_eq!(calls.commits(), 0);
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_scenario_d_abort_failure_carries_original() {
    let (manager, calls) = manager_with(Faults {
        fail_insert_at: Some(0),
        fail_abort: true,
        ..Faults::default()
    });

    let result = manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await;

    match result {
        Err(error @ TxnError::Abort { .. }) => {
            let original = error.original().expect("original error attached");
            assert!(matches!(original, TxnError::Operation(_)));
        }
        other => panic!("expected abort failure, got {:?}", other),
    }
    assert_eq!(calls.aborts(), 1);
    assert_eq!(calls.commits(), 0);
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_commit_failure_is_not_aborted() {
    let (manager, calls) = manager_with(Faults {
        fail_commit: true,
        ..Faults::default()
    });

    let result = manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await;

    assert!(matches!(result, Err(TxnError::Commit(_))));
    assert_eq!(calls.commits(), 1);
    // Commit failure is terminal; abort cannot recover it.
    assert_eq!(calls.aborts(), 0);
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_begin_failure_runs_nothing() {
    let (manager, calls) = manager_with(Faults {
        fail_begin: true,
        ..Faults::default()
    });

    let result = manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await;

    assert!(matches!(result, Err(TxnError::TransactionBegin(_))));
    assert_eq!(calls.inserts(), 0);
    assert_eq!(calls.commits(), 0);
    assert_eq!(calls.aborts(), 0);
    // The session is still released.
    assert_eq!(calls.ends(), 1);
}

#[tokio::test]
async fn test_release_once_per_acquire_across_requests() {
    let (manager, calls) = manager_with(Faults::default());

    for _ in 0..3 {
        manager
            .run(TransactionOptions::new(), two_insert_plan())
            .await
            .unwrap();
    }

    assert_eq!(calls.ends(), 3);
}

#[tokio::test]
async fn test_memory_store_end_to_end() {
    let config = StoreConfig::new("rs0").endpoint("store1:27017");
    let manager = SessionManager::<MemoryStore>::connect(config).await.unwrap();

    manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await
        .unwrap();

    let records = manager.store().find_all("episodes").await;
    assert_eq!(records.len(), 2);
    // Caller-specified order is preserved.
    assert_eq!(records[0].record.title, "A Transaction Episode for the Ages");
    assert_eq!(records[1].record.title, "Transactions for All");
}

#[tokio::test]
async fn test_memory_store_operation_failure_leaves_no_records() {
    let config = StoreConfig::new("rs0").endpoint("store1:27017");
    let manager = SessionManager::<MemoryStore>::connect(config).await.unwrap();

    // Second transaction on the same guard-scoped session fails to
    // begin, leaving the first transaction's writes untouched.
    manager
        .run(TransactionOptions::new(), two_insert_plan())
        .await
        .unwrap();

    let mut guard = manager.acquire().await.unwrap();
    guard
        .session()
        .begin(TransactionOptions::new())
        .await
        .unwrap();
    let nested = guard.session().begin(TransactionOptions::new()).await;
    assert!(matches!(nested, Err(TxnError::TransactionBegin(_))));
    guard.release().await.unwrap();

    assert_eq!(manager.store().count("episodes").await, 2);
}
