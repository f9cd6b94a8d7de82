use core::future::pending;
use core::time::Duration;
use css_values::{CssProperty, StyleValue, parse_css_value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use studio_data::{Breakpoint, Instance, ProjectSnapshot};
use studio_store::{NamespaceError, ProjectData, RawChange, RawTransaction, Store, Transaction};
use studio_sync::{
    FlushError, LocalTransport, PatchBackend, QueueState, SubmitPayload, SubmitResponse,
    SyncConfig, SyncEvent, SyncQueue, Transport, TransportError,
};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use uuid::Uuid;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every payload; fails the first `failures` submissions, and can
/// hold submissions until permits are added to `gate`.
#[derive(Clone, Default)]
struct ScriptedTransport {
    calls: Arc<Mutex<Vec<SubmitPayload>>>,
    failures: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
    hang: bool,
}

impl ScriptedTransport {
    fn failing(failures: usize) -> Self {
        Self {
            failures: Arc::new(AtomicUsize::new(failures)),
            ..Self::default()
        }
    }

    fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (transport, gate)
    }

    fn batches(&self) -> Vec<Vec<Uuid>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|payload| payload.transactions.iter().map(|tx| tx.id).collect())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    async fn submit(&self, payload: SubmitPayload) -> Result<SubmitResponse, TransportError> {
        self.calls.lock().unwrap().push(payload);
        if self.hang {
            pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            return Ok(SubmitResponse::errors("database unavailable"));
        }
        Ok(SubmitResponse::ok())
    }
}

fn transaction() -> Transaction {
    Transaction::new(Vec::new())
}

#[tokio::test(start_paused = true)]
async fn back_to_back_transactions_share_one_request() {
    init_logging();
    let transport = ScriptedTransport::default();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    let (first, second) = (transaction(), transaction());

    handle.enqueue("p1", "b1", first.clone()).unwrap();
    handle.enqueue("p1", "b1", second.clone()).unwrap();
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Accumulating);

    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 2);
    assert!(report.is_clean());
    assert_eq!(transport.batches(), [vec![first.id, second.id]]);
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Idle);
}

#[tokio::test(start_paused = true)]
async fn the_interval_flushes_pending_batches() {
    let transport = ScriptedTransport::default();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    handle.enqueue("p1", "b1", transaction()).unwrap();
    handle.enqueue("p1", "b1", transaction()).unwrap();

    sleep(Duration::from_millis(500)).await;
    assert!(transport.batches().is_empty());
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(transport.batches().len(), 1);
    assert_eq!(transport.batches()[0].len(), 2);

    sleep(Duration::from_millis(3000)).await;
    assert_eq!(transport.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_batches_are_resent_in_front() {
    let transport = ScriptedTransport::failing(1);
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    let mut events = handle.events();
    let (first, second) = (transaction(), transaction());

    handle.enqueue("p1", "b1", first.clone()).unwrap();
    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.pending, 1);
    assert!(matches!(
        &report.failures[0].error,
        FlushError::Rejected(message) if message == "database unavailable"
    ));
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Accumulating);

    handle.enqueue("p1", "b1", second.clone()).unwrap();
    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(
        transport.batches(),
        [vec![first.id], vec![first.id, second.id]]
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::Retrying { attempt: 1, .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::Flushed { transactions: 2, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn arrivals_during_a_flight_start_the_next_batch() {
    let (transport, gate) = ScriptedTransport::gated();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    let (first, second) = (transaction(), transaction());

    handle.enqueue("p1", "b1", first.clone()).unwrap();
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Flushing);

    handle.enqueue("p1", "b1", second.clone()).unwrap();
    gate.add_permits(2);
    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(transport.batches(), [vec![first.id], vec![second.id]]);
}

#[tokio::test(start_paused = true)]
async fn hung_requests_time_out_and_exhaust_retries() {
    init_logging();
    let transport = ScriptedTransport {
        hang: true,
        ..ScriptedTransport::default()
    };
    let config = SyncConfig {
        request_timeout: Duration::from_secs(5),
        max_retries: 1,
        ..SyncConfig::default()
    };
    let handle = SyncQueue::spawn(transport, config);
    let mut events = handle.events();

    handle.enqueue("p1", "b1", transaction()).unwrap();
    let report = handle.flush_now().await.unwrap();
    assert!(matches!(
        report.failures[0].error,
        FlushError::Timeout(limit) if limit == Duration::from_secs(5)
    ));
    assert_eq!(report.pending, 1);
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Failed);
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::Failed { attempts: 1, .. }
    ));
}

#[tokio::test]
async fn unknown_namespaces_are_refused_at_the_boundary() {
    let transport = ScriptedTransport::default();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    let raw = RawTransaction {
        id: Uuid::new_v4(),
        changes: vec![RawChange {
            namespace: "pages".into(),
            patches: Vec::new(),
        }],
    };

    let error = handle.enqueue_raw("p1", "b1", raw).unwrap_err();
    assert!(matches!(
        &error,
        FlushError::Namespace(NamespaceError::Unknown(name)) if name == "pages"
    ));
    assert_eq!(error.to_string(), "Unknown namespace \"pages\"");

    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert!(transport.batches().is_empty());
}

#[tokio::test]
async fn projects_flush_independently() {
    let transport = ScriptedTransport::default();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    handle.enqueue("p1", "b1", transaction()).unwrap();
    handle.enqueue("p2", "b2", transaction()).unwrap();
    handle.enqueue("p1", "b1", transaction()).unwrap();

    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 3);
    let mut projects: Vec<(String, usize)> = transport
        .calls
        .lock()
        .unwrap()
        .iter()
        .map(|payload| (payload.project_id.clone(), payload.transactions.len()))
        .collect();
    projects.sort();
    assert_eq!(projects, [("p1".to_owned(), 2), ("p2".to_owned(), 1)]);
}

#[tokio::test]
async fn shutdown_flushes_and_closes() {
    let transport = ScriptedTransport::default();
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());
    let other = handle.clone();
    handle.enqueue("p1", "b1", transaction()).unwrap();

    let report = handle.shutdown().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(matches!(
        other.enqueue("p1", "b1", transaction()),
        Err(FlushError::Closed)
    ));
    assert!(matches!(other.flush_now().await, Err(FlushError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn store_commits_reach_the_backend() {
    init_logging();
    let mut snapshot = ProjectSnapshot::default();
    snapshot.insert_breakpoint(Breakpoint::base("base"));
    snapshot.insert_instance(Instance::new("body", "Body"));

    let mut backend = PatchBackend::default();
    backend.insert_project("p1", ProjectData::from_snapshot(snapshot.clone()));
    let transport = LocalTransport::new(backend);
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());

    let mut store = Store::from_snapshot(snapshot);
    let forwarder = handle.attach(store.subscribe(), "p1", "b1");
    store
        .transaction(|tx| {
            tx.insert_instance(Some("body"), 0, Instance::new("box", "Box"))?;
            tx.set_local_style(
                "box",
                "base",
                None,
                &CssProperty::new("color"),
                StyleValue::keyword("red"),
            )?;
            Ok(())
        })
        .unwrap();
    store
        .transaction(|tx| Ok(tx.add_breakpoint(Breakpoint::max("mobile", 479))?))
        .unwrap();

    sleep(Duration::from_millis(1500)).await;
    let backend = transport.backend();
    let backend = backend.lock().await;
    assert_eq!(
        backend.project("p1").unwrap().snapshot(),
        store.data().snapshot()
    );
    drop(backend);
    drop(store);
    forwarder.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn out_of_range_numbers_do_not_block_later_edits() {
    let mut snapshot = ProjectSnapshot::default();
    snapshot.insert_breakpoint(Breakpoint::base("base"));
    snapshot.insert_instance(Instance::new("body", "Body"));

    let mut backend = PatchBackend::default();
    backend.insert_project("p1", ProjectData::from_snapshot(snapshot.clone()));
    let transport = LocalTransport::new(backend);
    let handle = SyncQueue::spawn(transport.clone(), SyncConfig::default());

    let mut store = Store::from_snapshot(snapshot);
    let forwarder = handle.attach(store.subscribe(), "p1", "b1");
    let width = CssProperty::new("width");
    let value = parse_css_value(&width, "1e999px");
    assert_eq!(value, StyleValue::invalid("1e999px"));
    store
        .transaction(|tx| {
            tx.set_local_style("body", "base", None, &width, value)?;
            Ok(())
        })
        .unwrap();
    store
        .transaction(|tx| Ok(tx.add_breakpoint(Breakpoint::min("m", 768))?))
        .unwrap();

    sleep(Duration::from_millis(100)).await;
    let report = handle.flush_now().await.unwrap();
    assert_eq!(report.delivered, 2);
    assert!(report.is_clean());
    assert_eq!(handle.status("p1").await.unwrap(), QueueState::Idle);

    let backend = transport.backend();
    let backend = backend.lock().await;
    let replica = backend.project("p1").unwrap();
    assert!(replica.breakpoints().contains_key("m"));
    assert_eq!(replica.snapshot(), store.data().snapshot());
    drop(backend);
    drop(store);
    forwarder.await.unwrap();
}
