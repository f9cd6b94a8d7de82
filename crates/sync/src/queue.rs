//! Per-project batching and the flush loop.
//!
//! The queue runs as a task owning every project's pending transactions.
//! [`SyncHandle`] talks to it over a command channel. For each project at
//! most one batch is in flight; transactions enqueued meanwhile start the
//! next batch. A failed batch is put back in front of them, so the backend
//! always sees a project's transactions in commit order.

use crate::{FlushError, SubmitPayload, SubmitResponse, SyncConfig, Transport};
use core::mem::{replace, take};
use core::ops::ControlFlow;
use core::time::Duration;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use studio_store::{RawTransaction, Transaction};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::{broadcast, oneshot};
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{Instrument as _, info_span};

const EVENT_CAPACITY: usize = 64;

/// What a project's queue is doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueState {
    Idle,
    Accumulating,
    Flushing,
    /// Retries are exhausted. The batch is kept and still retried; the state
    /// clears on the next successful flush.
    Failed,
}

/// Notifications about flush outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    Flushed {
        project_id: String,
        transactions: usize,
    },
    Retrying {
        project_id: String,
        attempt: u32,
        error: String,
    },
    Failed {
        project_id: String,
        attempts: u32,
        error: String,
    },
    Recovered {
        project_id: String,
    },
}

#[derive(Debug)]
pub struct ProjectFailure {
    pub project_id: String,
    pub error: FlushError,
}

/// Outcome of [`SyncHandle::flush_now`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Transactions acknowledged by the backend.
    pub delivered: usize,
    pub failures: Vec<ProjectFailure>,
    /// Transactions still queued afterwards.
    pub pending: usize,
}

impl FlushReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.pending == 0
    }
}

enum Command {
    Enqueue {
        project_id: String,
        build_id: String,
        transaction: Transaction,
    },
    FlushNow(oneshot::Sender<FlushReport>),
    Status {
        project_id: String,
        reply: oneshot::Sender<QueueState>,
    },
    Shutdown(oneshot::Sender<FlushReport>),
}

#[derive(Debug, Default)]
struct ProjectQueue {
    build_id: String,
    pending: Vec<Transaction>,
    in_flight: Option<Vec<Transaction>>,
    failures: u32,
    failed: bool,
}

impl ProjectQueue {
    fn state(&self) -> QueueState {
        if self.failed {
            QueueState::Failed
        } else if self.in_flight.is_some() {
            QueueState::Flushing
        } else if self.pending.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Accumulating
        }
    }

    fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none() && !self.failed
    }
}

type Flight = (String, Result<usize, FlushError>);

/// The queue task. Create it with [`SyncQueue::spawn`].
pub struct SyncQueue<T> {
    transport: Arc<T>,
    config: SyncConfig,
    queues: HashMap<String, ProjectQueue>,
    flights: JoinSet<Flight>,
    flight_projects: HashMap<Id, String>,
    commands: UnboundedReceiver<Command>,
    events: broadcast::Sender<SyncEvent>,
}

impl<T: Transport> SyncQueue<T> {
    /// Start the queue on the current tokio runtime.
    ///
    /// The first automatic flush happens one `flush_interval` after start.
    /// The task ends on [`SyncHandle::shutdown`] or once every handle is
    /// dropped, after a final flush.
    pub fn spawn(transport: T, config: SyncConfig) -> SyncHandle {
        let (sender, commands) = unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let queue = Self {
            transport: Arc::new(transport),
            config,
            queues: HashMap::new(),
            flights: JoinSet::new(),
            flight_projects: HashMap::new(),
            commands,
            events: events.clone(),
        };
        tokio::spawn(queue.run());
        SyncHandle {
            commands: sender,
            events,
        }
    }

    async fn run(mut self) {
        let period = self.config.flush_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => {
                    if self.handle(command).await.is_break() {
                        break;
                    }
                }
                Some(landed) = self.flights.join_next_with_id() => self.land(landed, None),
                _ = ticker.tick() => self.take_off(None),
            }
        }
        debug!("sync queue stopped");
    }

    async fn handle(&mut self, command: Option<Command>) -> ControlFlow<()> {
        match command {
            Some(Command::Enqueue {
                project_id,
                build_id,
                transaction,
            }) => {
                let queue = self.queues.entry(project_id).or_default();
                // A batch is submitted under the latest build id.
                queue.build_id = build_id;
                queue.pending.push(transaction);
            }
            Some(Command::FlushNow(reply)) => {
                let report = self.flush_all().await;
                if reply.send(report).is_err() {
                    debug!("flush requester went away");
                }
            }
            Some(Command::Status { project_id, reply }) => {
                let state = self
                    .queues
                    .get(&project_id)
                    .map_or(QueueState::Idle, ProjectQueue::state);
                if reply.send(state).is_err() {
                    debug!("status requester went away");
                }
            }
            Some(Command::Shutdown(reply)) => {
                let report = self.flush_all().await;
                if reply.send(report).is_err() {
                    debug!("shutdown requester went away");
                }
                return ControlFlow::Break(());
            }
            None => {
                let report = self.flush_all().await;
                if report.pending > 0 {
                    warn!(
                        "sync queue dropped with {} undelivered transactions",
                        report.pending
                    );
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Flush every project once and wait for all flights to land, including
    /// ones already in the air.
    async fn flush_all(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let mut attempted = HashSet::new();
        loop {
            self.take_off(Some(&mut attempted));
            let Some(landed) = self.flights.join_next_with_id().await else {
                break;
            };
            self.land(landed, Some(&mut report));
        }
        report.pending = self.queues.values().map(|queue| queue.pending.len()).sum();
        report
    }

    /// Start a flush for every project with pending transactions and nothing
    /// in flight. With `attempted`, each project is started at most once.
    fn take_off(&mut self, mut attempted: Option<&mut HashSet<String>>) {
        for (project_id, queue) in &mut self.queues {
            if queue.pending.is_empty() || queue.in_flight.is_some() {
                continue;
            }
            if let Some(attempted) = attempted.as_deref_mut()
                && !attempted.insert(project_id.clone())
            {
                continue;
            }
            let batch = take(&mut queue.pending);
            let count = batch.len();
            let payload = SubmitPayload::new(project_id.as_str(), queue.build_id.as_str(), batch.clone());
            queue.in_flight = Some(batch);

            let transport = Arc::clone(&self.transport);
            let limit = self.config.request_timeout;
            let project = project_id.clone();
            let span = info_span!("sync.flush", project = %project_id, transactions = count);
            let flight = self.flights.spawn(
                async move {
                    let outcome = submit(&*transport, payload, limit).await.map(|()| count);
                    (project, outcome)
                }
                .instrument(span),
            );
            self.flight_projects.insert(flight.id(), project_id.clone());
        }
    }

    fn land(&mut self, landed: Result<(Id, Flight), JoinError>, report: Option<&mut FlushReport>) {
        let (project_id, outcome) = match landed {
            Ok((id, flight)) => {
                self.flight_projects.remove(&id);
                flight
            }
            Err(error) => {
                let Some(project_id) = self.flight_projects.remove(&error.id()) else {
                    warn!("flush task for an unknown project aborted: {error}");
                    return;
                };
                (project_id, Err(FlushError::Aborted(error.to_string())))
            }
        };
        let Some(queue) = self.queues.get_mut(&project_id) else {
            return;
        };
        let batch = queue.in_flight.take().unwrap_or_default();

        match outcome {
            Ok(delivered) => {
                debug!("flushed {delivered} transactions for project {project_id}");
                queue.failures = 0;
                let recovered = replace(&mut queue.failed, false);
                let settled = queue.is_settled();
                if let Some(report) = report {
                    report.delivered += delivered;
                }
                emit(
                    &self.events,
                    SyncEvent::Flushed {
                        project_id: project_id.clone(),
                        transactions: delivered,
                    },
                );
                if recovered {
                    info!("project {project_id} is syncing again");
                    emit(
                        &self.events,
                        SyncEvent::Recovered {
                            project_id: project_id.clone(),
                        },
                    );
                }
                if settled {
                    self.queues.remove(&project_id);
                }
            }
            Err(error) => {
                queue.pending.splice(0..0, batch);
                queue.failures = queue.failures.saturating_add(1);
                let attempts = queue.failures;
                let message = error.to_string();
                if !queue.failed && attempts >= self.config.max_retries {
                    queue.failed = true;
                    warn!("giving up on project {project_id} after {attempts} attempts: {message}");
                    emit(
                        &self.events,
                        SyncEvent::Failed {
                            project_id: project_id.clone(),
                            attempts,
                            error: message,
                        },
                    );
                } else {
                    warn!("flush {attempts} for project {project_id} failed, retrying: {message}");
                    emit(
                        &self.events,
                        SyncEvent::Retrying {
                            project_id: project_id.clone(),
                            attempt: attempts,
                            error: message,
                        },
                    );
                }
                if let Some(report) = report {
                    report.failures.push(ProjectFailure { project_id, error });
                }
            }
        }
    }
}

async fn submit<T: Transport>(
    transport: &T,
    payload: SubmitPayload,
    limit: Duration,
) -> Result<(), FlushError> {
    match timeout(limit, transport.submit(payload)).await {
        Err(_) => Err(FlushError::Timeout(limit)),
        Ok(Err(error)) => Err(FlushError::Transport(error)),
        Ok(Ok(SubmitResponse::Ok { .. })) => Ok(()),
        Ok(Ok(SubmitResponse::Errors { errors })) => Err(FlushError::Rejected(errors)),
    }
}

fn emit(events: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    // No subscribers is fine.
    if events.send(event).is_err() {
        debug!("sync event without listeners");
    }
}

/// Cloneable control surface of a running [`SyncQueue`].
#[derive(Clone, Debug)]
pub struct SyncHandle {
    commands: UnboundedSender<Command>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncHandle {
    /// Append `transaction` to the project's pending batch.
    ///
    /// # Errors
    /// [`FlushError::Closed`] once the queue has stopped.
    pub fn enqueue(
        &self,
        project_id: impl Into<String>,
        build_id: impl Into<String>,
        transaction: Transaction,
    ) -> Result<(), FlushError> {
        self.send(Command::Enqueue {
            project_id: project_id.into(),
            build_id: build_id.into(),
            transaction,
        })
    }

    /// Validate a transaction read off the wire, then enqueue it.
    ///
    /// # Errors
    /// [`FlushError::Namespace`] for an unknown namespace; nothing is
    /// queued. [`FlushError::Closed`] once the queue has stopped.
    pub fn enqueue_raw(
        &self,
        project_id: impl Into<String>,
        build_id: impl Into<String>,
        transaction: RawTransaction,
    ) -> Result<(), FlushError> {
        let transaction = transaction.validate()?;
        self.enqueue(project_id, build_id, transaction)
    }

    /// Forward every transaction received on `changes` to the queue, e.g. a
    /// [`studio_store::Store::subscribe`] receiver.
    pub fn attach(
        &self,
        mut changes: UnboundedReceiver<Transaction>,
        project_id: impl Into<String>,
        build_id: impl Into<String>,
    ) -> JoinHandle<()> {
        let handle = self.clone();
        let project_id = project_id.into();
        let build_id = build_id.into();
        tokio::spawn(async move {
            while let Some(transaction) = changes.recv().await {
                if handle
                    .enqueue(project_id.as_str(), build_id.as_str(), transaction)
                    .is_err()
                {
                    warn!("sync queue closed, detaching project {project_id}");
                    break;
                }
            }
        })
    }

    /// Flush every project now and wait for the outcome.
    ///
    /// # Errors
    /// [`FlushError::Closed`] once the queue has stopped.
    pub async fn flush_now(&self) -> Result<FlushReport, FlushError> {
        self.request(Command::FlushNow).await
    }

    /// # Errors
    /// [`FlushError::Closed`] once the queue has stopped.
    pub async fn status(&self, project_id: &str) -> Result<QueueState, FlushError> {
        self.request(|reply| Command::Status {
            project_id: project_id.to_owned(),
            reply,
        })
        .await
    }

    /// Flush once more, then stop the queue and its timer.
    ///
    /// # Errors
    /// [`FlushError::Closed`] if the queue had already stopped.
    pub async fn shutdown(self) -> Result<FlushReport, FlushError> {
        self.request(Command::Shutdown).await
    }

    /// Subscribe to flush notifications. Slow receivers miss old events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    fn send(&self, command: Command) -> Result<(), FlushError> {
        self.commands.send(command).map_err(|_| FlushError::Closed)
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, FlushError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| FlushError::Closed)
    }
}
