//! Delivery of committed transactions to the backend.
//!
//! [`SyncQueue`] batches transactions per project and flushes them through a
//! [`Transport`] on a fixed interval or on demand. A batch that fails to
//! flush is kept and resent on the next tick; the backend recognises resent
//! transactions by id ([`PatchBackend`]).

#![forbid(unsafe_code)]

mod backend;
mod config;
mod queue;
mod transport;
mod wire;

pub use backend::{BackendError, ChangeHandler, HandlerRegistry, PatchBackend};
pub use config::SyncConfig;
pub use queue::{FlushReport, ProjectFailure, QueueState, SyncEvent, SyncHandle, SyncQueue};
pub use transport::{HttpTransport, LocalTransport, Transport, TransportError};
pub use wire::{SubmitPayload, SubmitResponse, SubmitStatus};

use core::time::Duration;
use studio_store::NamespaceError;
use thiserror::Error;

/// Why a batch was not delivered, or why the queue refused a request.
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("flush timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The backend answered with an error body.
    #[error("backend rejected the batch: {0}")]
    Rejected(String),
    /// The flush task panicked or was cancelled.
    #[error("flush task aborted: {0}")]
    Aborted(String),
    /// Raised synchronously by [`SyncHandle::enqueue_raw`]; never retried.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    #[error("sync queue has shut down")]
    Closed,
}
