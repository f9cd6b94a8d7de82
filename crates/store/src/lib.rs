//! Transactional, versioned store for a project's normalised data.
//!
//! Each namespace lives in a [`Container`]. Containers change only inside
//! [`Store::transaction`]: the mutator edits lazily cloned [`Draft`]s, and on
//! success every touched container is swapped in at once and a
//! [`Transaction`] record with one [`Change`] per container is emitted. The
//! record replays against a server side copy through
//! [`ProjectData::apply_transaction`].

#![forbid(unsafe_code)]

mod container;
mod namespace;
mod ops;
mod patch;
mod project;
mod store;
mod transaction;

pub use container::{Container, Draft};
pub use namespace::{Namespace, NamespaceError};
pub use ops::DeleteOutcome;
pub use patch::{Patch, PatchError, PatchOp, key_to_path};
pub use project::ProjectData;
pub use store::{Commit, Store, Tx};
pub use transaction::{Change, RawChange, RawTransaction, Transaction};

use thiserror::Error;

/// Errors surfaced by transactions and the domain edits run inside them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutator failed; nothing was committed.
    #[error("transaction aborted: {0:#}")]
    Aborted(anyhow::Error),
    #[error("unknown instance `{0}`")]
    UnknownInstance(String),
    #[error("instance `{0}` already exists")]
    DuplicateInstance(String),
    #[error("unknown breakpoint `{0}`")]
    UnknownBreakpoint(String),
    #[error("unknown style source `{0}`")]
    UnknownStyleSource(String),
    #[error(transparent)]
    Patch(#[from] PatchError),
}
