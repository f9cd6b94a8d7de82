//! In-process implementation of the patch submission contract.

use crate::{SubmitPayload, SubmitResponse};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use studio_store::{Change, Namespace, NamespaceError, PatchError, ProjectData, RawTransaction};
use thiserror::Error;
use uuid::Uuid;

/// Applies one change to a project's data.
pub type ChangeHandler = fn(&mut ProjectData, &Change) -> Result<(), PatchError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    UnknownNamespace(#[from] NamespaceError),
    #[error("No handler for namespace \"{0}\"")]
    NoHandler(Namespace),
    #[error("Unknown project \"{0}\"")]
    UnknownProject(String),
    #[error("transaction {id} failed: {source}")]
    Patch {
        id: Uuid,
        #[source]
        source: PatchError,
    },
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Namespace to handler mapping.
#[derive(Clone, Debug)]
pub struct HandlerRegistry {
    handlers: HashMap<Namespace, ChangeHandler>,
}

impl HandlerRegistry {
    /// A registry that accepts no namespace.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Replace the handler of `namespace`, returning the previous one.
    pub fn register(&mut self, namespace: Namespace, handler: ChangeHandler) -> Option<ChangeHandler> {
        self.handlers.insert(namespace, handler)
    }

    pub fn unregister(&mut self, namespace: Namespace) -> Option<ChangeHandler> {
        self.handlers.remove(&namespace)
    }

    #[inline]
    pub fn get(&self, namespace: Namespace) -> Option<ChangeHandler> {
        self.handlers.get(&namespace).copied()
    }
}

/// Every namespace replays its patches into the matching container.
impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for namespace in Namespace::ALL {
            registry.register(namespace, ProjectData::apply_change);
        }
        registry
    }
}

#[derive(Debug, Default)]
struct StoredProject {
    data: ProjectData,
    applied: HashSet<Uuid>,
}

/// Server side copy of every project, updated from submitted batches.
#[derive(Debug, Default)]
pub struct PatchBackend {
    registry: HandlerRegistry,
    projects: HashMap<String, StoredProject>,
}

impl PatchBackend {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            projects: HashMap::new(),
        }
    }

    pub fn insert_project(&mut self, project_id: impl Into<String>, data: ProjectData) {
        self.projects.insert(
            project_id.into(),
            StoredProject {
                data,
                applied: HashSet::new(),
            },
        );
    }

    pub fn project(&self, project_id: &str) -> Option<&ProjectData> {
        self.projects.get(project_id).map(|project| &project.data)
    }

    /// Whether transaction `id` has been applied to `project_id`.
    pub fn is_applied(&self, project_id: &str, id: Uuid) -> bool {
        self.projects
            .get(project_id)
            .is_some_and(|project| project.applied.contains(&id))
    }

    /// Apply a batch, returning how many transactions were new.
    ///
    /// Namespaces are checked for the whole batch first, so an unknown one
    /// rejects the submission before anything is written. Each transaction
    /// is then applied atomically, in order; one that was already applied
    /// is skipped.
    ///
    /// # Errors
    /// [`BackendError::UnknownNamespace`], [`BackendError::UnknownProject`],
    /// [`BackendError::NoHandler`] or the first failing transaction. Earlier
    /// transactions of the batch stay applied.
    pub fn apply(&mut self, payload: SubmitPayload) -> Result<usize, BackendError> {
        let transactions = payload
            .transactions
            .into_iter()
            .map(RawTransaction::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let project = self
            .projects
            .get_mut(&payload.project_id)
            .ok_or_else(|| BackendError::UnknownProject(payload.project_id.clone()))?;

        let mut fresh = 0;
        for transaction in transactions {
            if project.applied.contains(&transaction.id) {
                debug!("skipping replayed transaction {}", transaction.id);
                continue;
            }
            let mut next = project.data.clone();
            for change in &transaction.changes {
                let handler = self
                    .registry
                    .get(change.namespace)
                    .ok_or(BackendError::NoHandler(change.namespace))?;
                handler(&mut next, change).map_err(|source| BackendError::Patch {
                    id: transaction.id,
                    source,
                })?;
            }
            project.data = next;
            project.applied.insert(transaction.id);
            fresh += 1;
        }
        Ok(fresh)
    }

    /// [`PatchBackend::apply`], answered in the endpoint's response shape.
    pub fn handle(&mut self, payload: SubmitPayload) -> SubmitResponse {
        match self.apply(payload) {
            Ok(_) => SubmitResponse::ok(),
            Err(error) => {
                warn!("rejecting submission: {error}");
                SubmitResponse::errors(error.to_string())
            }
        }
    }

    /// Decode a raw request body and handle it.
    pub fn handle_json(&mut self, body: &[u8]) -> SubmitResponse {
        match serde_json::from_slice::<SubmitPayload>(body) {
            Ok(payload) => self.handle(payload),
            Err(error) => {
                let error = BackendError::from(error);
                warn!("rejecting submission: {error}");
                SubmitResponse::errors(error.to_string())
            }
        }
    }
}
