use crate::{Namespace, NamespaceError, Patch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The patches one transaction applied to one container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub namespace: Namespace,
    pub patches: Vec<Patch>,
}

/// Replayable record of a committed transaction.
///
/// The id is minted on the client; the backend uses it to recognise a batch
/// that is resent after a failed flush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub changes: Vec<Change>,
}

impl Transaction {
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            id: Uuid::new_v4(),
            changes,
        }
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.changes.iter().map(|change| change.namespace)
    }

    pub fn patch_count(&self) -> usize {
        self.changes.iter().map(|change| change.patches.len()).sum()
    }
}

/// A change whose namespace has not been checked yet, as read off the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChange {
    pub namespace: String,
    pub patches: Vec<Patch>,
}

/// A transaction as read off the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub changes: Vec<RawChange>,
}

impl RawTransaction {
    /// Check every namespace name.
    ///
    /// # Errors
    /// Returns [`NamespaceError::Unknown`] for the first unknown name; the
    /// whole transaction is rejected.
    pub fn validate(self) -> Result<Transaction, NamespaceError> {
        let changes = self
            .changes
            .into_iter()
            .map(|change| -> Result<Change, NamespaceError> {
                Ok(Change {
                    namespace: change.namespace.parse()?,
                    patches: change.patches,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Transaction {
            id: self.id,
            changes,
        })
    }
}

impl From<Transaction> for RawTransaction {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            changes: transaction
                .changes
                .into_iter()
                .map(|change| RawChange {
                    namespace: change.namespace.as_str().to_owned(),
                    patches: change.patches,
                })
                .collect(),
        }
    }
}
