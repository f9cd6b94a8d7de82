//! Body shapes of the patch submission endpoint.

use serde::{Deserialize, Serialize};
use studio_store::{RawTransaction, Transaction};

/// `POST` body: the batch for one project, oldest transaction first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub transactions: Vec<RawTransaction>,
    #[serde(alias = "treeId")]
    pub build_id: String,
    pub project_id: String,
}

impl SubmitPayload {
    pub fn new(
        project_id: impl Into<String>,
        build_id: impl Into<String>,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> Self {
        Self {
            transactions: transactions.into_iter().map(RawTransaction::from).collect(),
            build_id: build_id.into(),
            project_id: project_id.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Ok,
}

/// Either `{ "status": "ok" }` or `{ "errors": "..." }`. Any other body is
/// malformed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Ok { status: SubmitStatus },
    Errors { errors: String },
}

impl SubmitResponse {
    #[inline]
    pub const fn ok() -> Self {
        Self::Ok {
            status: SubmitStatus::Ok,
        }
    }

    pub fn errors(message: impl Into<String>) -> Self {
        Self::Errors {
            errors: message.into(),
        }
    }

    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}
