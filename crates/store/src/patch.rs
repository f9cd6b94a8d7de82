//! Key level JSON-Patch operations on namespace maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Operation kind. Maps are keyed by stable ids, so patches never address
/// anything below an entry: a changed entry is replaced whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// One replayable change to a namespace map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    /// JSON pointer with a single segment: `/<escaped key>`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Errors raised while recording or replaying patches.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("patch path `{0}` does not address a single map entry")]
    InvalidPath(String),
    #[error("`{op:?}` patch at `{path}` has no value")]
    MissingValue { op: PatchOp, path: String },
    #[error("cannot {op:?} `{key}`: no such entry")]
    MissingEntry { op: PatchOp, key: String },
    #[error("failed to encode entry `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode entry at `{path}`")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Patch {
    pub fn add(key: &str, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: key_to_path(key),
            value: Some(value),
        }
    }

    pub fn replace(key: &str, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: key_to_path(key),
            value: Some(value),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self {
            op: PatchOp::Remove,
            path: key_to_path(key),
            value: None,
        }
    }

    /// The map key this patch addresses, with pointer escapes undone.
    ///
    /// # Errors
    /// Returns [`PatchError::InvalidPath`] unless the path is exactly one
    /// non-empty segment.
    pub fn key(&self) -> Result<String, PatchError> {
        let invalid = || PatchError::InvalidPath(self.path.clone());
        let segment = self.path.strip_prefix('/').ok_or_else(invalid)?;
        if segment.is_empty() || segment.contains('/') {
            return Err(invalid());
        }
        Ok(segment.replace("~1", "/").replace("~0", "~"))
    }
}

/// Escape `key` as a single JSON pointer segment.
pub fn key_to_path(key: &str) -> String {
    format!("/{}", key.replace('~', "~0").replace('/', "~1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_pointer_escaped() {
        let patch = Patch::remove("a/b~c");
        assert_eq!(patch.path, "/a~1b~0c");
        assert_eq!(patch.key().unwrap(), "a/b~c");
    }

    #[test]
    fn nested_paths_are_rejected() {
        let patch = Patch {
            op: PatchOp::Replace,
            path: "/a/b".into(),
            value: Some(json!(1)),
        };
        assert!(matches!(patch.key(), Err(PatchError::InvalidPath(_))));
    }

    #[test]
    fn wire_shape() {
        assert_eq!(
            serde_json::to_value(Patch::add("x", json!({ "id": "x" }))).unwrap(),
            json!({ "op": "add", "path": "/x", "value": { "id": "x" } })
        );
        assert_eq!(
            serde_json::to_value(Patch::remove("x")).unwrap(),
            json!({ "op": "remove", "path": "/x" })
        );
    }
}
