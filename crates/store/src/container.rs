//! Versioned namespace maps and their transaction drafts.

use crate::{Namespace, Patch, PatchError, PatchOp};
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// One namespace map. Only a committed transaction or a patch replay
/// mutates it; every such mutation bumps the version.
#[derive(Clone, Debug, PartialEq)]
pub struct Container<V> {
    entries: IndexMap<String, V>,
    version: u64,
}

impl<V> Default for Container<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            version: 0,
        }
    }
}

impl<V> Container<V> {
    /// A container holding `entries` at version 0.
    pub const fn from_entries(entries: IndexMap<String, V>) -> Self {
        Self {
            entries,
            version: 0,
        }
    }

    #[inline]
    pub const fn entries(&self) -> &IndexMap<String, V> {
        &self.entries
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, V> {
        self.entries.iter()
    }

    /// Number of commits or replays that changed this container.
    #[inline]
    pub const fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn commit(&mut self, entries: IndexMap<String, V>) {
        self.entries = entries;
        self.version += 1;
    }
}

impl<V: Clone + DeserializeOwned> Container<V> {
    /// Replay `patches` in order. Either all of them apply or the container
    /// is left untouched.
    ///
    /// # Errors
    /// Fails on malformed paths, missing values, undecodable values, and
    /// `replace`/`remove` of keys that do not exist.
    pub fn apply_patches(&mut self, patches: &[Patch]) -> Result<(), PatchError> {
        if patches.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.clone();
        for patch in patches {
            apply_patch(&mut entries, patch)?;
        }
        self.commit(entries);
        Ok(())
    }
}

fn apply_patch<V: DeserializeOwned>(
    entries: &mut IndexMap<String, V>,
    patch: &Patch,
) -> Result<(), PatchError> {
    let key = patch.key()?;
    match patch.op {
        PatchOp::Remove => {
            if entries.shift_remove(&key).is_none() {
                return Err(PatchError::MissingEntry {
                    op: patch.op,
                    key,
                });
            }
        }
        PatchOp::Add | PatchOp::Replace => {
            let raw = patch.value.clone().ok_or_else(|| PatchError::MissingValue {
                op: patch.op,
                path: patch.path.clone(),
            })?;
            let value = serde_json::from_value(raw).map_err(|source| PatchError::Decode {
                path: patch.path.clone(),
                source,
            })?;
            if patch.op == PatchOp::Replace && !entries.contains_key(&key) {
                return Err(PatchError::MissingEntry {
                    op: patch.op,
                    key,
                });
            }
            entries.insert(key, value);
        }
    }
    Ok(())
}

/// Working copy of a container inside a transaction.
///
/// Every write records the structural patch that replays it.
#[derive(Debug)]
pub struct Draft<V> {
    namespace: Namespace,
    entries: IndexMap<String, V>,
    patches: Vec<Patch>,
}

impl<V: Clone + Serialize + DeserializeOwned> Draft<V> {
    pub(crate) fn new(namespace: Namespace, container: &Container<V>) -> Self {
        Self {
            namespace,
            entries: container.entries.clone(),
            patches: Vec::new(),
        }
    }

    #[inline]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[inline]
    pub const fn entries(&self) -> &IndexMap<String, V> {
        &self.entries
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, V> {
        self.entries.iter()
    }

    /// Insert or replace the entry at `key`. A new key goes to the end of
    /// the map, an existing one keeps its position.
    ///
    /// # Errors
    /// Returns [`PatchError::Encode`] if `value` has no JSON form that decodes
    /// back, such as a non-finite number; the draft is unchanged in that case.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>, PatchError> {
        let key = key.into();
        let json = encode(&key, &value)?;
        let previous = self.entries.insert(key.clone(), value);
        self.patches.push(if previous.is_some() {
            Patch::replace(&key, json)
        } else {
            Patch::add(&key, json)
        });
        Ok(previous)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.shift_remove(key);
        if removed.is_some() {
            self.patches.push(Patch::remove(key));
        }
        removed
    }

    /// Modify the entry at `key` in place. `None` when there is no entry.
    ///
    /// # Errors
    /// Returns [`PatchError::Encode`] if the updated value has no JSON form
    /// that decodes back; the entry is unchanged in that case.
    pub fn update<R>(
        &mut self,
        key: &str,
        change: impl FnOnce(&mut V) -> R,
    ) -> Result<Option<R>, PatchError> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(None);
        };
        let mut updated = entry.clone();
        let output = change(&mut updated);
        let json = encode(key, &updated)?;
        *entry = updated;
        self.patches.push(Patch::replace(key, json));
        Ok(Some(output))
    }

    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, V>, Vec<Patch>) {
        (self.entries, self.patches)
    }
}

/// JSON form of `value`. `serde_json` writes non-finite floats as `null`,
/// which a replica cannot decode, so the form must decode back.
fn encode<V: Serialize + DeserializeOwned>(
    key: &str,
    value: &V,
) -> Result<serde_json::Value, PatchError> {
    let failed = |source| PatchError::Encode {
        key: key.to_owned(),
        source,
    };
    let json = serde_json::to_value(value).map_err(failed)?;
    serde_json::from_value::<V>(json.clone()).map_err(failed)?;
    Ok(json)
}
