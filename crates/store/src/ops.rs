//! Domain edits, run inside a transaction.

use crate::{StoreError, Tx};
use css_values::{CssProperty, StyleValue};
use std::collections::HashSet;
use studio_data::{
    Asset, Breakpoint, Instance, InstanceChild, Prop, StyleDecl, StyleDeclKey, StyleSource,
    StyleSourceSelection, descendants, find_parent,
};
use uuid::Uuid;

/// Whether a delete found something to remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Found,
    NotFound,
}

impl DeleteOutcome {
    #[inline]
    pub const fn found(self) -> bool {
        matches!(self, Self::Found)
    }
}

impl Tx<'_> {
    /// Insert `instance` as child number `index` of `parent_id` (clamped to
    /// the end), or as a root when `parent_id` is `None`.
    ///
    /// # Errors
    /// [`StoreError::DuplicateInstance`] if the id exists,
    /// [`StoreError::UnknownInstance`] if the parent does not.
    pub fn insert_instance(
        &mut self,
        parent_id: Option<&str>,
        index: usize,
        instance: Instance,
    ) -> Result<(), StoreError> {
        let instances = self.instances();
        if instances.contains_key(&instance.id) {
            return Err(StoreError::DuplicateInstance(instance.id));
        }
        if let Some(parent_id) = parent_id {
            let child = InstanceChild::id(instance.id.as_str());
            let inserted = instances.update(parent_id, |parent| {
                let position = index.min(parent.children.len());
                parent.children.insert(position, child);
            })?;
            if inserted.is_none() {
                return Err(StoreError::UnknownInstance(parent_id.to_owned()));
            }
        }
        instances.insert(instance.id.clone(), instance)?;
        Ok(())
    }

    /// Delete an instance and everything that only exists because of it:
    /// its descendants, their props, selections, local style sources and
    /// the declarations of those sources. Siblings keep their order.
    ///
    /// # Errors
    /// Only on patch encoding failures.
    pub fn delete_instance(&mut self, instance_id: &str) -> Result<DeleteOutcome, StoreError> {
        let instances = self.instances();
        if !instances.contains_key(instance_id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let doomed = descendants(instances.entries(), instance_id);
        let parent_id = find_parent(instances.entries(), instance_id).map(|parent| parent.id.clone());
        if let Some(parent_id) = parent_id {
            instances.update(&parent_id, |parent| {
                parent
                    .children
                    .retain(|child| child.as_id() != Some(instance_id));
            })?;
        }
        for id in &doomed {
            instances.remove(id);
        }
        let props = self.props();
        for id in &doomed {
            props.remove(id);
        }

        let mut selected_sources = Vec::new();
        let selections = self.style_source_selections();
        for id in &doomed {
            if let Some(selection) = selections.remove(id) {
                selected_sources.extend(selection.values);
            }
        }
        let sources = self.style_sources();
        let mut local_sources = HashSet::new();
        for source_id in selected_sources {
            if sources.get(&source_id).is_some_and(StyleSource::is_local) {
                sources.remove(&source_id);
                local_sources.insert(source_id);
            }
        }
        if !local_sources.is_empty() {
            let styles = self.styles();
            let keys: Vec<String> = styles
                .iter()
                .filter(|(_, decl)| local_sources.contains(&decl.style_source_id))
                .map(|(key, _)| key.clone())
                .collect();
            for key in keys {
                styles.remove(&key);
            }
        }
        Ok(DeleteOutcome::Found)
    }

    /// Insert or replace (by prop id, in place) a prop of `instance_id`.
    ///
    /// # Errors
    /// [`StoreError::UnknownInstance`] if the instance does not exist.
    pub fn set_prop(&mut self, instance_id: &str, prop: Prop) -> Result<(), StoreError> {
        if !self.instances().contains_key(instance_id) {
            return Err(StoreError::UnknownInstance(instance_id.to_owned()));
        }
        let props = self.props();
        if props.contains_key(instance_id) {
            props.update(instance_id, |list| {
                match list.iter_mut().find(|existing| existing.id == prop.id) {
                    Some(existing) => *existing = prop,
                    None => list.push(prop),
                }
            })?;
        } else {
            props.insert(instance_id, vec![prop])?;
        }
        Ok(())
    }

    /// Remove a prop by id. A missing instance or prop is `NotFound` and
    /// changes nothing.
    ///
    /// # Errors
    /// Only on patch encoding failures.
    pub fn delete_prop(
        &mut self,
        instance_id: &str,
        prop_id: &str,
    ) -> Result<DeleteOutcome, StoreError> {
        let props = self.props();
        let holds_prop = props
            .get(instance_id)
            .is_some_and(|list| list.iter().any(|prop| prop.id == prop_id));
        if !holds_prop {
            return Ok(DeleteOutcome::NotFound);
        }
        let emptied = props
            .update(instance_id, |list| {
                list.retain(|prop| prop.id != prop_id);
                list.is_empty()
            })?
            .unwrap_or_default();
        if emptied {
            props.remove(instance_id);
        }
        Ok(DeleteOutcome::Found)
    }

    /// Write a declaration, replacing any previous value at the same key.
    ///
    /// # Errors
    /// [`StoreError::UnknownBreakpoint`] or [`StoreError::UnknownStyleSource`]
    /// when the declaration points nowhere.
    pub fn set_style(&mut self, decl: StyleDecl) -> Result<StyleDeclKey, StoreError> {
        if !self.breakpoints().contains_key(&decl.breakpoint_id) {
            return Err(StoreError::UnknownBreakpoint(decl.breakpoint_id));
        }
        if !self.style_sources().contains_key(&decl.style_source_id) {
            return Err(StoreError::UnknownStyleSource(decl.style_source_id));
        }
        let key = decl.key();
        self.styles().insert(key.as_str(), decl)?;
        Ok(key)
    }

    /// Remove the declaration stored at `key`; `NotFound` changes nothing.
    pub fn delete_style(&mut self, key: &StyleDeclKey) -> DeleteOutcome {
        if self.styles().remove(key.as_str()).is_some() {
            DeleteOutcome::Found
        } else {
            DeleteOutcome::NotFound
        }
    }

    /// Set `property` on the instance's local style source, creating and
    /// selecting the source if the instance has none yet.
    ///
    /// # Errors
    /// See [`Tx::set_style`] and [`Tx::select_style_source`].
    pub fn set_local_style(
        &mut self,
        instance_id: &str,
        breakpoint_id: &str,
        state: Option<&str>,
        property: &CssProperty,
        value: StyleValue,
    ) -> Result<StyleDeclKey, StoreError> {
        let selected: Vec<String> = self
            .style_source_selections()
            .get(instance_id)
            .map(|selection| selection.values.clone())
            .unwrap_or_default();
        let sources = self.style_sources();
        let existing = selected
            .into_iter()
            .find(|id| sources.get(id).is_some_and(StyleSource::is_local));
        let source_id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                sources.insert(id.as_str(), StyleSource::Local { id: id.clone() })?;
                self.select_style_source(instance_id, &id)?;
                id
            }
        };
        let mut decl = StyleDecl::new(source_id, breakpoint_id, property.clone(), value);
        decl.state = state.map(str::to_owned);
        self.set_style(decl)
    }

    /// Append `source_id` to the instance's selection unless present.
    ///
    /// # Errors
    /// [`StoreError::UnknownInstance`] or [`StoreError::UnknownStyleSource`].
    pub fn select_style_source(
        &mut self,
        instance_id: &str,
        source_id: &str,
    ) -> Result<(), StoreError> {
        if !self.instances().contains_key(instance_id) {
            return Err(StoreError::UnknownInstance(instance_id.to_owned()));
        }
        if !self.style_sources().contains_key(source_id) {
            return Err(StoreError::UnknownStyleSource(source_id.to_owned()));
        }
        let selections = self.style_source_selections();
        let already_selected = selections
            .get(instance_id)
            .map(|selection| selection.values.iter().any(|id| id == source_id));
        match already_selected {
            Some(true) => {}
            Some(false) => {
                selections.update(instance_id, |selection| {
                    selection.values.push(source_id.to_owned());
                })?;
            }
            None => {
                selections.insert(
                    instance_id,
                    StyleSourceSelection {
                        instance_id: instance_id.to_owned(),
                        values: vec![source_id.to_owned()],
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Insert a style source or replace the one with the same id.
    ///
    /// # Errors
    /// Only on patch encoding failures.
    pub fn upsert_style_source(&mut self, source: StyleSource) -> Result<(), StoreError> {
        self.style_sources().insert(source.id().to_owned(), source)?;
        Ok(())
    }

    /// Insert a breakpoint or replace the one with the same id. Whether the
    /// set still has exactly one base is checked when compiling.
    ///
    /// # Errors
    /// Only on patch encoding failures.
    pub fn add_breakpoint(&mut self, breakpoint: Breakpoint) -> Result<(), StoreError> {
        self.breakpoints().insert(breakpoint.id.clone(), breakpoint)?;
        Ok(())
    }

    /// Remove a breakpoint together with every declaration scoped to it.
    pub fn delete_breakpoint(&mut self, breakpoint_id: &str) -> DeleteOutcome {
        if self.breakpoints().remove(breakpoint_id).is_none() {
            return DeleteOutcome::NotFound;
        }
        let styles = self.styles();
        let keys: Vec<String> = styles
            .iter()
            .filter(|(_, decl)| decl.breakpoint_id == breakpoint_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys {
            styles.remove(&key);
        }
        DeleteOutcome::Found
    }

    /// Insert an asset or replace the one with the same id.
    ///
    /// # Errors
    /// Only on patch encoding failures.
    pub fn upsert_asset(&mut self, asset: Asset) -> Result<(), StoreError> {
        self.assets().insert(asset.id.clone(), asset)?;
        Ok(())
    }

    /// Remove an asset. Values still pointing at it serialise as `none`.
    pub fn delete_asset(&mut self, asset_id: &str) -> DeleteOutcome {
        if self.assets().remove(asset_id).is_some() {
            DeleteOutcome::Found
        } else {
            DeleteOutcome::NotFound
        }
    }
}
