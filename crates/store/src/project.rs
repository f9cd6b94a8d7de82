use crate::{Change, Container, Namespace, PatchError, Transaction};
use studio_data::{
    Asset, Breakpoint, Instance, ProjectSnapshot, ProjectView, Prop, StyleDecl, StyleSource,
    StyleSourceSelection,
};

/// Every container of one project.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectData {
    pub(crate) instances: Container<Instance>,
    pub(crate) props: Container<Vec<Prop>>,
    pub(crate) breakpoints: Container<Breakpoint>,
    pub(crate) styles: Container<StyleDecl>,
    pub(crate) style_sources: Container<StyleSource>,
    pub(crate) style_source_selections: Container<StyleSourceSelection>,
    pub(crate) assets: Container<Asset>,
}

impl ProjectData {
    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Self {
        Self {
            instances: Container::from_entries(snapshot.instances),
            props: Container::from_entries(snapshot.props),
            breakpoints: Container::from_entries(snapshot.breakpoints),
            styles: Container::from_entries(snapshot.styles),
            style_sources: Container::from_entries(snapshot.style_sources),
            style_source_selections: Container::from_entries(snapshot.style_source_selections),
            assets: Container::from_entries(snapshot.assets),
        }
    }

    /// Owned copy for saving or sending to a replica.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            instances: self.instances.entries().clone(),
            props: self.props.entries().clone(),
            breakpoints: self.breakpoints.entries().clone(),
            styles: self.styles.entries().clone(),
            style_sources: self.style_sources.entries().clone(),
            style_source_selections: self.style_source_selections.entries().clone(),
            assets: self.assets.entries().clone(),
        }
    }

    /// Borrowed view for the CSS compiler.
    pub const fn view(&self) -> ProjectView<'_> {
        ProjectView {
            instances: self.instances.entries(),
            breakpoints: self.breakpoints.entries(),
            styles: self.styles.entries(),
            style_sources: self.style_sources.entries(),
            style_source_selections: self.style_source_selections.entries(),
            assets: self.assets.entries(),
        }
    }

    #[inline]
    pub const fn instances(&self) -> &Container<Instance> {
        &self.instances
    }

    #[inline]
    pub const fn props(&self) -> &Container<Vec<Prop>> {
        &self.props
    }

    #[inline]
    pub const fn breakpoints(&self) -> &Container<Breakpoint> {
        &self.breakpoints
    }

    #[inline]
    pub const fn styles(&self) -> &Container<StyleDecl> {
        &self.styles
    }

    #[inline]
    pub const fn style_sources(&self) -> &Container<StyleSource> {
        &self.style_sources
    }

    #[inline]
    pub const fn style_source_selections(&self) -> &Container<StyleSourceSelection> {
        &self.style_source_selections
    }

    #[inline]
    pub const fn assets(&self) -> &Container<Asset> {
        &self.assets
    }

    /// Version counter of the container behind `namespace`.
    pub const fn version(&self, namespace: Namespace) -> u64 {
        match namespace {
            Namespace::Instances => self.instances.version(),
            Namespace::Props => self.props.version(),
            Namespace::Breakpoints => self.breakpoints.version(),
            Namespace::Styles => self.styles.version(),
            Namespace::StyleSources => self.style_sources.version(),
            Namespace::StyleSourceSelections => self.style_source_selections.version(),
            Namespace::Assets => self.assets.version(),
        }
    }

    /// Replay one change against the matching container.
    ///
    /// # Errors
    /// See [`Container::apply_patches`]; the container is untouched on error.
    pub fn apply_change(&mut self, change: &Change) -> Result<(), PatchError> {
        let patches = change.patches.as_slice();
        match change.namespace {
            Namespace::Instances => self.instances.apply_patches(patches),
            Namespace::Props => self.props.apply_patches(patches),
            Namespace::Breakpoints => self.breakpoints.apply_patches(patches),
            Namespace::Styles => self.styles.apply_patches(patches),
            Namespace::StyleSources => self.style_sources.apply_patches(patches),
            Namespace::StyleSourceSelections => self.style_source_selections.apply_patches(patches),
            Namespace::Assets => self.assets.apply_patches(patches),
        }
    }

    /// Replay every change of `transaction`, all or nothing.
    ///
    /// # Errors
    /// The first failing change; no container is modified in that case.
    pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<(), PatchError> {
        let mut next = self.clone();
        for change in &transaction.changes {
            next.apply_change(change)?;
        }
        *self = next;
        Ok(())
    }
}
