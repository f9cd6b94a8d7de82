//! Project data to stylesheet, full or incremental.

use crate::cascade::{SourceIndex, resolve_with_index};
use crate::{CompileError, CssEngine, RuleKey, SelectorStrategy};
use css_media_queries::validate_breakpoints;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use studio_data::{ProjectView, StyleDecl, StyleDeclKey};
use studio_store::{Namespace, Transaction};
use tracing::info_span;

/// Compiler settings, derived from the application configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub selector: SelectorStrategy,
}

/// A rule touched by a compile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId {
    pub breakpoint_id: String,
    pub instance_id: String,
    pub state: Option<String>,
}

impl RuleId {
    fn from_parts(breakpoint_id: String, key: RuleKey) -> Self {
        Self {
            breakpoint_id,
            instance_id: key.instance_id,
            state: key.state,
        }
    }
}

/// Result of a compile: the whole stylesheet plus what changed since the
/// previous compile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileDelta {
    pub css_text: String,
    /// Rules added or whose text changed.
    pub upserted: Vec<RuleId>,
    pub removed: Vec<RuleId>,
    /// Whether every rule was rebuilt.
    pub full: bool,
}

impl CompileDelta {
    pub fn is_empty(&self) -> bool {
        self.upserted.is_empty() && self.removed.is_empty()
    }
}

/// Instances a committed transaction can have restyled.
enum Affected {
    Everything,
    Instances(BTreeSet<String>),
}

/// Keeps a [`CssEngine`] in sync with project data.
#[derive(Debug, Default)]
pub struct StyleCompiler {
    options: CompilerOptions,
    engine: CssEngine,
}

impl StyleCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            engine: CssEngine::new(),
        }
    }

    #[inline]
    pub const fn options(&self) -> CompilerOptions {
        self.options
    }

    #[inline]
    pub const fn engine(&self) -> &CssEngine {
        &self.engine
    }

    /// Current stylesheet without recompiling.
    pub fn css_text(&mut self) -> String {
        self.engine.css_text().to_owned()
    }

    /// Rebuild every rule from scratch.
    ///
    /// # Errors
    /// Returns [`CompileError::Breakpoints`] when the breakpoint set does not
    /// have exactly one base breakpoint. The previous output is kept.
    pub fn compile(&mut self, project: ProjectView<'_>) -> Result<CompileDelta, CompileError> {
        let _span = info_span!("css.compile", instances = project.instances.len()).entered();
        validate_breakpoints(project.breakpoints.values())?;

        let previous: BTreeSet<RuleId> = self
            .engine
            .rule_ids()
            .into_iter()
            .map(|(breakpoint_id, key)| RuleId::from_parts(breakpoint_id, key))
            .collect();
        self.engine.clear_rules();
        self.engine.set_breakpoints(project.breakpoints.values());

        let index = SourceIndex::new(project);
        let mut upserted = Vec::new();
        for instance_id in project.instances.keys() {
            for resolved in resolve_with_index(project, &index, instance_id, self.options.selector)
            {
                let key = RuleKey::new(instance_id.as_str(), resolved.state);
                self.engine.upsert_rule(&resolved.breakpoint_id, key.clone(), &resolved.rule);
                upserted.push(RuleId::from_parts(resolved.breakpoint_id, key));
            }
        }
        let current: BTreeSet<&RuleId> = upserted.iter().collect();
        let removed = previous
            .into_iter()
            .filter(|rule| !current.contains(rule))
            .collect();
        debug!("compiled {} rules", upserted.len());
        Ok(CompileDelta {
            css_text: self.engine.css_text().to_owned(),
            upserted,
            removed,
            full: true,
        })
    }

    /// Recompute only the rules of `instance_ids`.
    ///
    /// Falls back to [`StyleCompiler::compile`] when the breakpoint set
    /// changed since the last compile.
    ///
    /// # Errors
    /// Same as [`StyleCompiler::compile`].
    pub fn recompile_instances<'id, I>(
        &mut self,
        project: ProjectView<'_>,
        instance_ids: I,
    ) -> Result<CompileDelta, CompileError>
    where
        I: IntoIterator<Item = &'id str>,
    {
        validate_breakpoints(project.breakpoints.values())?;
        if !self.engine.has_breakpoints(project.breakpoints) {
            return self.compile(project);
        }
        let _span = info_span!("css.compile", incremental = true).entered();

        let index = SourceIndex::new(project);
        let mut delta = CompileDelta::default();
        for instance_id in instance_ids {
            let stale: BTreeSet<(String, RuleKey)> =
                self.engine.rules_for_instance(instance_id).into_iter().collect();
            let mut fresh = BTreeSet::new();
            if project.instances.contains_key(instance_id) {
                for resolved in
                    resolve_with_index(project, &index, instance_id, self.options.selector)
                {
                    let key = RuleKey::new(instance_id, resolved.state);
                    if self.engine.upsert_rule(&resolved.breakpoint_id, key.clone(), &resolved.rule) {
                        delta
                            .upserted
                            .push(RuleId::from_parts(resolved.breakpoint_id.clone(), key.clone()));
                    }
                    fresh.insert((resolved.breakpoint_id, key));
                }
            }
            for (breakpoint_id, key) in stale.difference(&fresh) {
                if self.engine.remove_rule(breakpoint_id, key) {
                    delta
                        .removed
                        .push(RuleId::from_parts(breakpoint_id.clone(), key.clone()));
                }
            }
        }
        delta.css_text = self.engine.css_text().to_owned();
        Ok(delta)
    }

    /// Bring the stylesheet up to date after `transaction` was committed to
    /// `project`.
    ///
    /// # Errors
    /// Same as [`StyleCompiler::compile`].
    pub fn apply_transaction(
        &mut self,
        project: ProjectView<'_>,
        transaction: &Transaction,
    ) -> Result<CompileDelta, CompileError> {
        match affected_instances(project, transaction) {
            Affected::Everything => self.compile(project),
            Affected::Instances(ids) => {
                self.recompile_instances(project, ids.iter().map(String::as_str))
            }
        }
    }
}

fn affected_instances(project: ProjectView<'_>, transaction: &Transaction) -> Affected {
    let mut instance_ids = BTreeSet::new();
    let mut source_ids = BTreeSet::new();
    for change in &transaction.changes {
        match change.namespace {
            Namespace::Breakpoints | Namespace::Assets => return Affected::Everything,
            Namespace::Props => {}
            Namespace::Instances | Namespace::StyleSourceSelections | Namespace::StyleSources => {
                for patch in &change.patches {
                    match patch.key() {
                        Ok(key) if change.namespace == Namespace::StyleSources => {
                            source_ids.insert(key);
                        }
                        Ok(key) => {
                            instance_ids.insert(key);
                        }
                        Err(error) => {
                            warn!("unreadable patch path, recompiling everything: {error}");
                            return Affected::Everything;
                        }
                    }
                }
            }
            Namespace::Styles => {
                for patch in &change.patches {
                    let source = patch
                        .value
                        .as_ref()
                        .and_then(|value| serde_json::from_value::<StyleDecl>(value.clone()).ok())
                        .map(|decl| decl.style_source_id)
                        .or_else(|| {
                            patch
                                .key()
                                .ok()
                                .and_then(|key| StyleDeclKey::style_source_id(&key))
                        });
                    match source {
                        Some(source) => {
                            source_ids.insert(source);
                        }
                        None => return Affected::Everything,
                    }
                }
            }
        }
    }
    if !source_ids.is_empty() {
        for selection in project.style_source_selections.values() {
            if selection.values.iter().any(|id| source_ids.contains(id)) {
                instance_ids.insert(selection.instance_id.clone());
            }
        }
    }
    Affected::Instances(instance_ids)
}
