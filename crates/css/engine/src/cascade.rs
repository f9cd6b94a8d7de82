//! Merging the declarations of an instance's selected style sources.

use crate::{SelectorStrategy, StyleRule, instance_selector};
use css_values::{AssetResolver, CssProperty, StyleValue, to_value_with};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashMap;
use studio_data::{Asset, ProjectView, StyleDecl};

/// Resolves image assets against the project's asset table.
pub struct AssetTable<'data>(pub &'data IndexMap<String, Asset>);

impl AssetResolver for AssetTable<'_> {
    fn asset_url(&self, asset_id: &str) -> Option<String> {
        self.0.get(asset_id).map(|asset| asset.path.clone())
    }
}

/// Declarations grouped by style source id, in `styles` map order.
pub(crate) struct SourceIndex<'data> {
    by_source: HashMap<&'data str, Vec<&'data StyleDecl>>,
}

impl<'data> SourceIndex<'data> {
    pub(crate) fn new(project: ProjectView<'data>) -> Self {
        let mut by_source: HashMap<&str, Vec<&StyleDecl>> = HashMap::new();
        for decl in project.styles.values() {
            by_source
                .entry(decl.style_source_id.as_str())
                .or_default()
                .push(decl);
        }
        Self { by_source }
    }

    fn decls(&self, source_id: &str) -> &[&'data StyleDecl] {
        self.by_source
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// One compiled rule of an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRule {
    pub breakpoint_id: String,
    pub state: Option<String>,
    pub rule: StyleRule,
}

/// Every rule of `instance_id`, one per (breakpoint, state) that has at least
/// one valid declaration.
///
/// Sources apply in selection order, so a later source overrides an earlier
/// one on the same property while the property keeps its first position.
/// Invalid values and declarations on unknown breakpoints are skipped.
pub fn resolve_instance_rules(
    project: ProjectView<'_>,
    instance_id: &str,
    strategy: SelectorStrategy,
) -> Vec<ResolvedRule> {
    let index = SourceIndex::new(project);
    resolve_with_index(project, &index, instance_id, strategy)
}

pub(crate) fn resolve_with_index(
    project: ProjectView<'_>,
    index: &SourceIndex<'_>,
    instance_id: &str,
    strategy: SelectorStrategy,
) -> Vec<ResolvedRule> {
    let Some(selection) = project.style_source_selections.get(instance_id) else {
        return Vec::new();
    };
    let mut groups: IndexMap<(&str, Option<&str>), IndexMap<&CssProperty, &StyleValue>> =
        IndexMap::new();
    for source_id in &selection.values {
        for decl in index.decls(source_id) {
            if !project.breakpoints.contains_key(&decl.breakpoint_id) {
                debug!(
                    "skipping {} on unknown breakpoint {}",
                    decl.property, decl.breakpoint_id
                );
                continue;
            }
            if decl.value.is_invalid() {
                warn!(
                    "skipping invalid value for {} on instance {instance_id}",
                    decl.property
                );
                continue;
            }
            groups
                .entry((decl.breakpoint_id.as_str(), decl.state.as_deref()))
                .or_default()
                .insert(&decl.property, &decl.value);
        }
    }
    let assets = AssetTable(project.assets);
    groups
        .into_iter()
        .map(|((breakpoint_id, state), properties)| ResolvedRule {
            breakpoint_id: breakpoint_id.to_owned(),
            state: state.map(str::to_owned),
            rule: StyleRule {
                selector: instance_selector(strategy, instance_id, state),
                declarations: properties
                    .into_iter()
                    .map(|(property, value)| (property.clone(), to_value_with(value, &assets)))
                    .collect(),
            },
        })
        .collect()
}
