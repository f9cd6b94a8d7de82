//! Rule storage and stylesheet rendering.

use core::fmt::Write as _;
use css_media_queries::{Breakpoint, media_query_text, sort_for_emission};
use css_values::CssProperty;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

/// Identifies a rule inside one media block.
///
/// Ordered by instance id, then state with the base state first, which is
/// the order rules are emitted in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    pub instance_id: String,
    pub state: Option<String>,
}

impl RuleKey {
    pub fn new(instance_id: impl Into<String>, state: Option<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            state,
        }
    }
}

/// A selector and its serialised declarations, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<(CssProperty, String)>,
}

impl StyleRule {
    /// Rule text, one declaration per line, ending in a newline.
    pub fn to_css(&self) -> String {
        let mut text = String::with_capacity(self.selector.len() + self.declarations.len() * 24);
        text.push_str(&self.selector);
        text.push_str(" {\n");
        for (property, value) in &self.declarations {
            drop(writeln!(text, "  {property}: {value};"));
        }
        text.push_str("}\n");
        text
    }
}

/// Serialised rules grouped per breakpoint, rendered on demand.
///
/// Rendering is memoised: [`CssEngine::css_text`] only rebuilds the
/// stylesheet after a rule or the breakpoint set actually changed.
#[derive(Debug, Default)]
pub struct CssEngine {
    breakpoints: IndexMap<String, Breakpoint>,
    rules: HashMap<String, BTreeMap<RuleKey, String>>,
    rendered: Option<String>,
}

impl CssEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the breakpoint set. Rules of breakpoints that disappeared are
    /// dropped. Returns whether anything changed.
    pub fn set_breakpoints<'bp, I>(&mut self, breakpoints: I) -> bool
    where
        I: IntoIterator<Item = &'bp Breakpoint>,
    {
        let next: IndexMap<String, Breakpoint> = breakpoints
            .into_iter()
            .map(|breakpoint| (breakpoint.id.clone(), breakpoint.clone()))
            .collect();
        if next == self.breakpoints {
            return false;
        }
        self.rules.retain(|breakpoint_id, _| next.contains_key(breakpoint_id));
        self.breakpoints = next;
        self.rendered = None;
        true
    }

    /// Whether the engine holds exactly this breakpoint set.
    pub fn has_breakpoints(&self, breakpoints: &IndexMap<String, Breakpoint>) -> bool {
        &self.breakpoints == breakpoints
    }

    /// Insert or replace a rule. Returns `false` when the stored text was
    /// already identical.
    pub fn upsert_rule(&mut self, breakpoint_id: &str, key: RuleKey, rule: &StyleRule) -> bool {
        let text = rule.to_css();
        let block = self.rules.entry(breakpoint_id.to_owned()).or_default();
        if block.get(&key) == Some(&text) {
            return false;
        }
        block.insert(key, text);
        self.rendered = None;
        true
    }

    /// Remove a rule, returning whether it existed.
    pub fn remove_rule(&mut self, breakpoint_id: &str, key: &RuleKey) -> bool {
        let removed = self
            .rules
            .get_mut(breakpoint_id)
            .and_then(|block| block.remove(key))
            .is_some();
        if removed {
            self.rendered = None;
        }
        removed
    }

    /// Every `(breakpoint id, rule key)` stored for `instance_id`.
    pub fn rules_for_instance(&self, instance_id: &str) -> Vec<(String, RuleKey)> {
        let start = RuleKey::new(instance_id, None);
        let mut found = Vec::new();
        for (breakpoint_id, block) in &self.rules {
            found.extend(
                block
                    .range(start.clone()..)
                    .take_while(|(key, _)| key.instance_id == instance_id)
                    .map(|(key, _)| (breakpoint_id.clone(), key.clone())),
            );
        }
        found
    }

    /// Every stored `(breakpoint id, rule key)`.
    pub fn rule_ids(&self) -> Vec<(String, RuleKey)> {
        self.rules
            .iter()
            .flat_map(|(breakpoint_id, block)| {
                block.keys().map(|key| (breakpoint_id.clone(), key.clone()))
            })
            .collect()
    }

    pub fn rule_text(&self, breakpoint_id: &str, key: &RuleKey) -> Option<&str> {
        self.rules.get(breakpoint_id)?.get(key).map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    /// Drop every rule, keeping the breakpoints.
    pub fn clear_rules(&mut self) {
        if self.rules.is_empty() {
            return;
        }
        self.rules.clear();
        self.rendered = None;
    }

    /// The full stylesheet.
    ///
    /// Base rules are emitted unwrapped, every other breakpoint inside its
    /// `@media` block, blocks in cascade emission order.
    pub fn css_text(&mut self) -> &str {
        let Self {
            breakpoints,
            rules,
            rendered,
        } = self;
        rendered.get_or_insert_with(|| render(breakpoints, rules))
    }
}

fn render(
    breakpoints: &IndexMap<String, Breakpoint>,
    rules: &HashMap<String, BTreeMap<RuleKey, String>>,
) -> String {
    let mut out = String::new();
    for breakpoint in sort_for_emission(breakpoints.values()) {
        let Some(block) = rules.get(&breakpoint.id).filter(|block| !block.is_empty()) else {
            continue;
        };
        match media_query_text(breakpoint) {
            None => block.values().for_each(|text| out.push_str(text)),
            Some(prelude) => {
                out.push_str(&prelude);
                out.push_str(" {\n");
                for line in block.values().flat_map(|text| text.lines()) {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str("}\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(selector: &str, property: &str, value: &str) -> StyleRule {
        StyleRule {
            selector: selector.to_owned(),
            declarations: vec![(CssProperty::new(property), value.to_owned())],
        }
    }

    #[test]
    fn base_unwrapped_media_wrapped() {
        let mut engine = CssEngine::new();
        engine.set_breakpoints(&[Breakpoint::max("mobile", 479), Breakpoint::base("base")]);
        engine.upsert_rule("mobile", RuleKey::new("a", None), &rule(".a", "color", "blue"));
        engine.upsert_rule("base", RuleKey::new("a", None), &rule(".a", "color", "red"));
        assert_eq!(
            engine.css_text(),
            ".a {\n  color: red;\n}\n@media all and (max-width: 479px) {\n  .a {\n    color: blue;\n  }\n}\n"
        );
    }

    #[test]
    fn base_state_sorts_before_pseudo_states() {
        let mut engine = CssEngine::new();
        engine.set_breakpoints(&[Breakpoint::base("base")]);
        engine.upsert_rule("base", RuleKey::new("a", Some(":hover".into())), &rule(".a:hover", "color", "red"));
        engine.upsert_rule("base", RuleKey::new("b", None), &rule(".b", "color", "red"));
        engine.upsert_rule("base", RuleKey::new("a", None), &rule(".a", "color", "red"));
        let text = engine.css_text().to_owned();
        let order: Vec<&str> = text.lines().filter(|line| line.ends_with('{')).collect();
        assert_eq!(order, [".a {", ".a:hover {", ".b {"]);
    }

    #[test]
    fn unchanged_upsert_keeps_cache() {
        let mut engine = CssEngine::new();
        engine.set_breakpoints(&[Breakpoint::base("base")]);
        let key = RuleKey::new("a", None);
        assert!(engine.upsert_rule("base", key.clone(), &rule(".a", "color", "red")));
        assert!(!engine.css_text().is_empty());
        assert!(!engine.upsert_rule("base", key.clone(), &rule(".a", "color", "red")));
        assert!(engine.rendered.is_some());
        assert_eq!(engine.rules_for_instance("a"), [("base".to_owned(), key.clone())]);
        assert!(engine.remove_rule("base", &key));
        assert_eq!(engine.css_text(), "");
    }

    #[test]
    fn removing_a_breakpoint_drops_its_rules() {
        let mut engine = CssEngine::new();
        engine.set_breakpoints(&[Breakpoint::base("base"), Breakpoint::max("m", 479)]);
        engine.upsert_rule("m", RuleKey::new("a", None), &rule(".a", "color", "red"));
        assert!(engine.set_breakpoints(&[Breakpoint::base("base")]));
        assert_eq!(engine.rule_count(), 0);
    }
}
