use crate::{Asset, Breakpoint, Instance, Prop, StyleDecl, StyleSource, StyleSourceSelection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Owned copy of every namespace of a project, the JSON snapshot format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSnapshot {
    pub instances: IndexMap<String, Instance>,
    /// Ordered prop list per instance id.
    pub props: IndexMap<String, Vec<Prop>>,
    pub breakpoints: IndexMap<String, Breakpoint>,
    /// Declarations keyed by [`StyleDecl::key`].
    pub styles: IndexMap<String, StyleDecl>,
    pub style_sources: IndexMap<String, StyleSource>,
    /// Selection per instance id.
    pub style_source_selections: IndexMap<String, StyleSourceSelection>,
    pub assets: IndexMap<String, Asset>,
}

impl ProjectSnapshot {
    /// Borrow every namespace at once.
    pub const fn view(&self) -> ProjectView<'_> {
        ProjectView {
            instances: &self.instances,
            breakpoints: &self.breakpoints,
            styles: &self.styles,
            style_sources: &self.style_sources,
            style_source_selections: &self.style_source_selections,
            assets: &self.assets,
        }
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pretty printed JSON.
    ///
    /// # Errors
    /// Only fails if a value cannot be represented in JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn insert_instance(&mut self, instance: Instance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    pub fn insert_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.breakpoints.insert(breakpoint.id.clone(), breakpoint);
    }

    pub fn insert_style_source(&mut self, source: StyleSource) {
        self.style_sources.insert(source.id().to_owned(), source);
    }

    pub fn insert_style(&mut self, decl: StyleDecl) {
        self.styles.insert(decl.key().into(), decl);
    }

    pub fn select_sources<I, S>(&mut self, instance_id: &str, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style_source_selections.insert(
            instance_id.to_owned(),
            StyleSourceSelection {
                instance_id: instance_id.to_owned(),
                values: sources.into_iter().map(Into::into).collect(),
            },
        );
    }
}

/// Borrowed view of the namespaces the CSS compiler reads.
#[derive(Clone, Copy, Debug)]
pub struct ProjectView<'data> {
    pub instances: &'data IndexMap<String, Instance>,
    pub breakpoints: &'data IndexMap<String, Breakpoint>,
    pub styles: &'data IndexMap<String, StyleDecl>,
    pub style_sources: &'data IndexMap<String, StyleSource>,
    pub style_source_selections: &'data IndexMap<String, StyleSourceSelection>,
    pub assets: &'data IndexMap<String, Asset>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_values::StyleValue;

    #[test]
    fn json_round_trip_keeps_order() {
        let mut snapshot = ProjectSnapshot::default();
        snapshot.insert_breakpoint(Breakpoint::base("base"));
        snapshot.insert_breakpoint(Breakpoint::max("mobile", 479));
        snapshot.insert_instance(Instance::new("body", "Body"));
        snapshot.insert_style_source(StyleSource::Local { id: "local".into() });
        snapshot.insert_style(StyleDecl::new("local", "base", "color", StyleValue::keyword("red")));
        snapshot.insert_style(StyleDecl::new("local", "base", "display", StyleValue::keyword("flex")));
        snapshot.select_sources("body", ["local"]);

        let text = snapshot.to_json().unwrap();
        let parsed = ProjectSnapshot::from_json(&text).unwrap();
        assert_eq!(parsed, snapshot);
        let keys: Vec<&String> = parsed.styles.keys().collect();
        assert_eq!(keys, ["local:base:color:", "local:base:display:"]);
    }

    #[test]
    fn missing_namespaces_default_to_empty() {
        let parsed = ProjectSnapshot::from_json("{\"instances\":{}}").unwrap();
        assert!(parsed.breakpoints.is_empty());
    }
}
