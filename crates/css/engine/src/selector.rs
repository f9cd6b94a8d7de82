//! Selector naming for instance rules.

use serde::{Deserialize, Serialize};

/// How an instance is addressed in generated CSS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorStrategy {
    /// `[data-ws-id="<id>"]`, used on the canvas where every element carries
    /// its instance id.
    #[default]
    DataAttribute,
    /// `.w-<id>` class names for published output.
    Class,
}

/// Selector for `instance_id` in `state` (`:hover`, `::before`, ...).
pub fn instance_selector(
    strategy: SelectorStrategy,
    instance_id: &str,
    state: Option<&str>,
) -> String {
    let mut selector = String::with_capacity(instance_id.len() + 16);
    match strategy {
        SelectorStrategy::DataAttribute => {
            selector.push_str("[data-ws-id=");
            drop(cssparser::serialize_string(instance_id, &mut selector));
            selector.push(']');
        }
        SelectorStrategy::Class => {
            selector.push('.');
            drop(cssparser::serialize_identifier(&format!("w-{instance_id}"), &mut selector));
        }
    }
    if let Some(state) = state {
        selector.push_str(state);
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_strategies() {
        assert_eq!(
            instance_selector(SelectorStrategy::DataAttribute, "abc", None),
            "[data-ws-id=\"abc\"]"
        );
        assert_eq!(
            instance_selector(SelectorStrategy::DataAttribute, "abc", Some(":hover")),
            "[data-ws-id=\"abc\"]:hover"
        );
        assert_eq!(
            instance_selector(SelectorStrategy::Class, "abc", Some("::before")),
            ".w-abc::before"
        );
    }

    #[test]
    fn ids_are_escaped() {
        assert_eq!(
            instance_selector(SelectorStrategy::Class, "a.b", None),
            ".w-a\\.b"
        );
    }
}
