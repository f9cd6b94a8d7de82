use core::fmt;
use css_values::{CssProperty, StyleValue};
use serde::{Deserialize, Serialize};

/// A named bag of declarations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StyleSource {
    /// Reusable, may be selected by many instances.
    Token { id: String, name: String },
    /// Belongs to exactly one instance and dies with it.
    Local { id: String },
}

impl StyleSource {
    #[inline]
    pub fn id(&self) -> &str {
        match self {
            Self::Token { id, .. } | Self::Local { id } => id,
        }
    }

    #[inline]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Style sources applied to one instance. Later entries win on conflicts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSourceSelection {
    pub instance_id: String,
    pub values: Vec<String>,
}

/// One property assignment scoped to a source, breakpoint and state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDecl {
    pub style_source_id: String,
    pub breakpoint_id: String,
    /// Pseudo-class or pseudo-element suffix such as `:hover`; `None` is the
    /// base state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub property: CssProperty,
    pub value: StyleValue,
}

impl StyleDecl {
    pub fn new(
        style_source_id: impl Into<String>,
        breakpoint_id: impl Into<String>,
        property: impl Into<CssProperty>,
        value: StyleValue,
    ) -> Self {
        Self {
            style_source_id: style_source_id.into(),
            breakpoint_id: breakpoint_id.into(),
            state: None,
            property: property.into(),
            value,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Map key of this declaration in the `styles` namespace.
    pub fn key(&self) -> StyleDeclKey {
        StyleDeclKey::new(
            &self.style_source_id,
            &self.breakpoint_id,
            self.state.as_deref(),
            &self.property,
        )
    }
}

/// `"<source>:<breakpoint>:<property>:<state>"`, unique per declaration slot.
///
/// `:` and `\` inside a part are escaped with `\`, so ids containing `:`
/// cannot collide and [`StyleDeclKey::style_source_id`] reads the first
/// part back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleDeclKey(String);

/// Escape character of key parts.
const ESCAPE: char = '\\';
/// Separator between key parts.
const SEPARATOR: char = ':';

impl StyleDeclKey {
    pub fn new(
        style_source_id: &str,
        breakpoint_id: &str,
        state: Option<&str>,
        property: &CssProperty,
    ) -> Self {
        let parts = [
            style_source_id,
            breakpoint_id,
            property.as_str(),
            state.unwrap_or_default(),
        ];
        let mut key = String::new();
        for (index, part) in parts.into_iter().enumerate() {
            if index > 0 {
                key.push(SEPARATOR);
            }
            for ch in part.chars() {
                if ch == SEPARATOR || ch == ESCAPE {
                    key.push(ESCAPE);
                }
                key.push(ch);
            }
        }
        Self(key)
    }

    /// Source id of a key as produced by [`StyleDeclKey::new`], `None` if
    /// `key` has no separator.
    pub fn style_source_id(key: &str) -> Option<String> {
        let mut source = String::new();
        let mut chars = key.chars();
        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => source.push(chars.next()?),
                SEPARATOR => return Some(source),
                _ => source.push(ch),
            }
        }
        None
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<StyleDeclKey> for String {
    fn from(key: StyleDeclKey) -> Self {
        key.0
    }
}

impl fmt::Display for StyleDeclKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
