//! Normalised CSS property names.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Properties whose bare numbers are meaningful, so a `0` stays unitless.
const UNITLESS_NUMBER: &[&str] = &[
    "line-height",
    "opacity",
    "z-index",
    "flex-grow",
    "flex-shrink",
    "order",
    "font-weight",
    "orphans",
    "widows",
    "column-count",
    "fill-opacity",
    "stroke-opacity",
    "zoom",
];

/// Properties whose values are comma separated layers.
const LAYERED: &[&str] = &[
    "box-shadow",
    "text-shadow",
    "background-image",
    "background-position-x",
    "background-position-y",
    "background-size",
    "background-repeat",
    "background-attachment",
    "background-clip",
    "background-origin",
    "background-blend-mode",
    "transition",
    "transition-property",
    "transition-duration",
    "transition-timing-function",
    "transition-delay",
];

/// Shorthands written as a space separated list of sides or corners.
const TUPLE: &[&str] = &[
    "margin",
    "padding",
    "inset",
    "gap",
    "border-width",
    "border-style",
    "border-color",
    "border-radius",
    "scroll-margin",
    "scroll-padding",
    "overflow",
    "place-items",
    "place-content",
    "object-position",
    "transform-origin",
];

/// A CSS property name in kebab case.
///
/// camelCase input (`backgroundColor`) is hyphenated and everything is
/// lowercased; custom properties (`--brand`) are kept exactly as written
/// since they are case sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CssProperty(String);

impl CssProperty {
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.starts_with("--") {
            return Self(trimmed.to_owned());
        }
        let mut out = String::with_capacity(trimmed.len() + 4);
        let mut previous: Option<char> = None;
        for ch in trimmed.chars() {
            if ch.is_ascii_uppercase() && previous.is_some_and(|prev| prev.is_ascii_lowercase()) {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            previous = Some(ch);
        }
        Self(out)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `--*` custom property.
    #[inline]
    pub fn is_custom(&self) -> bool {
        self.0.starts_with("--")
    }

    #[inline]
    pub fn is_unitless_number(&self) -> bool {
        UNITLESS_NUMBER.contains(&self.0.as_str())
    }

    /// Comma separated layers, see [`StyleValue::Layers`](crate::StyleValue::Layers).
    #[inline]
    pub fn is_layered(&self) -> bool {
        LAYERED.contains(&self.0.as_str())
    }

    /// Space separated shorthand, see [`StyleValue::Tuple`](crate::StyleValue::Tuple).
    #[inline]
    pub fn is_tuple(&self) -> bool {
        TUPLE.contains(&self.0.as_str())
    }

    #[inline]
    pub fn is_font_family(&self) -> bool {
        self.0 == "font-family"
    }
}

impl From<String> for CssProperty {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&str> for CssProperty {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<CssProperty> for String {
    fn from(property: CssProperty) -> Self {
        property.0
    }
}

impl fmt::Display for CssProperty {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
