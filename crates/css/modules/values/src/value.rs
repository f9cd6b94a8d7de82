//! The tagged union stored for every (source, breakpoint, state, property).

use crate::Unit;
use serde::{Deserialize, Serialize};

/// Where an image value points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ImageSource {
    /// An uploaded asset, resolved to a URL at serialisation time.
    Asset { value: String },
    /// A literal URL typed by the user.
    Url { url: String },
}

/// Typed CSS property value.
///
/// The wire form is `{ "type": "<kind>", ... }`, shared with the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StyleValue {
    /// A bare identifier such as `auto` or `flex`.
    Keyword {
        value: String,
    },
    /// A number with its unit; [`Unit::Number`] for unitless numbers.
    Unit {
        unit: Unit,
        value: f64,
    },
    /// An sRGB color with `alpha` in `0..=1`.
    Rgb {
        r: u8,
        g: u8,
        b: u8,
        alpha: f64,
    },
    /// Family names in priority order, without quotes unless the name is a
    /// quoted generic family.
    FontFamily {
        value: Vec<String>,
    },
    /// An image reference, see [`ImageSource`].
    Image {
        value: ImageSource,
    },
    /// Comma separated layers (`box-shadow`, `background-image`, ...).
    Layers {
        value: Vec<StyleValue>,
    },
    /// Space separated units and keywords, e.g. `margin: 1px auto`.
    Tuple {
        value: Vec<StyleValue>,
    },
    /// Reference to a design token exposed as a custom property. `value` has
    /// no leading `--`.
    Var {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<String>,
    },
    /// Well formed CSS the model does not break down (`calc()`, gradients).
    Unparsed {
        value: String,
    },
    /// Text that failed to parse, kept for display.
    Invalid {
        value: String,
    },
}

impl StyleValue {
    #[inline]
    pub fn keyword(value: impl Into<String>) -> Self {
        Self::Keyword {
            value: value.into(),
        }
    }

    #[inline]
    pub const fn unit(value: f64, unit: Unit) -> Self {
        Self::Unit { unit, value }
    }

    /// A pixel length.
    #[inline]
    pub const fn px(value: f64) -> Self {
        Self::Unit {
            unit: Unit::Px,
            value,
        }
    }

    /// Unparseable input, kept verbatim for display.
    #[inline]
    pub fn invalid(value: impl Into<String>) -> Self {
        Self::Invalid {
            value: value.into(),
        }
    }

    /// Short kind name, matching the serialized `type` tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Keyword { .. } => "keyword",
            Self::Unit { .. } => "unit",
            Self::Rgb { .. } => "rgb",
            Self::FontFamily { .. } => "fontFamily",
            Self::Image { .. } => "image",
            Self::Layers { .. } => "layers",
            Self::Tuple { .. } => "tuple",
            Self::Var { .. } => "var",
            Self::Unparsed { .. } => "unparsed",
            Self::Invalid { .. } => "invalid",
        }
    }

    /// Whether this value, or any layer/tuple item inside it, is invalid.
    ///
    /// Numbers that are not finite count as invalid; they have no CSS or
    /// JSON form.
    pub fn is_invalid(&self) -> bool {
        match self {
            Self::Invalid { .. } => true,
            Self::Unit { value, .. } | Self::Rgb { alpha: value, .. } => !value.is_finite(),
            Self::Layers { value } | Self::Tuple { value } => value.iter().any(Self::is_invalid),
            _ => false,
        }
    }

    /// Asset ids referenced by this value.
    pub fn asset_ids(&self) -> Vec<&str> {
        match self {
            Self::Image {
                value: ImageSource::Asset { value },
            } => vec![value.as_str()],
            Self::Layers { value } | Self::Tuple { value } => {
                value.iter().flat_map(Self::asset_ids).collect()
            }
            _ => Vec::new(),
        }
    }
}
