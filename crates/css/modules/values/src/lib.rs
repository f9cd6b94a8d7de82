//! Style value model for the builder's style panel and CSS output.
//!
//! A [`StyleValue`] is the typed form of whatever the user typed into a
//! property field. Parsing is total: text that cannot be understood is kept
//! verbatim as [`StyleValue::Invalid`] so nothing the user entered is lost.
//! Serialising goes through [`to_value`] / [`to_value_with`].

#![forbid(unsafe_code)]

mod color;
mod parse;
mod property;
mod serialize;
mod unit;
mod value;

pub use color::parse_hex_color;
pub use parse::parse_css_value;
pub use property::CssProperty;
pub use serialize::{AssetResolver, NoAssets, format_number, to_value, to_value_with};
pub use unit::Unit;
pub use value::{ImageSource, StyleValue};

use thiserror::Error;

/// Errors raised by the strict helpers of this crate.
///
/// [`parse_css_value`] itself never fails; these surface from the typed
/// constructors such as `Unit::from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The unit suffix is not one the style model knows about.
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    /// A `#rgb`-style color with the wrong digit count or non-hex digits.
    #[error("malformed hex color `#{0}`")]
    MalformedHex(String),
}
