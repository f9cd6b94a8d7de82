//! [`StyleValue`] to CSS text.

use crate::parse::family_needs_quotes;
use crate::{ImageSource, StyleValue, Unit};
use core::fmt::Write as _;

/// Resolves asset ids to public URLs while serialising.
pub trait AssetResolver {
    /// URL for `asset_id`, `None` when the asset is unknown.
    fn asset_url(&self, asset_id: &str) -> Option<String>;
}

/// Resolver for contexts without an asset table. Every asset is unknown.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    #[inline]
    fn asset_url(&self, _asset_id: &str) -> Option<String> {
        None
    }
}

/// Shortest decimal text for `number`; `-0` prints as `0`.
pub fn format_number(number: f64) -> String {
    if number == 0.0 {
        return "0".to_owned();
    }
    format!("{number}")
}

/// Serialise `value` as CSS text without resolving assets.
#[inline]
pub fn to_value(value: &StyleValue) -> String {
    to_value_with(value, &NoAssets)
}

/// Serialise `value` as CSS text, resolving `image` assets through `assets`.
/// Unknown assets serialise as `none`.
pub fn to_value_with(value: &StyleValue, assets: &dyn AssetResolver) -> String {
    let mut out = String::new();
    write_value(&mut out, value, assets);
    out
}

fn write_value(out: &mut String, value: &StyleValue, assets: &dyn AssetResolver) {
    match value {
        StyleValue::Keyword { value } | StyleValue::Unparsed { value } | StyleValue::Invalid { value } => {
            out.push_str(value);
        }
        StyleValue::Unit { unit, value } => {
            out.push_str(&format_number(*value));
            if *value != 0.0 || *unit != Unit::Px {
                out.push_str(unit.as_str());
            }
        }
        StyleValue::Rgb { r, g, b, alpha } => {
            drop(write!(out, "rgba({r}, {g}, {b}, {})", format_number(*alpha)));
        }
        StyleValue::FontFamily { value } => {
            for (index, family) in value.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                if family_needs_quotes(family) {
                    drop(cssparser::serialize_string(family, out));
                } else {
                    out.push_str(family);
                }
            }
        }
        StyleValue::Image { value } => match value {
            ImageSource::Url { url } => write_url(out, url),
            ImageSource::Asset { value } => match assets.asset_url(value) {
                Some(url) => write_url(out, &url),
                None => out.push_str("none"),
            },
        },
        StyleValue::Layers { value } => write_joined(out, value, ", ", assets),
        StyleValue::Tuple { value } => write_joined(out, value, " ", assets),
        StyleValue::Var { value, fallback } => {
            drop(write!(out, "var(--{value}"));
            if let Some(fallback) = fallback {
                drop(write!(out, ", {fallback}"));
            }
            out.push(')');
        }
    }
}

fn write_url(out: &mut String, url: &str) {
    out.push_str("url(");
    drop(cssparser::serialize_string(url, out));
    out.push(')');
}

fn write_joined(out: &mut String, items: &[StyleValue], separator: &str, assets: &dyn AssetResolver) {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push_str(separator);
        }
        write_value(out, item, assets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CssProperty, parse_css_value};

    struct OneAsset;

    impl AssetResolver for OneAsset {
        fn asset_url(&self, asset_id: &str) -> Option<String> {
            (asset_id == "hero").then(|| "/cdn/hero.png".to_owned())
        }
    }

    #[test]
    fn numbers_and_units() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(to_value(&StyleValue::px(0.0)), "0");
        assert_eq!(to_value(&StyleValue::unit(0.0, Unit::Ms)), "0ms");
        assert_eq!(to_value(&StyleValue::unit(0.0, Unit::Em)), "0em");
        assert_eq!(to_value(&StyleValue::unit(50.0, Unit::Percent)), "50%");
        assert_eq!(to_value(&StyleValue::unit(2.0, Unit::Number)), "2");
    }

    #[test]
    fn colors_families_and_vars() {
        let color = StyleValue::Rgb {
            r: 1,
            g: 2,
            b: 3,
            alpha: 0.5,
        };
        assert_eq!(to_value(&color), "rgba(1, 2, 3, 0.5)");
        let families = StyleValue::FontFamily {
            value: vec!["Open Sans".into(), "sans-serif".into()],
        };
        assert_eq!(to_value(&families), "\"Open Sans\", sans-serif");
        let var = StyleValue::Var {
            value: "brand".into(),
            fallback: Some("red".into()),
        };
        assert_eq!(to_value(&var), "var(--brand, red)");
    }

    #[test]
    fn assets_resolve_or_fall_back_to_none() {
        let hero = StyleValue::Image {
            value: ImageSource::Asset {
                value: "hero".into(),
            },
        };
        let missing = StyleValue::Image {
            value: ImageSource::Asset {
                value: "gone".into(),
            },
        };
        assert_eq!(to_value_with(&hero, &OneAsset), "url(\"/cdn/hero.png\")");
        assert_eq!(to_value_with(&missing, &OneAsset), "none");
        assert_eq!(to_value(&hero), "none");
    }

    #[test]
    fn serialised_text_parses_back_to_the_same_value() {
        let cases = [
            ("width", "10px"),
            ("margin", "1px auto 0 2em"),
            ("color", "rgba(10, 20, 30, 0.4)"),
            ("opacity", "0"),
            ("font-family", "\"Open Sans\", Roboto, serif"),
            ("box-shadow", "1px 2px 3px red, inset 0 0 1px blue"),
            ("background-image", "url(\"a.png\"), none"),
            ("transition-duration", "0s, 150ms"),
            ("color", "var(--brand)"),
            ("width", "calc(100% - 10px)"),
        ];
        for (name, text) in cases {
            let property = CssProperty::new(name);
            let parsed = parse_css_value(&property, text);
            assert!(!parsed.is_invalid(), "{name}: {text}");
            let again = parse_css_value(&property, &to_value(&parsed));
            assert_eq!(again, parsed, "{name}: {text}");
        }
    }

    #[test]
    fn parsed_values_serialise_back_unchanged() {
        let cases = [
            ("margin-top", StyleValue::unit(0.0, Unit::Em)),
            ("margin-top", StyleValue::px(0.0)),
            ("padding", StyleValue::Tuple {
                value: vec![StyleValue::px(4.0)],
            }),
            ("box-shadow", StyleValue::Layers {
                value: vec![StyleValue::keyword("none")],
            }),
            ("font-family", StyleValue::FontFamily {
                value: vec!["\"serif\"".into(), "monospace".into()],
            }),
        ];
        for (name, value) in cases {
            let text = to_value(&value);
            assert_eq!(parse_css_value(&CssProperty::new(name), &text), value, "{name}: {text}");
        }
    }
}
