//! Text to [`StyleValue`] parsing on top of `cssparser`'s tokenizer.

use crate::color::parse_rgb_arguments;
use crate::{CssProperty, ImageSource, StyleValue, Unit, parse_hex_color};
use cssparser::{ParseError, Parser, ParserInput, Token};
use log::trace;

/// Generic families are written without quotes; a quoted one names a real
/// font instead.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "emoji",
    "math",
];

/// One top-level piece of a space separated value.
enum Component {
    Value(StyleValue),
    /// Valid CSS the model keeps as raw text.
    Opaque,
    /// Anything that makes the whole input invalid.
    Broken,
}

/// Parse `input` as the value of `property`.
///
/// Never fails: anything that cannot be understood becomes
/// [`StyleValue::Invalid`] holding the trimmed input.
pub fn parse_css_value(property: &CssProperty, input: &str) -> StyleValue {
    let text = input.trim();
    if text.is_empty() || !is_well_formed(text) {
        trace!("invalid value for {property}: {text:?}");
        return StyleValue::invalid(text);
    }
    if property.is_custom() {
        return StyleValue::Unparsed {
            value: text.to_owned(),
        };
    }
    if property.is_font_family() {
        return parse_font_family(text);
    }
    if property.is_layered() {
        return parse_layers(property, text);
    }
    if split_top_level_commas(text).len() > 1 {
        return StyleValue::Unparsed {
            value: text.to_owned(),
        };
    }
    parse_components(property, text)
}

/// Split on top-level commas and parse every layer on its own.
fn parse_layers(property: &CssProperty, text: &str) -> StyleValue {
    let mut layers = Vec::new();
    for layer_text in split_top_level_commas(text) {
        let layer = parse_components(property, layer_text.trim());
        if let StyleValue::Invalid { .. } = layer {
            return StyleValue::invalid(text);
        }
        layers.push(layer);
    }
    StyleValue::Layers { value: layers }
}

/// Parse a space separated value into a single value, a tuple, or an opaque
/// `unparsed` value. Shorthand properties keep a one item tuple.
fn parse_components(property: &CssProperty, text: &str) -> StyleValue {
    if text.is_empty() {
        return StyleValue::invalid(text);
    }
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut values = Vec::new();
    let mut opaque = false;
    loop {
        match next_component(property, &mut parser) {
            None => break,
            Some(Component::Broken) => return StyleValue::invalid(text),
            Some(Component::Opaque) => opaque = true,
            Some(Component::Value(value)) => values.push(value),
        }
    }
    if opaque {
        return StyleValue::Unparsed {
            value: text.to_owned(),
        };
    }
    let tuple_items = values
        .iter()
        .all(|value| matches!(value, StyleValue::Unit { .. } | StyleValue::Keyword { .. }));
    match values.len() {
        0 => StyleValue::invalid(text),
        1 if !(tuple_items && property.is_tuple()) => {
            values.pop().unwrap_or_else(|| StyleValue::invalid(text))
        }
        _ if tuple_items => StyleValue::Tuple { value: values },
        _ => StyleValue::Unparsed {
            value: text.to_owned(),
        },
    }
}

/// Read the next top-level component, `None` at end of input.
fn next_component(property: &CssProperty, parser: &mut Parser<'_, '_>) -> Option<Component> {
    let start = parser.position();
    let token = parser.next().ok()?.clone();
    let raw = parser.slice_from(start).trim();
    let component = match token {
        Token::Dimension { unit, .. } => {
            let Ok(parsed_unit) = unit.as_ref().parse::<Unit>() else {
                return Some(Component::Broken);
            };
            let digits = raw.get(..raw.len().saturating_sub(unit.len())).unwrap_or(raw);
            number_component(digits, |value| StyleValue::unit(value, parsed_unit))
        }
        Token::Percentage { .. } => number_component(raw.trim_end_matches('%'), |value| {
            StyleValue::unit(value, Unit::Percent)
        }),
        Token::Number { .. } => number_component(raw, |value| {
            if value == 0.0 && !property.is_unitless_number() {
                StyleValue::px(0.0)
            } else {
                StyleValue::unit(value, Unit::Number)
            }
        }),
        Token::Ident(name) => Component::Value(StyleValue::keyword(name.as_ref())),
        Token::Hash(digits) | Token::IDHash(digits) => match parse_hex_color(digits.as_ref()) {
            Ok(color) => Component::Value(color),
            Err(_) => Component::Broken,
        },
        Token::UnquotedUrl(url) => Component::Value(StyleValue::Image {
            value: ImageSource::Url {
                url: url.as_ref().to_owned(),
            },
        }),
        Token::Function(name) => function_component(name.as_ref(), parser),
        Token::QuotedString(_)
        | Token::Delim(_)
        | Token::Comma
        | Token::ParenthesisBlock
        | Token::SquareBracketBlock => Component::Opaque,
        _ => Component::Broken,
    };
    Some(component)
}

/// Numbers past the range of `f64` are broken, not infinite.
fn number_component(digits: &str, build: impl FnOnce(f64) -> StyleValue) -> Component {
    parse_finite(digits).map_or(Component::Broken, |value| Component::Value(build(value)))
}

pub(crate) fn parse_finite(digits: &str) -> Option<f64> {
    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn function_component(name: &str, parser: &mut Parser<'_, '_>) -> Component {
    match name.to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => {
            let parsed: Result<Option<StyleValue>, ParseError<'_, ()>> =
                parser.parse_nested_block(|nested| Ok(parse_rgb_arguments(nested)));
            match parsed {
                Ok(Some(color)) => Component::Value(color),
                _ => Component::Broken,
            }
        }
        "url" => {
            let parsed: Result<String, ParseError<'_, ()>> = parser.parse_nested_block(|nested| {
                let url = nested.expect_string()?.as_ref().to_owned();
                nested.expect_exhausted()?;
                Ok(url)
            });
            parsed.map_or(Component::Broken, |url| {
                Component::Value(StyleValue::Image {
                    value: ImageSource::Url { url },
                })
            })
        }
        "var" => {
            let parsed: Result<(String, Option<String>), ParseError<'_, ()>> = parser
                .parse_nested_block(|nested| {
                    let ident = nested.expect_ident()?.as_ref().to_owned();
                    let fallback = if nested.try_parse(Parser::expect_comma).is_ok() {
                        let fallback_start = nested.position();
                        while nested.next_including_whitespace_and_comments().is_ok() {}
                        Some(nested.slice_from(fallback_start).trim().to_owned())
                    } else {
                        nested.expect_exhausted()?;
                        None
                    };
                    Ok((ident, fallback))
                });
            match parsed {
                Ok((ident, fallback)) => ident.strip_prefix("--").map_or(Component::Broken, |name| {
                    Component::Value(StyleValue::Var {
                        value: name.to_owned(),
                        fallback: fallback.filter(|text| !text.is_empty()),
                    })
                }),
                Err(_) => Component::Broken,
            }
        }
        _ => Component::Opaque,
    }
}

/// `font-family` is a comma separated list of quoted strings or ident runs.
fn parse_font_family(text: &str) -> StyleValue {
    let mut families = Vec::new();
    for part in split_top_level_commas(text) {
        let mut input = ParserInput::new(part);
        let mut parser = Parser::new(&mut input);
        let mut words: Vec<String> = Vec::new();
        while let Ok(token) = parser.next() {
            match token {
                Token::QuotedString(family) if words.is_empty() => {
                    if GENERIC_FAMILIES.contains(&family.as_ref()) {
                        words.push(format!("\"{family}\""));
                    } else {
                        words.push(family.to_string());
                    }
                }
                Token::Ident(word) => words.push(word.to_string()),
                _ => return StyleValue::invalid(text),
            }
        }
        if words.is_empty() {
            return StyleValue::invalid(text);
        }
        families.push(words.join(" "));
    }
    StyleValue::FontFamily { value: families }
}

/// Whether a family name must be quoted when serialised.
///
/// A family literally named like a generic one is stored with its quotes
/// and written as is.
pub(crate) fn family_needs_quotes(family: &str) -> bool {
    let quoted_generic = family
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .is_some_and(|inner| GENERIC_FAMILIES.contains(&inner));
    if quoted_generic || GENERIC_FAMILIES.contains(&family) {
        return false;
    }
    family.is_empty()
        || family.starts_with(|ch: char| ch.is_ascii_digit())
        || !family
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '-' || ch == '_')
}

/// Split `text` on commas outside of brackets and strings.
fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(text.get(start..index).unwrap_or_default());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(text.get(start..).unwrap_or_default());
    parts
}

/// Balanced brackets and quotes, no stray `;`, `{`, `}` or `!`.
fn is_well_formed(text: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            ')' | ']' => {
                if stack.pop() != Some(ch) {
                    return false;
                }
            }
            ';' | '{' | '}' | '!' => return false,
            _ => {}
        }
    }
    quote.is_none() && stack.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(property: &str, text: &str) -> StyleValue {
        parse_css_value(&CssProperty::new(property), text)
    }

    #[test]
    fn units_and_keywords() {
        assert_eq!(parse("width", "10px"), StyleValue::px(10.0));
        assert_eq!(parse("width", "1.5rem"), StyleValue::unit(1.5, Unit::Rem));
        assert_eq!(parse("width", "33.3%"), StyleValue::unit(33.3, Unit::Percent));
        assert_eq!(parse("display", "flex"), StyleValue::keyword("flex"));
        assert_eq!(parse("opacity", "0.5"), StyleValue::unit(0.5, Unit::Number));
    }

    #[test]
    fn zero_normalisation() {
        assert_eq!(parse("margin-top", "0em"), StyleValue::unit(0.0, Unit::Em));
        assert_eq!(parse("margin-top", "0"), StyleValue::px(0.0));
        assert_eq!(parse("margin-top", "0px"), StyleValue::px(0.0));
        assert_eq!(parse("opacity", "0"), StyleValue::unit(0.0, Unit::Number));
        assert_eq!(parse("transition-delay", "0s"), StyleValue::Layers {
            value: vec![StyleValue::unit(0.0, Unit::S)]
        });
    }

    #[test]
    fn colors() {
        assert_eq!(parse("color", "#ff0000"), StyleValue::Rgb {
            r: 255,
            g: 0,
            b: 0,
            alpha: 1.0
        });
        assert_eq!(parse("color", "#abc"), StyleValue::Rgb {
            r: 0xaa,
            g: 0xbb,
            b: 0xcc,
            alpha: 1.0
        });
        assert_eq!(parse("color", "rgba(1, 2, 3, 0.25)"), StyleValue::Rgb {
            r: 1,
            g: 2,
            b: 3,
            alpha: 0.25
        });
        assert_eq!(parse("color", "rgb(1 2 3 / 50%)"), StyleValue::Rgb {
            r: 1,
            g: 2,
            b: 3,
            alpha: 0.5
        });
    }

    #[test]
    fn tuples_layers_and_unparsed() {
        assert_eq!(parse("margin", "1px auto"), StyleValue::Tuple {
            value: vec![StyleValue::px(1.0), StyleValue::keyword("auto")]
        });
        assert_eq!(parse("box-shadow", "none"), StyleValue::Layers {
            value: vec![StyleValue::keyword("none")]
        });
        assert_eq!(parse("padding", "4px"), StyleValue::Tuple {
            value: vec![StyleValue::px(4.0)]
        });
        assert_eq!(parse("margin", "var(--gap)"), StyleValue::Var {
            value: "gap".into(),
            fallback: None
        });
        assert_eq!(
            parse("width", "calc(100% - 10px)"),
            StyleValue::Unparsed {
                value: "calc(100% - 10px)".into()
            }
        );
        assert_eq!(
            parse("border", "1px solid red"),
            StyleValue::Tuple {
                value: vec![
                    StyleValue::px(1.0),
                    StyleValue::keyword("solid"),
                    StyleValue::keyword("red")
                ]
            }
        );
    }

    #[test]
    fn var_and_image() {
        assert_eq!(parse("color", "var(--brand, red)"), StyleValue::Var {
            value: "brand".into(),
            fallback: Some("red".into())
        });
        assert_eq!(parse("background-image", "url(\"a.png\")"), StyleValue::Layers {
            value: vec![StyleValue::Image {
                value: ImageSource::Url { url: "a.png".into() }
            }]
        });
    }

    #[test]
    fn font_family_list() {
        assert_eq!(
            parse("font-family", "\"Open Sans\", Roboto Slab, sans-serif"),
            StyleValue::FontFamily {
                value: vec!["Open Sans".into(), "Roboto Slab".into(), "sans-serif".into()]
            }
        );
    }

    #[test]
    fn quoted_generic_families_stay_quoted() {
        assert_eq!(
            parse("font-family", "\"serif\", serif"),
            StyleValue::FontFamily {
                value: vec!["\"serif\"".into(), "serif".into()]
            }
        );
        assert!(!family_needs_quotes("\"serif\""));
        assert!(family_needs_quotes("Open Sans"));
    }

    #[test]
    fn numbers_out_of_range_are_invalid() {
        assert_eq!(parse("width", "1e999px"), StyleValue::invalid("1e999px"));
        assert_eq!(parse("opacity", "-1e999"), StyleValue::invalid("-1e999"));
        assert_eq!(parse("width", "1e999%"), StyleValue::invalid("1e999%"));
        assert_eq!(
            parse("color", "rgb(1e999, 0, 0)"),
            StyleValue::invalid("rgb(1e999, 0, 0)")
        );
        assert_eq!(
            parse("color", "rgb(0 0 0 / 1e999%)"),
            StyleValue::invalid("rgb(0 0 0 / 1e999%)")
        );
        assert_eq!(
            parse("box-shadow", "0 0 1e999px red"),
            StyleValue::invalid("0 0 1e999px red")
        );
    }

    #[test]
    fn garbage_is_kept_as_invalid() {
        assert_eq!(parse("width", "10pz"), StyleValue::invalid("10pz"));
        assert_eq!(parse("width", "calc(1px"), StyleValue::invalid("calc(1px"));
        assert_eq!(parse("color", "red; x"), StyleValue::invalid("red; x"));
        assert_eq!(parse("color", "  "), StyleValue::invalid(""));
        assert_eq!(parse("color", "#ggg"), StyleValue::invalid("#ggg"));
        assert_eq!(parse("color", "var(brand)"), StyleValue::invalid("var(brand)"));
    }
}
