//! Color parsing for hex literals and `rgb()`/`rgba()` functions.

use crate::parse::parse_finite;
use crate::{StyleValue, ValueError};
use cssparser::{Parser, Token};

/// Bit count used to duplicate a single hex nibble into a full byte.
const NIBBLE_SHIFT: u32 = 4;

/// Convert an ASCII hex digit to its numeric value.
const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parse the digits of a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` color
/// (without the `#`) into an `rgb` style value.
///
/// # Errors
/// Returns `ValueError::MalformedHex` for other lengths or non-hex digits.
pub fn parse_hex_color(digits: &str) -> Result<StyleValue, ValueError> {
    let malformed = || ValueError::MalformedHex(digits.to_owned());
    let nibbles = digits
        .bytes()
        .map(hex_value)
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(malformed)?;
    let channels: Vec<u8> = match nibbles.len() {
        3 | 4 => nibbles
            .iter()
            .map(|nibble| nibble.wrapping_shl(NIBBLE_SHIFT) | nibble)
            .collect(),
        6 | 8 => nibbles
            .chunks(2)
            .map(|pair| match pair {
                [high, low] => high.wrapping_shl(NIBBLE_SHIFT) | low,
                _ => 0,
            })
            .collect(),
        _ => return Err(malformed()),
    };
    let alpha = channels
        .get(3)
        .map_or(1.0, |byte| round_alpha(f64::from(*byte) / 255.0));
    match channels.as_slice() {
        [red, green, blue, ..] => Ok(StyleValue::Rgb {
            r: *red,
            g: *green,
            b: *blue,
            alpha,
        }),
        _ => Err(malformed()),
    }
}

/// Keep alpha to two decimals so `#0000007f` serialises as `0.5`.
fn round_alpha(alpha: f64) -> f64 {
    (alpha * 100.0).round() / 100.0
}

/// Parse the inside of an `rgb()`/`rgba()` block.
///
/// Accepts both the legacy comma syntax and the space/slash syntax. Channel
/// values are clamped to `0..=255`; a percentage alpha is scaled to `0..=1`.
pub(crate) fn parse_rgb_arguments(input: &mut Parser<'_, '_>) -> Option<StyleValue> {
    let mut components: Vec<f64> = Vec::with_capacity(4);
    loop {
        let start = input.position();
        let Ok(token) = input.next() else {
            break;
        };
        match token.clone() {
            Token::Number { .. } => {
                components.push(parse_finite(input.slice_from(start))?);
            }
            Token::Percentage { .. } if components.len() == 3 => {
                let raw = input.slice_from(start).trim().trim_end_matches('%');
                components.push(parse_finite(raw)? / 100.0);
            }
            Token::Comma | Token::Delim('/') => {}
            _ => return None,
        }
    }
    let channel = |component: f64| component.round().clamp(0.0, 255.0) as u8;
    match components.as_slice() {
        [red, green, blue] => Some(StyleValue::Rgb {
            r: channel(*red),
            g: channel(*green),
            b: channel(*blue),
            alpha: 1.0,
        }),
        [red, green, blue, alpha] => Some(StyleValue::Rgb {
            r: channel(*red),
            g: channel(*green),
            b: channel(*blue),
            alpha: alpha.clamp(0.0, 1.0),
        }),
        _ => None,
    }
}
