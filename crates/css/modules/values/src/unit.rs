//! Units carried by [`StyleValue::Unit`](crate::StyleValue::Unit).

use crate::ValueError;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Unit of a numeric style value. `Number` is the unitless case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Em,
    Rem,
    Ch,
    Ex,
    Vw,
    Vh,
    Vmin,
    Vmax,
    #[serde(rename = "%")]
    Percent,
    Deg,
    Rad,
    Turn,
    S,
    Ms,
    Fr,
    Number,
}

impl Unit {
    /// Text appended after the number when serialising.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Ch => "ch",
            Self::Ex => "ex",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
            Self::Percent => "%",
            Self::Deg => "deg",
            Self::Rad => "rad",
            Self::Turn => "turn",
            Self::S => "s",
            Self::Ms => "ms",
            Self::Fr => "fr",
            Self::Number => "",
        }
    }
}

impl FromStr for Unit {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let unit = match text.to_ascii_lowercase().as_str() {
            "px" => Self::Px,
            "em" => Self::Em,
            "rem" => Self::Rem,
            "ch" => Self::Ch,
            "ex" => Self::Ex,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            "%" => Self::Percent,
            "deg" => Self::Deg,
            "rad" => Self::Rad,
            "turn" => Self::Turn,
            "s" => Self::S,
            "ms" => Self::Ms,
            "fr" => Self::Fr,
            "" | "number" => Self::Number,
            other => return Err(ValueError::UnknownUnit(other.to_owned())),
        };
        Ok(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
