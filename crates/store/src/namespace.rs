use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of store containers a change can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    /// The instance tree. Older clients call it `root`.
    #[serde(alias = "root")]
    Instances,
    Props,
    Breakpoints,
    Styles,
    StyleSources,
    StyleSourceSelections,
    Assets,
}

/// A namespace name that is not part of [`Namespace`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("Unknown namespace \"{0}\"")]
    Unknown(String),
}

impl Namespace {
    pub const ALL: [Self; 7] = [
        Self::Instances,
        Self::Props,
        Self::Breakpoints,
        Self::Styles,
        Self::StyleSources,
        Self::StyleSourceSelections,
        Self::Assets,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instances => "instances",
            Self::Props => "props",
            Self::Breakpoints => "breakpoints",
            Self::Styles => "styles",
            Self::StyleSources => "styleSources",
            Self::StyleSourceSelections => "styleSourceSelections",
            Self::Assets => "assets",
        }
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name == "root" {
            return Ok(Self::Instances);
        }
        Self::ALL
            .into_iter()
            .find(|namespace| namespace.as_str() == name)
            .ok_or_else(|| NamespaceError::Unknown(name.to_owned()))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for namespace in Namespace::ALL {
            assert_eq!(namespace.as_str().parse::<Namespace>(), Ok(namespace));
        }
        assert_eq!("root".parse::<Namespace>(), Ok(Namespace::Instances));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let error = "pages".parse::<Namespace>().unwrap_err();
        assert_eq!(error.to_string(), "Unknown namespace \"pages\"");
    }
}
