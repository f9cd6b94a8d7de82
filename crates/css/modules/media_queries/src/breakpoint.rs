use serde::{Deserialize, Serialize};

/// A named viewport-width range used as a media query boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: String,
    /// Name shown in the breakpoint picker.
    #[serde(default)]
    pub label: String,
    /// Inclusive lower bound in CSS pixels; `Some(0)` behaves like `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    /// Inclusive upper bound in CSS pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

/// Which group a breakpoint falls into for ordering purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaTier {
    /// `min-width` floor (desktop first).
    Min(u32),
    /// No bounds; its rules are emitted outside any `@media` block.
    Base,
    /// `max-width` cap (mobile first).
    Max(u32),
}

impl Breakpoint {
    /// The unbounded breakpoint, labelled with its id.
    pub fn base(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            min_width: None,
            max_width: None,
        }
    }

    /// A floor: applies from `min_width` up.
    pub fn min(id: impl Into<String>, min_width: u32) -> Self {
        Self {
            min_width: Some(min_width),
            ..Self::base(id)
        }
    }

    /// A cap: applies up to and including `max_width`.
    pub fn max(id: impl Into<String>, max_width: u32) -> Self {
        Self {
            max_width: Some(max_width),
            ..Self::base(id)
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Effective `min-width`. A stored `0` means no lower bound, same as
    /// unset.
    #[inline]
    pub fn lower_bound(&self) -> Option<u32> {
        self.min_width.filter(|min| *min > 0)
    }

    /// Neither bound set (a `0` floor counts as unset).
    #[inline]
    pub fn is_base(&self) -> bool {
        self.lower_bound().is_none() && self.max_width.is_none()
    }

    /// Ordering group. A breakpoint carrying both bounds sorts by its floor.
    pub fn tier(&self) -> MediaTier {
        match (self.lower_bound(), self.max_width) {
            (Some(min), _) => MediaTier::Min(min),
            (None, Some(max)) => MediaTier::Max(max),
            (None, None) => MediaTier::Base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_floor_is_base() {
        assert!(Breakpoint::min("z", 0).is_base());
        assert_eq!(Breakpoint::min("z", 0).tier(), MediaTier::Base);
        assert_eq!(Breakpoint::min("d", 1280).tier(), MediaTier::Min(1280));
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let breakpoint: Breakpoint =
            serde_json::from_value(json!({ "id": "t", "label": "Tablet", "maxWidth": 991 }))
                .unwrap();
        assert_eq!(breakpoint, Breakpoint::max("t", 991).with_label("Tablet"));
        assert_eq!(
            serde_json::to_value(&breakpoint).unwrap(),
            json!({ "id": "t", "label": "Tablet", "maxWidth": 991 })
        );
    }
}
