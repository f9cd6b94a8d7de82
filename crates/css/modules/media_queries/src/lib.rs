//! Breakpoints, viewport matching and media rule ordering.
//!
//! A project defines one base breakpoint (no bounds) plus any number of
//! `max-width` tiers (mobile caps) and `min-width` tiers (desktop floors).
//! This crate answers two questions about such a set: which breakpoint a
//! viewport width falls into, and in which order media rules must be
//! emitted so narrower tiers override broader ones.

#![forbid(unsafe_code)]

mod breakpoint;
mod ordering;

pub use breakpoint::{Breakpoint, MediaTier};
pub use ordering::{
    compare_media, find_matching_media, group_breakpoints, match_media, sort_for_emission,
};

use thiserror::Error;

/// Errors raised when validating a breakpoint set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MediaError {
    /// A project must have exactly one breakpoint without bounds.
    #[error("expected exactly one base breakpoint, found {0}")]
    BaseBreakpointCount(usize),
    /// `min-width` greater than `max-width` can never match.
    #[error("breakpoint `{id}` has min-width {min} above max-width {max}")]
    EmptyRange { id: String, min: u32, max: u32 },
}

/// Check the invariants the compiler relies on.
///
/// # Errors
/// Returns [`MediaError::BaseBreakpointCount`] unless exactly one base
/// breakpoint exists, and [`MediaError::EmptyRange`] for inverted bounds.
pub fn validate_breakpoints<'bp, I>(breakpoints: I) -> Result<(), MediaError>
where
    I: IntoIterator<Item = &'bp Breakpoint>,
{
    let mut bases = 0_usize;
    for breakpoint in breakpoints {
        if breakpoint.is_base() {
            bases += 1;
        }
        if let (Some(min), Some(max)) = (breakpoint.lower_bound(), breakpoint.max_width)
            && min > max
        {
            return Err(MediaError::EmptyRange {
                id: breakpoint.id.clone(),
                min,
                max,
            });
        }
    }
    if bases == 1 {
        Ok(())
    } else {
        Err(MediaError::BaseBreakpointCount(bases))
    }
}

/// `@media` prelude for `breakpoint`, `None` for the base breakpoint.
pub fn media_query_text(breakpoint: &Breakpoint) -> Option<String> {
    match (breakpoint.lower_bound(), breakpoint.max_width) {
        (None, None) => None,
        (Some(min), None) => Some(format!("@media all and (min-width: {min}px)")),
        (None, Some(max)) => Some(format!("@media all and (max-width: {max}px)")),
        (Some(min), Some(max)) => Some(format!(
            "@media all and (min-width: {min}px) and (max-width: {max}px)"
        )),
    }
}
