//! Viewport matching and the two breakpoint orderings.

use crate::{Breakpoint, MediaTier};
use core::cmp::Ordering;

/// Whether `width` lies inside the range of `breakpoint` (bounds inclusive).
pub fn match_media(breakpoint: &Breakpoint, width: u32) -> bool {
    breakpoint.lower_bound().is_none_or(|min| width >= min)
        && breakpoint.max_width.is_none_or(|max| width <= max)
}

/// The breakpoint a viewport of `width` pixels uses in the builder.
///
/// Max-width tiers are tried ascending, then min-width tiers descending, and
/// the base breakpoint is the fallback. `None` only when no tier matches and
/// there is no base.
pub fn find_matching_media<'bp, I>(breakpoints: I, width: u32) -> Option<&'bp Breakpoint>
where
    I: IntoIterator<Item = &'bp Breakpoint>,
{
    let mut caps = Vec::new();
    let mut floors = Vec::new();
    let mut base = None;
    for breakpoint in breakpoints {
        match breakpoint.tier() {
            MediaTier::Max(max) => caps.push((max, breakpoint)),
            MediaTier::Min(min) => floors.push((min, breakpoint)),
            MediaTier::Base => {
                base.get_or_insert(breakpoint);
            }
        }
    }
    caps.sort_by(|left, right| left.0.cmp(&right.0).then_with(|| left.1.id.cmp(&right.1.id)));
    floors.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| left.1.id.cmp(&right.1.id)));
    caps.into_iter()
        .find(|(max, _)| *max >= width)
        .or_else(|| {
            floors
                .into_iter()
                .find(|(_, breakpoint)| match_media(breakpoint, width))
        })
        .map(|(_, breakpoint)| breakpoint)
        .or(base)
}

/// Display grouping: min-width tiers descending, then the base, then
/// max-width tiers descending.
///
/// The result does not depend on input order; equal bounds tie-break on id.
pub fn group_breakpoints<'bp, I>(breakpoints: I) -> Vec<&'bp Breakpoint>
where
    I: IntoIterator<Item = &'bp Breakpoint>,
{
    let mut grouped: Vec<&Breakpoint> = breakpoints.into_iter().collect();
    grouped.sort_by(|left, right| {
        group_rank(left)
            .cmp(&group_rank(right))
            .then_with(|| left.id.cmp(&right.id))
    });
    grouped
}

/// Sort key for [`group_breakpoints`].
fn group_rank(breakpoint: &Breakpoint) -> (u8, core::cmp::Reverse<u32>) {
    match breakpoint.tier() {
        MediaTier::Min(min) => (0, core::cmp::Reverse(min)),
        MediaTier::Base => (1, core::cmp::Reverse(0)),
        MediaTier::Max(max) => (2, core::cmp::Reverse(max)),
    }
}

/// Stylesheet emission order.
///
/// The base rule comes first, then max-width rules from widest to narrowest,
/// then min-width rules from narrowest floor to highest. Every rule is
/// therefore declared after all broader rules that overlap it, so it wins
/// the source order tie at equal specificity.
pub fn compare_media(left: &Breakpoint, right: &Breakpoint) -> Ordering {
    emission_rank(left)
        .cmp(&emission_rank(right))
        .then_with(|| left.id.cmp(&right.id))
}

fn emission_rank(breakpoint: &Breakpoint) -> (u8, i64) {
    match breakpoint.tier() {
        MediaTier::Base => (0, 0),
        MediaTier::Max(max) => (1, -i64::from(max)),
        MediaTier::Min(min) => (2, i64::from(min)),
    }
}

/// `breakpoints` sorted with [`compare_media`].
pub fn sort_for_emission<'bp, I>(breakpoints: I) -> Vec<&'bp Breakpoint>
where
    I: IntoIterator<Item = &'bp Breakpoint>,
{
    let mut sorted: Vec<&Breakpoint> = breakpoints.into_iter().collect();
    sorted.sort_by(|left, right| compare_media(left, right));
    sorted
}
