//! Breakpoint aware CSS generation for the builder canvas and published
//! sites.
//!
//! [`CssEngine`] is the low level store of serialised rules grouped by
//! breakpoint. [`StyleCompiler`] fills it from project data: it resolves the
//! style sources selected by every instance, merges their declarations and
//! keeps one cached rule text per (breakpoint, instance, state), so a change
//! to a few instances only re-serialises their rules.

#![forbid(unsafe_code)]

mod artifact;
mod cascade;
mod compiler;
mod engine;
mod selector;

pub use artifact::{CssArtifact, IMMUTABLE_CACHE_CONTROL};
pub use cascade::{AssetTable, ResolvedRule, resolve_instance_rules};
pub use compiler::{CompileDelta, CompilerOptions, RuleId, StyleCompiler};
pub use engine::{CssEngine, RuleKey, StyleRule};
pub use selector::{SelectorStrategy, instance_selector};

use css_media_queries::MediaError;
use thiserror::Error;

/// Errors that stop a whole compile. Bad values never do; they are skipped.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid breakpoint set: {0}")]
    Breakpoints(#[from] MediaError),
}
