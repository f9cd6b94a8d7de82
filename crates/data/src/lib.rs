//! Normalised project data shared by the store, the CSS compiler and the
//! sync backend.
//!
//! Every namespace is a flat map keyed by a stable id. The tree is encoded
//! through child id lists on [`Instance`], styles through [`StyleDecl`]s
//! keyed by `(source, breakpoint, state, property)`.

#![forbid(unsafe_code)]

mod asset;
mod instance;
mod prop;
mod snapshot;
mod style;

pub use asset::Asset;
pub use css_media_queries::Breakpoint;
pub use instance::{Instance, InstanceChild, descendants, find_parent};
pub use prop::{Prop, PropValue};
pub use snapshot::{ProjectSnapshot, ProjectView};
pub use style::{StyleDecl, StyleDeclKey, StyleSource, StyleSourceSelection};
