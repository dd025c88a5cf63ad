//! Status effects ("marks") and their registry.

mod mark;
mod registry;

pub use mark::{DurationKind, Mark, MarkId, MarkSpec};
pub use registry::{MarkNotice, MarkRegistry, MarkRewrite};
