//! Card-collection operations and the forwarding boundary.

mod forwarder;
mod ops;

pub use forwarder::{forward, CardCollection, NullCollection};
pub use ops::{CardFace, CardOp, DiscardRequest, Zone};
