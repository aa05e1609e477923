//! Online presence bookkeeping.

pub mod registry;

pub use registry::{AnnounceOutcome, PresenceRegistry};
