//! Wire messages exchanged over the real-time channel.

pub mod types;
pub mod validator;

pub use types::{InboundMessage, OutboundMessage};
