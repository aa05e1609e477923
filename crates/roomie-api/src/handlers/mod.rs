//! Request handlers, one module per route group.

pub mod health;
pub mod presence;
pub mod ws;
