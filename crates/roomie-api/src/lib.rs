//! # roomie-api
//!
//! HTTP API layer for Roomie built on Axum.
//!
//! Provides the WebSocket upgrade for the real-time channel, health and
//! presence endpoints, CORS and request logging middleware, DTOs, and
//! error mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
