//! Trait seams shared across crates.

pub mod store;

pub use store::CacheStore;
