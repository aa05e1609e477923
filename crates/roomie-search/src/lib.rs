//! # roomie-search
//!
//! Client side of the profile search: an HTTP client for the search
//! endpoint, a bounded page cache persisted through a [`CacheStore`], and the
//! [`SearchController`] that debounces filter edits, paginates, and drops
//! responses to superseded requests.
//!
//! [`CacheStore`]: roomie_core::traits::CacheStore

pub mod cache;
pub mod client;
pub mod controller;
pub mod keys;
pub mod store;

pub use cache::{CacheStats, PageCache};
pub use client::{HttpProfileSearch, ProfileSearchApi};
pub use controller::{FetchOutcome, SearchController, SearchSnapshot};
pub use store::{FileStore, MemoryStore};
