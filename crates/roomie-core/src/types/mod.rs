//! Core type definitions used across the Roomie workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod profile;

pub use filter::{FilterKey, Gender, SearchFilters, StudyYear};
pub use id::{ConnectionId, UserId};
pub use pagination::PageRequest;
pub use profile::{Location, ProfileSummary};
