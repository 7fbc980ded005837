//! Domain entities and business logic
//!
//! This module contains the core domain types for DavSync:
//! - Newtypes for validated local and remote paths
//! - Raw filesystem events, sync intents and outcomes
//! - Domain-specific error types

pub mod errors;
pub mod event;
pub mod newtypes;

// Re-export commonly used types
pub use errors::DomainError;
pub use event::{EventKind, IntentKind, RawEvent, SyncOutcome};
pub use newtypes::{RemotePath, WatchedRoot};
