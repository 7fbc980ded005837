//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync orchestrator
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorage`] - Remote file operations (WebDAV)
//! - [`IOutcomeReporter`] - Delivery of per-intent sync outcomes

pub mod remote_storage;
pub mod reporter;

pub use remote_storage::{IRemoteStorage, TransportError};
pub use reporter::IOutcomeReporter;
