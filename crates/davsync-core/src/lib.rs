//! DavSync Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `WatchedRoot`, `RemotePath`, `RawEvent`, `IntentKind`, `SyncOutcome`
//! - **Port definitions** - Traits for adapters: `IRemoteStorage`, `IOutcomeReporter`
//! - **Configuration** - Typed YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure types with no I/O. Ports define the trait
//! interfaces that the sync orchestrator depends on and that adapter crates
//! (the WebDAV transport, the tracing reporter) implement.

pub mod config;
pub mod domain;
pub mod ports;
