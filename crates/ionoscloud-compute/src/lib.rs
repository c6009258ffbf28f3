//! Datacenter and server resources for the IONOS Cloud API.
//!
//! Thin typed wrappers over the generic resource engine in
//! `ionoscloud-core`; servers are reached through their datacenter's
//! sub-path.

#![deny(missing_docs)]

pub mod datacenter;
pub mod server;

pub use datacenter::Datacenter;
pub use server::Server;

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = ionoscloud_core::Result<T>;
