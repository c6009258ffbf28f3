//! # ionoscloud-core
//!
//! Socket-level HTTP transport and typed resource engine for the IONOS
//! Cloud API.
//!
//! The crate speaks HTTP/1.1 directly over TCP/TLS sockets (request framing,
//! status-line interpretation, chunked transfer decoding) and maps generic
//! JSON resources onto schema-validated entities with
//! list/get/add/update/delete semantics, including lookup by a secondary
//! unique attribute and transparent bearer-token issuance and renewal.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and provider error-envelope translation
//! - [`config`] - Client settings and the configuration-store collaborator
//! - [`auth`] - Credential state and bearer-token inspection
//! - [`transport`] - One-socket-per-call HTTP/1.1 transport
//! - [`response`] - Response splitting and chunked-body decoding
//! - [`entity`] - Schema-validated entity model and wire serialization
//! - [`client`] - The cloud API client context object
//! - [`resource`] - Generic CRUD engine, instantiated per resource kind
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod query;
pub mod resource;
pub mod response;
pub mod transport;

// Re-export commonly used types
pub use client::{CloudClient, Payload};
pub use config::{ClientSettings, ConfigStore, MemoryConfigStore};
pub use entity::{Entity, PropertySchema, PropertyType};
pub use error::{Error, Result};
pub use resource::{Resource, ResourceClient, ResourceDescriptor};
pub use transport::Method;
