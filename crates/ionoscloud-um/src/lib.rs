//! User-management resources for the IONOS Cloud API.
//!
//! Users, groups and S3 keys, each a thin typed wrapper over the generic
//! resource engine in `ionoscloud-core`. Resource-specific operations
//! (group membership, S3 key provisioning) are built purely from the
//! generic call primitives.

#![deny(missing_docs)]

pub mod group;
pub mod s3key;
pub mod user;

pub use group::Group;
pub use s3key::S3Key;
pub use user::User;

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = ionoscloud_core::Result<T>;
