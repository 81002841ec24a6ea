//! fspolicy core: signed access policies for a cloud file-storage API.
//!
//! A policy grants a time-bounded, scope-limited capability (which remote
//! calls are permitted, on which handle/path/container, with optional size
//! bounds). This crate validates policy options, renders them into a
//! deterministic JSON document, encodes that document in the URL-friendly
//! base64 variant the storage API expects, and signs it with HMAC-SHA256.
//! It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `PolicyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod policy;
pub mod secret;

pub use error::{ErrorKind, PolicyError};
/// Shared result type.
pub use error::Result;
pub use policy::{
    validate_option, Call, OptionKey, OptionValue, Policy, PolicyBuilder, Renewal,
};
pub use secret::Secret;
