//! fspolicy issuer library entry.
//!
//! Wires the policy core into a small HTTP service that hands out signed
//! policies for configured apps. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod issue;
pub mod ops;
pub mod router;
