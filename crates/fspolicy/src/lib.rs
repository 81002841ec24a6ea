//! Top-level facade crate for fspolicy.
//!
//! Re-exports the policy core and the issuer service so users can depend on a single crate.

pub mod core {
    pub use fspolicy_core::*;
}

pub mod issuer {
    pub use fspolicy_issuer::*;
}
