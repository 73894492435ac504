//! Subresource integrity metadata: parsing, digest computation and on-disk verification.
//!
//! The resolver itself treats digests as opaque strings. These helpers exist for tooling that
//! wants to confirm the digests a bundler recorded still describe the files it emitted.

mod sri;
mod verify;

pub use sri::{HashAlgorithm, Integrity, IntegrityHash, compute};
pub use verify::{AssetStatus, AssetVerification, VerificationReport, verify_entrypoints};
