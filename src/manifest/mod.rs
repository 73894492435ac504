//! Bundler manifest loading and the source-to-integrity index used during resolution.

mod index;
mod loader;

pub use index::IntegrityIndex;
pub use loader::{ENTRYPOINTS_KEY, load_manifest};
