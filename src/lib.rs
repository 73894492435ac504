#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod entrypoints;
pub mod error;
pub mod integrity;
pub mod manifest;
pub mod models;
pub mod render;
pub mod store;

pub use config::ResolverConfig;
pub use entrypoints::Entrypoints;
pub use error::{EntrypointError, IntegrityError, ManifestError};
pub use models::{Asset, Entrypoint, RawManifest};
pub use store::{EntrypointStore, FileManifestSource, ManifestSource};
