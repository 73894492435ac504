//! Error types raised while loading manifests and looking up entrypoints.

use std::path::PathBuf;

use thiserror::Error;

/// Faults detected while loading or resolving a raw manifest.
///
/// Any of these aborts construction; no partially resolved manifest is ever produced.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// The manifest file could not be read.
  #[error("failed to read manifest at {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },

  /// The manifest file is not valid JSON.
  #[error("failed to parse manifest at {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },

  /// A manifest document given in memory is not valid JSON.
  #[error("failed to parse manifest JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// The top level of the manifest is not an object.
  #[error("manifest must be a JSON object, found {found}")]
  NotAnObject {
    /// JSON type found instead.
    found: &'static str,
  },

  /// The reserved `entrypoints` key is absent.
  #[error("manifest is missing the `entrypoints` object")]
  MissingEntrypoints,

  /// The reserved `entrypoints` key is present but not an object.
  #[error("manifest `entrypoints` must be an object, found {found}")]
  InvalidEntrypoints {
    /// JSON type found instead.
    found: &'static str,
  },

  /// An asset entry does not have the `{ src, integrity }` shape.
  #[error("asset entry `{name}` is malformed: {reason}")]
  InvalidAsset {
    /// Key of the offending asset entry.
    name: String,
    /// Human readable description of the problem.
    reason: String,
  },

  /// An entrypoint does not have the `{ assets: { category: [src] } }` shape.
  #[error("entrypoint `{name}` is malformed: {reason}")]
  InvalidEntrypoint {
    /// Name of the offending entrypoint.
    name: String,
    /// Human readable description of the problem.
    reason: String,
  },
}

/// Faults raised when querying a resolved manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntrypointError {
  /// No entrypoint with the requested name was resolved.
  #[error("entrypoint {name} does not exist in the manifest")]
  NotFound {
    /// Requested entrypoint name.
    name: String,
  },

  /// An empty entrypoint name was requested.
  #[error("entrypoint name must not be empty")]
  EmptyName,
}

/// Malformed subresource integrity metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
  /// The metadata contained no token with a supported algorithm.
  #[error("integrity metadata `{0}` contains no supported hash")]
  NoSupportedHash(String),

  /// A token with a supported algorithm carried an invalid base64 digest.
  #[error("integrity token `{0}` has an invalid base64 digest")]
  InvalidDigest(String),
}

/// JSON type name used in error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
  match value {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}
