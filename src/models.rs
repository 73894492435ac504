//! Data structures consumed and produced while resolving a bundler manifest.

use std::collections::BTreeMap;

use serde::Serialize;

/// Asset entry from the flat part of the bundler manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsset {
  /// Output path of the emitted file.
  pub src: String,
  /// Integrity digest, empty when the bundler did not compute one.
  pub integrity: String,
}

/// Entrypoint as emitted by the bundler, before integrity digests are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntrypoint {
  /// Source paths grouped by category, each list in load order.
  pub assets: Vec<(String, Vec<String>)>,
}

/// Validated, still unresolved, view of a bundler manifest.
///
/// Both collections keep the order of the JSON document they were read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawManifest {
  /// Flat asset entries keyed by their opaque manifest name.
  pub assets: Vec<(String, RawAsset)>,
  /// Entrypoints keyed by name.
  pub entrypoints: Vec<(String, RawEntrypoint)>,
}

impl RawManifest {
  /// Total number of source path references across every entrypoint.
  pub fn reference_count(&self) -> usize {
    self
      .entrypoints
      .iter()
      .flat_map(|(_, entrypoint)| entrypoint.assets.iter())
      .map(|(_, sources)| sources.len())
      .sum()
  }
}

/// A single file of an entrypoint together with its integrity digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Asset {
  src: String,
  integrity: String,
}

impl Asset {
  /// Create an asset record.
  pub fn new(src: impl Into<String>, integrity: impl Into<String>) -> Self {
    Self {
      src: src.into(),
      integrity: integrity.into(),
    }
  }

  /// Output path of the file.
  pub fn src(&self) -> &str {
    &self.src
  }

  /// Integrity digest, empty when unknown.
  pub fn integrity(&self) -> &str {
    &self.integrity
  }

  /// Whether an integrity digest is known for this file.
  pub fn has_integrity(&self) -> bool {
    !self.integrity.is_empty()
  }
}

/// Resolved entrypoint: ordered assets grouped by category (`js`, `css`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entrypoint {
  categories: BTreeMap<String, Vec<Asset>>,
}

impl Entrypoint {
  pub(crate) fn insert(&mut self, category: String, assets: Vec<Asset>) {
    self.categories.insert(category, assets);
  }

  /// Assets of a category in load order.
  pub fn get(&self, category: &str) -> Option<&[Asset]> {
    self.categories.get(category).map(Vec::as_slice)
  }

  /// Category names present on this entrypoint.
  pub fn categories(&self) -> impl Iterator<Item = &str> {
    self.categories.keys().map(String::as_str)
  }

  /// Iterate over every category with its assets.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[Asset])> {
    self
      .categories
      .iter()
      .map(|(category, assets)| (category.as_str(), assets.as_slice()))
  }

  /// Number of categories.
  pub fn len(&self) -> usize {
    self.categories.len()
  }

  /// Whether the entrypoint has no categories.
  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }
}
