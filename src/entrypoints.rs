//! Resolution of bundler entrypoints into ordered, integrity-annotated asset lists.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{EntrypointError, ManifestError};
use crate::manifest::{IntegrityIndex, load_manifest};
use crate::models::{Asset, Entrypoint, RawManifest};

/// Every entrypoint of one manifest snapshot, resolved eagerly at construction.
///
/// The structure is never mutated once built, so it can be shared freely between threads.
/// Reloading means building a new instance, see [`crate::EntrypointStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entrypoints {
  entrypoints: BTreeMap<String, Entrypoint>,
}

impl Entrypoints {
  /// Resolve every entrypoint of `manifest`.
  ///
  /// Each category keeps the exact length and order of its source list. Sources missing from
  /// the flat asset entries resolve with an empty integrity digest.
  pub fn new(manifest: &RawManifest) -> Self {
    let index = IntegrityIndex::build(&manifest.assets);
    let mut entrypoints = BTreeMap::new();
    let mut unresolved = 0usize;

    for (name, raw) in &manifest.entrypoints {
      let mut entrypoint = Entrypoint::default();

      for (category, sources) in &raw.assets {
        let assets = sources
          .iter()
          .map(|src| {
            let integrity = index.lookup(src).unwrap_or_else(|| {
              unresolved += 1;
              debug!(entrypoint = %name, %category, %src, "asset source not listed in manifest");
              ""
            });
            Asset::new(src.as_str(), integrity)
          })
          .collect();
        entrypoint.insert(category.clone(), assets);
      }

      entrypoints.insert(name.clone(), entrypoint);
    }

    debug!(
      entrypoints = entrypoints.len(),
      sources = index.len(),
      references = manifest.reference_count(),
      unresolved,
      "resolved manifest entrypoints"
    );

    Self { entrypoints }
  }

  /// Load a manifest from disk and resolve it.
  pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
    let manifest = load_manifest(path)?;
    Ok(Self::new(&manifest))
  }

  /// Parse a manifest document and resolve it.
  pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
    let manifest = RawManifest::from_json_str(content)?;
    Ok(Self::new(&manifest))
  }

  /// Look up a resolved entrypoint by name.
  pub fn get(&self, name: &str) -> Result<&Entrypoint, EntrypointError> {
    if name.is_empty() {
      return Err(EntrypointError::EmptyName);
    }

    self
      .entrypoints
      .get(name)
      .ok_or_else(|| EntrypointError::NotFound {
        name: name.to_string(),
      })
  }

  /// Names of every resolved entrypoint.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entrypoints.keys().map(String::as_str)
  }

  /// Iterate over every resolved entrypoint.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Entrypoint)> {
    self
      .entrypoints
      .iter()
      .map(|(name, entrypoint)| (name.as_str(), entrypoint))
  }

  /// Number of resolved entrypoints.
  pub fn len(&self) -> usize {
    self.entrypoints.len()
  }

  /// Whether the manifest declared no entrypoints.
  pub fn is_empty(&self) -> bool {
    self.entrypoints.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const EXAMPLE: &str = r#"{
    "main.js": { "src": "main.a1b2.js", "integrity": "sha256-XYZ" },
    "entrypoints": { "pym": { "assets": { "js": ["main.a1b2.js", "vendor.js"] } } }
  }"#;

  fn resolve(content: &str) -> Entrypoints {
    Entrypoints::from_json_str(content).unwrap()
  }

  #[test]
  fn resolves_example_manifest() {
    let entrypoints = resolve(EXAMPLE);
    let pym = entrypoints.get("pym").unwrap();

    assert_eq!(
      pym.get("js").unwrap(),
      &[
        Asset::new("main.a1b2.js", "sha256-XYZ"),
        Asset::new("vendor.js", ""),
      ]
    );
    assert_eq!(pym.len(), 1);
  }

  #[test]
  fn preserves_order_and_length_of_every_category() {
    let entrypoints = resolve(
      r#"{
        "c.js": { "src": "c.js", "integrity": "sha384-c" },
        "a.js": { "src": "a.js", "integrity": "sha384-a" },
        "entrypoints": {
          "stream": { "assets": {
            "js": ["c.js", "b.js", "a.js", "c.js"],
            "css": ["stream.css"],
            "map": []
          } }
        }
      }"#,
    );
    let stream = entrypoints.get("stream").unwrap();

    let js: Vec<(&str, &str)> = stream
      .get("js")
      .unwrap()
      .iter()
      .map(|asset| (asset.src(), asset.integrity()))
      .collect();
    assert_eq!(
      js,
      vec![
        ("c.js", "sha384-c"),
        ("b.js", ""),
        ("a.js", "sha384-a"),
        ("c.js", "sha384-c"),
      ]
    );
    assert_eq!(stream.get("css").unwrap().len(), 1);
    assert_eq!(stream.get("map").unwrap(), &[] as &[Asset]);
    assert_eq!(stream.categories().collect::<Vec<_>>(), vec!["css", "js", "map"]);
  }

  #[test]
  fn duplicate_sources_resolve_to_first_digest() {
    let content = r#"{
      "first": { "src": "shared.js", "integrity": "sha256-one" },
      "second": { "src": "shared.js", "integrity": "sha256-two" },
      "entrypoints": { "admin": { "assets": { "js": ["shared.js"] } } }
    }"#;

    for _ in 0..3 {
      let entrypoints = resolve(content);
      let admin = entrypoints.get("admin").unwrap();
      assert_eq!(admin.get("js").unwrap()[0].integrity(), "sha256-one");
    }
  }

  #[test]
  fn unknown_entrypoint_is_not_found() {
    let entrypoints = resolve(EXAMPLE);

    assert_eq!(
      entrypoints.get("nonexistent"),
      Err(EntrypointError::NotFound {
        name: "nonexistent".into()
      })
    );
  }

  #[test]
  fn empty_name_is_rejected() {
    let entrypoints = resolve(EXAMPLE);
    assert_eq!(entrypoints.get(""), Err(EntrypointError::EmptyName));
  }

  #[test]
  fn separate_instances_are_identical() {
    let first = resolve(EXAMPLE);
    let second = resolve(EXAMPLE);

    assert_eq!(first, second);
    assert_eq!(first.get("pym").unwrap(), second.get("pym").unwrap());
  }

  #[test]
  fn repeated_lookups_return_the_same_entrypoint() {
    let entrypoints = resolve(EXAMPLE);
    let first = entrypoints.get("pym").unwrap();
    let second = entrypoints.get("pym").unwrap();

    assert!(std::ptr::eq(first, second));
  }

  #[test]
  fn entrypoint_without_categories_is_still_resolved() {
    let entrypoints = resolve(r#"{ "entrypoints": { "empty": { "assets": {} } } }"#);

    assert!(entrypoints.get("empty").unwrap().is_empty());
    assert_eq!(entrypoints.names().collect::<Vec<_>>(), vec!["empty"]);
  }

  #[test]
  fn construction_does_not_modify_raw_manifest() {
    let raw = RawManifest::from_json_str(EXAMPLE).unwrap();
    let before = raw.clone();

    let _ = Entrypoints::new(&raw);
    assert_eq!(raw, before);
  }

  #[test]
  fn malformed_manifest_produces_no_instance() {
    let err = Entrypoints::from_json_str(r#"{ "main.js": 1, "entrypoints": {} }"#).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidAsset { .. }));
  }
}
