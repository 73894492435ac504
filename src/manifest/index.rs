use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::models::RawAsset;

/// Lookup table from an emitted file path to its integrity digest.
///
/// When several asset entries share a `src` the first one in document order wins.
#[derive(Debug, Default)]
pub struct IntegrityIndex<'a> {
  digests: HashMap<&'a str, &'a str>,
}

impl<'a> IntegrityIndex<'a> {
  /// Build the index from the flat asset entries of a manifest.
  pub fn build(assets: &'a [(String, RawAsset)]) -> Self {
    let mut digests: HashMap<&'a str, &'a str> = HashMap::with_capacity(assets.len());

    for (name, asset) in assets {
      match digests.entry(asset.src.as_str()) {
        Entry::Vacant(slot) => {
          slot.insert(asset.integrity.as_str());
        }
        Entry::Occupied(existing) => {
          if *existing.get() != asset.integrity {
            warn!(
              src = %asset.src,
              asset = %name,
              kept = %existing.get(),
              ignored = %asset.integrity,
              "conflicting integrity for duplicate asset source, keeping first"
            );
          }
        }
      }
    }

    Self { digests }
  }

  /// Digest recorded for `src`, if the manifest listed the file at all.
  pub fn lookup(&self, src: &str) -> Option<&'a str> {
    self.digests.get(src).copied()
  }

  /// Number of distinct sources indexed.
  pub fn len(&self) -> usize {
    self.digests.len()
  }

  /// Whether no sources were indexed.
  pub fn is_empty(&self) -> bool {
    self.digests.is_empty()
  }
}
