//! Check emitted files on disk against the digests recorded for each entrypoint.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::entrypoints::Entrypoints;
use crate::integrity::sri::Integrity;
use crate::models::Asset;

/// Outcome of verifying a single asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
  /// The file content matches its digest.
  Verified,
  /// The file content does not match its digest.
  Mismatch,
  /// The manifest recorded no digest for the file.
  MissingIntegrity,
  /// The file does not exist under the public directory.
  MissingFile,
  /// The recorded digest could not be parsed.
  InvalidIntegrity {
    /// Parse failure description.
    reason: String,
  },
  /// The file exists but could not be read.
  Unreadable {
    /// I/O failure description.
    reason: String,
  },
}

impl AssetStatus {
  /// Whether this outcome should fail a verification run.
  pub fn is_failure(&self) -> bool {
    !matches!(self, Self::Verified | Self::MissingIntegrity)
  }
}

/// Verification result for one asset reference of one entrypoint.
#[derive(Debug, Clone, Serialize)]
pub struct AssetVerification {
  /// Entrypoint the reference belongs to.
  pub entrypoint: String,
  /// Category the reference belongs to.
  pub category: String,
  /// Emitted file path.
  pub src: String,
  /// Outcome of the check.
  #[serde(flatten)]
  pub status: AssetStatus,
}

/// Results of verifying every asset reference of a manifest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
  /// One entry per reference, in entrypoint and category order.
  pub assets: Vec<AssetVerification>,
}

impl VerificationReport {
  /// References whose check failed.
  pub fn failures(&self) -> impl Iterator<Item = &AssetVerification> {
    self.assets.iter().filter(|asset| asset.status.is_failure())
  }

  /// Whether every reference passed.
  pub fn is_success(&self) -> bool {
    self.failures().next().is_none()
  }

  /// Count of references with the given outcome.
  pub fn count(&self, predicate: impl Fn(&AssetStatus) -> bool) -> usize {
    self
      .assets
      .iter()
      .filter(|asset| predicate(&asset.status))
      .count()
  }
}

/// Verify every resolved asset against the file at `public_dir/<src>`.
pub fn verify_entrypoints(entrypoints: &Entrypoints, public_dir: &Path) -> VerificationReport {
  let mut report = VerificationReport::default();

  for (name, entrypoint) in entrypoints.iter() {
    for (category, assets) in entrypoint.iter() {
      for asset in assets {
        let status = verify_asset(asset, public_dir);
        if status.is_failure() {
          warn!(entrypoint = %name, %category, src = asset.src(), ?status, "asset failed verification");
        } else {
          debug!(entrypoint = %name, %category, src = asset.src(), ?status, "asset checked");
        }

        report.assets.push(AssetVerification {
          entrypoint: name.to_string(),
          category: category.to_string(),
          src: asset.src().to_string(),
          status,
        });
      }
    }
  }

  report
}

fn verify_asset(asset: &Asset, public_dir: &Path) -> AssetStatus {
  let Some(path) = asset_path(public_dir, asset.src()) else {
    warn!(src = asset.src(), "asset source escapes the public directory");
    return AssetStatus::MissingFile;
  };
  let bytes = match fs::read(&path) {
    Ok(bytes) => bytes,
    Err(err) if err.kind() == ErrorKind::NotFound => return AssetStatus::MissingFile,
    Err(err) => {
      return AssetStatus::Unreadable {
        reason: format!("{}: {err}", path.display()),
      };
    }
  };

  if !asset.has_integrity() {
    return AssetStatus::MissingIntegrity;
  }

  match Integrity::parse(asset.integrity()) {
    Ok(integrity) if integrity.matches(&bytes) => AssetStatus::Verified,
    Ok(_) => AssetStatus::Mismatch,
    Err(err) => AssetStatus::InvalidIntegrity {
      reason: err.to_string(),
    },
  }
}

/// Location of an emitted file below the public directory.
///
/// Leading slashes and query strings are ignored so `/static/main.js?v=1` maps to
/// `<public_dir>/static/main.js`. Sources with `..` segments have no such location.
fn asset_path(public_dir: &Path, src: &str) -> Option<PathBuf> {
  let without_query = src.split(['?', '#']).next().unwrap_or(src);

  let mut path = public_dir.to_path_buf();
  for segment in without_query.split(['/', '\\']) {
    match segment {
      "" | "." => continue,
      ".." => return None,
      _ => path.push(segment),
    }
  }
  Some(path)
}
