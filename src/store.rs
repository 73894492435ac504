//! Shared holder for the resolved manifest, supporting reload by instance replacement.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use crate::entrypoints::Entrypoints;
use crate::error::ManifestError;
use crate::manifest::load_manifest;
use crate::models::RawManifest;

/// Trait describing where raw manifests are loaded from.
pub trait ManifestSource {
  /// Produce a freshly loaded raw manifest.
  fn load(&self) -> Result<RawManifest, ManifestError>;
}

/// Manifest source reading a JSON file from disk on every load.
#[derive(Debug, Clone)]
pub struct FileManifestSource {
  path: PathBuf,
}

impl FileManifestSource {
  /// Create a source for the manifest at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Location of the manifest file.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl ManifestSource for FileManifestSource {
  fn load(&self) -> Result<RawManifest, ManifestError> {
    load_manifest(&self.path)
  }
}

/// Current resolved manifest shared between request handlers.
///
/// Readers take an [`Arc`] snapshot and keep using it until they finish; a reload builds the
/// replacement outside the read lock and swaps the pointer, so no reader ever sees a partial
/// update. Reloads run one at a time, so the installed instance is always the latest load.
#[derive(Debug)]
pub struct EntrypointStore<S> {
  source: S,
  reload_per_request: bool,
  current: RwLock<Arc<Entrypoints>>,
  reloading: Mutex<()>,
}

impl<S: ManifestSource> EntrypointStore<S> {
  /// Load the initial manifest from `source`.
  ///
  /// With `reload_per_request` set, [`EntrypointStore::for_request`] reloads before every
  /// snapshot, which suits development servers where the bundler rewrites the manifest.
  pub fn open(source: S, reload_per_request: bool) -> Result<Self, ManifestError> {
    let initial = Entrypoints::new(&source.load()?);
    Ok(Self {
      source,
      reload_per_request,
      current: RwLock::new(Arc::new(initial)),
      reloading: Mutex::new(()),
    })
  }

  /// The currently installed entrypoints.
  pub fn snapshot(&self) -> Arc<Entrypoints> {
    let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&*guard)
  }

  /// Load and resolve the manifest again and install the result.
  ///
  /// On failure the previous entrypoints stay installed.
  pub fn reload(&self) -> Result<Arc<Entrypoints>, ManifestError> {
    // Held across load and swap so a slow older load cannot replace a newer one.
    let _reloading = self.reloading.lock().unwrap_or_else(PoisonError::into_inner);

    let fresh = match self.source.load() {
      Ok(manifest) => Arc::new(Entrypoints::new(&manifest)),
      Err(err) => {
        warn!(error = %err, "manifest reload failed, keeping previous entrypoints");
        return Err(err);
      }
    };

    {
      let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
      *guard = Arc::clone(&fresh);
    }

    info!(entrypoints = fresh.len(), "reloaded manifest entrypoints");
    Ok(fresh)
  }

  /// Snapshot to use while serving one request, reloading first in development mode.
  pub fn for_request(&self) -> Result<Arc<Entrypoints>, ManifestError> {
    if self.reload_per_request {
      self.reload()
    } else {
      Ok(self.snapshot())
    }
  }

  /// Whether every request reloads the manifest.
  pub fn reloads_per_request(&self) -> bool {
    self.reload_per_request
  }

  /// Source the store loads from.
  pub fn source(&self) -> &S {
    &self.source
  }
}

impl EntrypointStore<FileManifestSource> {
  /// Open a store backed by the manifest file at `path`.
  pub fn from_path(
    path: impl Into<PathBuf>,
    reload_per_request: bool,
  ) -> Result<Self, ManifestError> {
    Self::open(FileManifestSource::new(path), reload_per_request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::thread;
  use std::time::Duration;
  use tempfile::tempdir;

  fn write_manifest(path: &Path, digest: &str) {
    let content = format!(
      r#"{{
        "main.js": {{ "src": "main.js", "integrity": "{digest}" }},
        "entrypoints": {{ "stream": {{ "assets": {{ "js": ["main.js"] }} }} }}
      }}"#
    );
    fs::write(path, content).unwrap();
  }

  fn digest_of(entrypoints: &Entrypoints) -> String {
    entrypoints.get("stream").unwrap().get("js").unwrap()[0]
      .integrity()
      .to_string()
  }

  #[test]
  fn open_fails_for_missing_manifest() {
    let dir = tempdir().unwrap();
    let result = EntrypointStore::from_path(dir.path().join("missing.json"), false);
    assert!(matches!(result, Err(ManifestError::Io { .. })));
  }

  #[test]
  fn reload_swaps_instance_but_keeps_old_snapshots() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-old");

    let store = EntrypointStore::from_path(&path, false).unwrap();
    let before = store.snapshot();

    write_manifest(&path, "sha256-new");
    let after = store.reload().unwrap();

    assert_eq!(digest_of(&before), "sha256-old");
    assert_eq!(digest_of(&after), "sha256-new");
    assert_eq!(digest_of(&store.snapshot()), "sha256-new");
  }

  #[test]
  fn failed_reload_keeps_previous_entrypoints() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-good");

    let store = EntrypointStore::from_path(&path, false).unwrap();
    fs::write(&path, r#"{ "main.js": { "src": "main.js" } }"#).unwrap();

    assert!(matches!(store.reload(), Err(ManifestError::MissingEntrypoints)));
    assert_eq!(digest_of(&store.snapshot()), "sha256-good");
  }

  #[test]
  fn reload_errors_name_the_manifest_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-good");

    let store = EntrypointStore::from_path(&path, false).unwrap();
    fs::write(&path, "{ truncated").unwrap();

    let err = store.reload().unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
  }

  #[test]
  fn production_mode_does_not_reload_per_request() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-first");

    let store = EntrypointStore::from_path(&path, false).unwrap();
    write_manifest(&path, "sha256-second");

    assert_eq!(digest_of(&store.for_request().unwrap()), "sha256-first");
  }

  #[test]
  fn development_mode_reloads_per_request() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-first");

    let store = EntrypointStore::from_path(&path, true).unwrap();
    write_manifest(&path, "sha256-second");

    assert!(store.reloads_per_request());
    assert_eq!(digest_of(&store.for_request().unwrap()), "sha256-second");
  }

  #[test]
  fn snapshots_are_readable_across_threads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("asset-manifest.json");
    write_manifest(&path, "sha256-shared");

    let store = Arc::new(EntrypointStore::from_path(&path, false).unwrap());
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let store = Arc::clone(&store);
        thread::spawn(move || digest_of(&store.snapshot()))
      })
      .collect();

    for handle in handles {
      assert_eq!(handle.join().unwrap(), "sha256-shared");
    }
  }

  struct StaticSource(RawManifest);

  impl ManifestSource for StaticSource {
    fn load(&self) -> Result<RawManifest, ManifestError> {
      Ok(self.0.clone())
    }
  }

  #[test]
  fn accepts_custom_sources() {
    let manifest = RawManifest::from_json_str(
      r#"{ "entrypoints": { "admin": { "assets": { "css": ["admin.css"] } } } }"#,
    )
    .unwrap();
    let store = EntrypointStore::open(StaticSource(manifest), false).unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.get("admin").unwrap().get("css").unwrap()[0].integrity(), "");
  }

  struct VersionedSource {
    loads: AtomicUsize,
  }

  impl ManifestSource for VersionedSource {
    fn load(&self) -> Result<RawManifest, ManifestError> {
      let version = self.loads.fetch_add(1, Ordering::SeqCst);
      // Earlier versions finish later.
      thread::sleep(Duration::from_millis(20u64.saturating_sub(version as u64 * 2)));
      RawManifest::from_json_str(&format!(
        r#"{{ "entrypoints": {{ "v{version}": {{ "assets": {{}} }} }} }}"#
      ))
    }
  }

  #[test]
  fn concurrent_reloads_install_the_latest_load() {
    let source = VersionedSource {
      loads: AtomicUsize::new(0),
    };
    let store = Arc::new(EntrypointStore::open(source, true).unwrap());

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let store = Arc::clone(&store);
        thread::spawn(move || store.for_request().unwrap())
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    let latest = store.source().loads.load(Ordering::SeqCst) - 1;
    let snapshot = store.snapshot();
    assert_eq!(snapshot.names().collect::<Vec<_>>(), vec![format!("v{latest}")]);
  }
}
