//! Configuration describing where the manifest lives and how its assets are served.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::render::RenderOptions;

/// File name searched for by [`ResolverConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "entrypoints.config.json";

/// Discoverable configuration for loading and serving a bundler manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Manifest path, relative to the configuration directory.
    pub manifest_path: String,
    /// URL prefix prepended to asset sources when rendering tags.
    pub public_path: String,
    /// Directory holding the emitted files, relative to the configuration directory.
    pub public_dir: String,
    /// Cross-origin policy placed on tags that carry an integrity attribute.
    pub crossorigin: String,
    /// Reload the manifest on every request, for development servers.
    pub reload: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            manifest_path: "dist/static/asset-manifest.json".into(),
            public_path: "/".into(),
            public_dir: "dist/static".into(),
            crossorigin: "anonymous".into(),
            reload: false,
        }
    }
}

impl ResolverConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing or unparsable file yields the defaults.
    pub fn discover(base_dir: &Path) -> Self {
        let candidate = base_dir.join(DEFAULT_CONFIG_FILE);
        match Self::from_path(&candidate) {
            Some(config) => config,
            None => {
                tracing::debug!(path = %candidate.display(), "no usable config, using defaults");
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Manifest location resolved against `base_dir`.
    pub fn manifest_file(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.manifest_path)
    }

    /// Public directory resolved against `base_dir`.
    pub fn public_dir_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.public_dir)
    }

    /// Rendering options derived from this configuration.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            public_path: self.public_path.clone(),
            crossorigin: self.crossorigin.clone(),
        }
    }
}
