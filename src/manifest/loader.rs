//! Reading the bundler's asset manifest and validating its shape.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ManifestError, json_type};
use crate::models::{RawAsset, RawEntrypoint, RawManifest};

/// Reserved manifest key holding the entrypoint descriptions.
pub const ENTRYPOINTS_KEY: &str = "entrypoints";

const ASSETS_KEY: &str = "assets";

/// Load and validate a manifest from disk.
pub fn load_manifest(path: &Path) -> Result<RawManifest, ManifestError> {
  let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let value: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  RawManifest::from_value(&value)
}

impl RawManifest {
  /// Parse and validate a manifest document.
  pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
    let value: Value = serde_json::from_str(content)?;
    Self::from_value(&value)
  }

  /// Validate an already parsed manifest document.
  ///
  /// The value is only borrowed; every string is copied into the returned manifest.
  pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
    let Value::Object(root) = value else {
      return Err(ManifestError::NotAnObject {
        found: json_type(value),
      });
    };

    let entrypoints = match root.get(ENTRYPOINTS_KEY) {
      None => return Err(ManifestError::MissingEntrypoints),
      Some(Value::Object(entries)) => parse_entrypoints(entries)?,
      Some(other) => {
        return Err(ManifestError::InvalidEntrypoints {
          found: json_type(other),
        });
      }
    };

    let assets = root
      .iter()
      .filter(|(name, _)| name.as_str() != ENTRYPOINTS_KEY)
      .map(|(name, entry)| parse_asset(name, entry).map(|asset| (name.clone(), asset)))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      assets,
      entrypoints,
    })
  }
}

fn parse_asset(name: &str, value: &Value) -> Result<RawAsset, ManifestError> {
  let invalid = |reason: String| ManifestError::InvalidAsset {
    name: name.to_string(),
    reason,
  };

  let Value::Object(fields) = value else {
    return Err(invalid(format!("expected an object, found {}", json_type(value))));
  };

  let src = match fields.get("src") {
    Some(Value::String(src)) => src.clone(),
    Some(other) => {
      return Err(invalid(format!(
        "`src` must be a string, found {}",
        json_type(other)
      )));
    }
    None => return Err(invalid("missing `src`".into())),
  };

  let integrity = match fields.get("integrity") {
    Some(Value::String(integrity)) => integrity.clone(),
    None | Some(Value::Null) => String::new(),
    Some(other) => {
      return Err(invalid(format!(
        "`integrity` must be a string, found {}",
        json_type(other)
      )));
    }
  };

  Ok(RawAsset { src, integrity })
}

fn parse_entrypoints(
  entries: &Map<String, Value>,
) -> Result<Vec<(String, RawEntrypoint)>, ManifestError> {
  entries
    .iter()
    .map(|(name, value)| parse_entrypoint(name, value).map(|entry| (name.clone(), entry)))
    .collect()
}

fn parse_entrypoint(name: &str, value: &Value) -> Result<RawEntrypoint, ManifestError> {
  let invalid = |reason: String| ManifestError::InvalidEntrypoint {
    name: name.to_string(),
    reason,
  };

  let assets = match value.get(ASSETS_KEY) {
    Some(Value::Object(assets)) => assets,
    Some(other) => {
      return Err(invalid(format!(
        "`assets` must be an object, found {}",
        json_type(other)
      )));
    }
    None if value.is_object() => return Err(invalid("missing `assets`".into())),
    None => return Err(invalid(format!("expected an object, found {}", json_type(value)))),
  };

  let mut categories = Vec::with_capacity(assets.len());
  for (category, list) in assets {
    let Value::Array(items) = list else {
      return Err(invalid(format!(
        "category `{category}` must be an array, found {}",
        json_type(list)
      )));
    };

    let sources = items
      .iter()
      .enumerate()
      .map(|(index, item)| match item {
        Value::String(src) => Ok(src.clone()),
        other => Err(invalid(format!(
          "category `{category}` item {index} must be a string, found {}",
          json_type(other)
        ))),
      })
      .collect::<Result<Vec<_>, _>>()?;

    categories.push((category.clone(), sources));
  }

  Ok(RawEntrypoint { assets: categories })
}
