//! Markup for embedding a resolved entrypoint into a server-rendered page.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Asset, Entrypoint};

/// Category holding scripts.
pub const SCRIPT_CATEGORY: &str = "js";
/// Category holding stylesheets.
pub const STYLE_CATEGORY: &str = "css";

/// Options controlling generated tags.
#[derive(Debug, Clone)]
pub struct RenderOptions {
  /// URL prefix joined with each asset `src`.
  pub public_path: String,
  /// Cross-origin policy placed on tags that carry an integrity attribute.
  pub crossorigin: String,
}

impl Default for RenderOptions {
  fn default() -> Self {
    Self {
      public_path: "/".into(),
      crossorigin: "anonymous".into(),
    }
  }
}

fn absolute_url() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?i)^(?:https?:)?//").expect("invalid absolute URL regex"))
}

/// Join the public path with an asset source unless the source is already absolute.
pub fn asset_url(public_path: &str, src: &str) -> String {
  if absolute_url().is_match(src) || public_path.is_empty() {
    return src.to_string();
  }

  format!(
    "{}/{}",
    public_path.trim_end_matches('/'),
    src.trim_start_matches('/')
  )
}

/// Render one tag per asset of a category, in load order.
///
/// Categories other than scripts and stylesheets produce no markup.
pub fn render_category(category: &str, assets: &[Asset], options: &RenderOptions) -> String {
  let mut html = String::new();
  for asset in assets {
    let url = escape_attribute(&asset_url(&options.public_path, asset.src()));
    let sri = integrity_attributes(asset, options);
    let tag = match category {
      SCRIPT_CATEGORY => format!(r#"<script src="{url}"{sri}></script>"#),
      STYLE_CATEGORY => format!(r#"<link rel="stylesheet" href="{url}"{sri}>"#),
      _ => continue,
    };
    html.push_str(&tag);
    html.push('\n');
  }
  html
}

/// Render stylesheets followed by scripts for an entrypoint.
pub fn render_entrypoint(entrypoint: &Entrypoint, options: &RenderOptions) -> String {
  [STYLE_CATEGORY, SCRIPT_CATEGORY]
    .into_iter()
    .filter_map(|category| {
      entrypoint
        .get(category)
        .map(|assets| render_category(category, assets, options))
    })
    .collect()
}

fn integrity_attributes(asset: &Asset, options: &RenderOptions) -> String {
  if !asset.has_integrity() {
    return String::new();
  }

  let mut attributes = format!(r#" integrity="{}""#, escape_attribute(asset.integrity()));
  if !options.crossorigin.is_empty() {
    attributes.push_str(&format!(
      r#" crossorigin="{}""#,
      escape_attribute(&options.crossorigin)
    ));
  }
  attributes
}

fn escape_attribute(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for ch in value.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '"' => escaped.push_str("&quot;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      other => escaped.push(other),
    }
  }
  escaped
}
