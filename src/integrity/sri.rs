use std::fmt;
use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose};
use regex::Regex;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::IntegrityError;

/// Hash algorithms browsers accept in integrity metadata, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
  /// SHA-256.
  Sha256,
  /// SHA-384.
  Sha384,
  /// SHA-512.
  Sha512,
}

impl HashAlgorithm {
  /// Prefix used in integrity tokens.
  pub fn prefix(self) -> &'static str {
    match self {
      Self::Sha256 => "sha256",
      Self::Sha384 => "sha384",
      Self::Sha512 => "sha512",
    }
  }

  fn from_prefix(value: &str) -> Option<Self> {
    match value {
      "sha256" => Some(Self::Sha256),
      "sha384" => Some(Self::Sha384),
      "sha512" => Some(Self::Sha512),
      _ => None,
    }
  }

  fn digest(self, bytes: &[u8]) -> Vec<u8> {
    match self {
      Self::Sha256 => Sha256::digest(bytes).to_vec(),
      Self::Sha384 => Sha384::digest(bytes).to_vec(),
      Self::Sha512 => Sha512::digest(bytes).to_vec(),
    }
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.prefix())
  }
}

/// One `<alg>-<base64>` token of integrity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityHash {
  /// Algorithm named by the token.
  pub algorithm: HashAlgorithm,
  /// Base64 digest exactly as written in the token.
  pub digest: String,
}

/// Parsed subresource integrity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integrity {
  hashes: Vec<IntegrityHash>,
}

fn token_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^([A-Za-z0-9]+)-([A-Za-z0-9+/_-]+={0,2})(?:\?.*)?$")
      .expect("invalid integrity token regex")
  })
}

impl Integrity {
  /// Parse whitespace separated integrity tokens.
  ///
  /// Tokens naming unknown algorithms or carrying undecodable digests are skipped the way
  /// browsers skip them; at least one usable token must remain.
  pub fn parse(value: &str) -> Result<Self, IntegrityError> {
    let mut hashes = Vec::new();
    let mut first_invalid: Option<&str> = None;

    for token in value.split_ascii_whitespace() {
      let Some(captures) = token_pattern().captures(token) else {
        continue;
      };
      let Some(algorithm) = HashAlgorithm::from_prefix(&captures[1]) else {
        continue;
      };

      let digest = captures[2].to_string();
      if general_purpose::STANDARD.decode(&digest).is_err() {
        first_invalid.get_or_insert(token);
        continue;
      }

      hashes.push(IntegrityHash { algorithm, digest });
    }

    if hashes.is_empty() {
      return Err(match first_invalid {
        Some(token) => IntegrityError::InvalidDigest(token.to_string()),
        None => IntegrityError::NoSupportedHash(value.to_string()),
      });
    }

    Ok(Self { hashes })
  }

  /// Every supported hash in document order.
  pub fn hashes(&self) -> &[IntegrityHash] {
    &self.hashes
  }

  /// Strongest algorithm present in the metadata.
  pub fn strongest(&self) -> HashAlgorithm {
    self
      .hashes
      .iter()
      .map(|hash| hash.algorithm)
      .max()
      .unwrap_or(HashAlgorithm::Sha256)
  }

  /// Check `bytes` against the tokens of the strongest algorithm.
  pub fn matches(&self, bytes: &[u8]) -> bool {
    let algorithm = self.strongest();
    let actual = general_purpose::STANDARD.encode(algorithm.digest(bytes));

    self
      .hashes
      .iter()
      .filter(|hash| hash.algorithm == algorithm)
      .any(|hash| hash.digest == actual)
  }
}

/// Compute an integrity token for `bytes`.
pub fn compute(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
  format!(
    "{}-{}",
    algorithm.prefix(),
    general_purpose::STANDARD.encode(algorithm.digest(bytes))
  )
}
