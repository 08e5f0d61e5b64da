use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of normalized surface text, rendered as lowercase hex.
///
/// Only equality is meaningful: two fingerprints match when the texts they
/// were computed from are identical after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fingerprint raw page text. Normalization-equivalent inputs yield the same digest.
pub fn fingerprint(raw: &str) -> Fingerprint {
    let normalized = normalize_text(raw);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    Fingerprint(hex)
}
