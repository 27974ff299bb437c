//! Content-addressed output names.
//!
//! An artifact is named after the MD5 digest of its encoded bytes, so identical
//! output always lands on the same file name and re-running a conversion never
//! produces a second copy of the same content.

use std::{fmt, path::Path};

use md5::{Digest as _, Md5};

/// Extension every canonical artifact carries.
pub const TARGET_EXT: &str = "avif";

/// `<32 lowercase hex digits>.avif`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalName(String);

impl CanonicalName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the extension.
    pub fn digest_hex(&self) -> &str {
        self.0
            .strip_suffix(TARGET_EXT)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&self.0)
    }

    /// True when `path`'s file name already is this canonical name.
    pub fn names(&self, path: &Path) -> bool {
        path.file_name().and_then(|n| n.to_str()) == Some(self.as_str())
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the canonical name of an encoded artifact. Pure; accepts any input,
/// including the empty slice.
pub fn canonical_name(bytes: &[u8]) -> CanonicalName {
    let digest = Md5::digest(bytes);
    CanonicalName(format!("{}.{TARGET_EXT}", hex::encode(digest)))
}
