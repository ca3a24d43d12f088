//! Cache path validation and normalization.

use std::fmt;

use percent_encoding::percent_decode_str;

use super::store::TMP_DIR;
use crate::{Error, Result};

/// A validated, normalized relative path; the identity key for caching.
///
/// Built from a raw request path: the query string is stripped,
/// percent-escapes are decoded, duplicate slashes collapse, and any
/// `.`/`..` segment is rejected, as is a leading `.tmp` segment (the
/// store's write-staging directory). The stored form has no leading
/// slash, so joining it onto the cache root can never escape the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath(String);

impl CachePath {
    /// Parse and validate a raw request path.
    ///
    /// Decoding happens before validation, so encoded traversal
    /// (`%2e%2e`) is caught the same as the literal form.
    pub fn parse(raw: &str) -> Result<Self> {
        // Query string is not part of the cache identity
        let raw = raw.split('?').next().unwrap_or(raw);

        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| Error::InvalidPath(format!("`{raw}` is not valid UTF-8 once decoded")))?;

        if decoded.contains('\0') || decoded.contains('\\') {
            return Err(Error::InvalidPath(format!(
                "`{raw}` contains forbidden characters"
            )));
        }

        let mut segments = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                // Duplicate slashes collapse; dot segments are rejected
                // outright rather than resolved.
                "" => continue,
                "." | ".." => {
                    return Err(Error::InvalidPath(format!(
                        "`{raw}` contains a dot segment"
                    )));
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(Error::InvalidPath(
                "path does not name a file".to_string(),
            ));
        }

        // A leading `.tmp` segment would map into the store's
        // write-staging directory, where in-progress writes live.
        if segments[0] == TMP_DIR {
            return Err(Error::InvalidPath(format!(
                "`{raw}` names the write-staging directory"
            )));
        }

        Ok(Self(segments.join("/")))
    }

    /// The normalized relative path, without a leading slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
