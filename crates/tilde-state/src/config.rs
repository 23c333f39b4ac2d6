use serde::{Deserialize, Serialize};
use tilde_template::ROOT_PATH;

/// Largest integer a double can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Smallest wrap that still lets consecutive revisions differ (`1, 2, 1, ...`).
pub const MIN_REVISION_WRAP: u64 = 3;

/// Store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Revisions wrap back to 1 before reaching this value.
    ///
    /// Values below [`MIN_REVISION_WRAP`] are treated as [`MIN_REVISION_WRAP`].
    pub revision_wrap: u64,
    /// Maximum nesting depth scanned for upstream references.
    pub reference_scan_depth: usize,
    /// First segment of every absolute path addressing this store.
    pub root_segment: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            revision_wrap: MAX_SAFE_INTEGER,
            reference_scan_depth: 50,
            root_segment: ROOT_PATH.to_owned(),
        }
    }
}

impl StoreConfig {
    /// Set the revision wrap, raised to at least [`MIN_REVISION_WRAP`].
    pub fn with_revision_wrap(mut self, wrap: u64) -> Self {
        self.revision_wrap = wrap.max(MIN_REVISION_WRAP);
        self
    }

    pub fn with_reference_scan_depth(mut self, depth: usize) -> Self {
        self.reference_scan_depth = depth;
        self
    }

    pub fn with_root_segment(mut self, root: impl Into<String>) -> Self {
        self.root_segment = root.into();
        self
    }

    /// The revision following `revision`.
    #[inline]
    pub(crate) fn next_revision(&self, revision: u64) -> u64 {
        let modulus = self.revision_wrap.max(MIN_REVISION_WRAP) - 1;
        (revision % modulus) + 1
    }
}
