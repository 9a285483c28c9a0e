use serde::{Deserialize, Serialize};

/// Per-image conversion settings, resolved once by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Store indices bit-packed or run-length encoded instead of one byte each.
    pub packed: bool,
    /// Reject pixels whose colour is not already in the palette.
    pub strict: bool,
    /// RGB colour rendered fully transparent.
    pub transparent: Option<[u8; 3]>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            packed: true,
            strict: false,
            transparent: None,
        }
    }
}
