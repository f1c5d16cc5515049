//! Channel Configuration
//!
//! Controls how a channel manages its segment files:
//!
//! - **segment_max_size**: rotate the active segment once its body
//!   exceeds this many bytes (default: 64 MiB). Rotation is decided
//!   before an append, so a single oversized message can push one
//!   segment past the threshold by at most its own frame size.
//!
//! The on-disk format itself is fixed by the constants in
//! [`crate::segment`]; only operational knobs live here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Maximum segment body size in bytes before rotation (default: 64 MiB)
    #[serde(default = "default_segment_max_size")]
    pub segment_max_size: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            segment_max_size: default_segment_max_size(),
        }
    }
}

fn default_segment_max_size() -> u64 {
    64 * 1024 * 1024
}
