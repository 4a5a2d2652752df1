use serde::{Deserialize, Serialize};

/// Number of hits shown for a query unless overridden.
pub const DISPLAY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: usize,
    pub bm25: Bm25Params,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { limit: DISPLAY_LIMIT, bm25: Bm25Params::default() }
    }
}
