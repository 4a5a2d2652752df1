//! Relevance models. A model is picked once per query from its name and then
//! applied to every matched (field, term, document) triple.

use crate::config::Bm25Params;
use crate::error::{Error, Result};
use crate::TermStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Similarity {
    /// tf-idf with sqrt tf and 1/sqrt(field length) normalisation.
    VectorSpace,
    /// Okapi BM25.
    Bm25(Bm25Params),
}

/// Collection-level statistics for one (field, term) pair.
#[derive(Debug, Clone, Copy)]
pub struct TermContext {
    pub document_count: u32,
    pub term: TermStatistics,
    pub average_field_length: f32,
}

impl Similarity {
    /// Resolve a model name (`VS` or `OK`, case-insensitive).
    pub fn from_name(name: &str, bm25: Bm25Params) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vs" => Ok(Similarity::VectorSpace),
            "ok" => Ok(Similarity::Bm25(bm25)),
            _ => Err(Error::Configuration(name.to_string())),
        }
    }

    pub fn idf(&self, ctx: &TermContext) -> f32 {
        let n = ctx.document_count as f32;
        let df = ctx.term.document_frequency as f32;
        match self {
            Similarity::VectorSpace => (n / (df + 1.0)).ln() + 1.0,
            Similarity::Bm25(_) => (1.0 + (n - df + 0.5) / (df + 0.5)).ln(),
        }
    }

    /// Score of one matched term in one field of one document.
    pub fn score(&self, ctx: &TermContext, term_freq: u32, field_length: u32) -> f32 {
        if term_freq == 0 {
            return 0.0;
        }
        let tf = term_freq as f32;
        let idf = self.idf(ctx);
        match *self {
            Similarity::VectorSpace => {
                let norm = if field_length > 0 { 1.0 / (field_length as f32).sqrt() } else { 1.0 };
                tf.sqrt() * idf * norm
            }
            Similarity::Bm25(Bm25Params { k1, b }) => {
                let dl = field_length as f32;
                let avgdl = if ctx.average_field_length > 0.0 { ctx.average_field_length } else { 1.0 };
                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));
                idf * tf_norm
            }
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::VectorSpace => f.write_str("Vector Space Model"),
            Similarity::Bm25(_) => f.write_str("Okapi BM25"),
        }
    }
}
