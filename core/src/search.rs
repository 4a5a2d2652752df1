//! Query execution: parse, retrieve, score, rank, truncate.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::query::Query;
use crate::similarity::{Similarity, TermContext};
use crate::store::IndexReader;
use crate::{DocId, StoredFields};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredHit {
    pub doc_id: DocId,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f32,
    pub stored: StoredFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub similarity: Similarity,
    /// Number of matching documents before truncation.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
    pub took: Duration,
}

/// Score every document matching at least one (field, term) clause.
pub fn score_candidates(reader: &IndexReader, query: &Query, similarity: Similarity) -> Vec<ScoredHit> {
    let n = reader.document_count();
    let mut scores: HashMap<DocId, f32> = HashMap::new();

    for (field, term) in query.clauses() {
        let postings = reader.postings(field, &term.text);
        if postings.is_empty() {
            continue;
        }
        let ctx = TermContext {
            document_count: n,
            term: reader.term_statistics(field, &term.text),
            average_field_length: reader.average_field_length(field),
        };
        tracing::debug!(%field, term = %term.text, df = ctx.term.document_frequency, "matched clause");
        for p in postings {
            let contrib = similarity.score(&ctx, p.term_freq, reader.field_length(p.doc_id, field));
            *scores.entry(p.doc_id).or_insert(0.0) += contrib * term.count as f32;
        }
    }

    let mut scored: Vec<ScoredHit> = scores.into_iter().map(|(doc_id, score)| ScoredHit { doc_id, score }).collect();
    rank(&mut scored);
    scored
}

/// Score descending, ties by ascending doc id.
pub fn rank(hits: &mut [ScoredHit]) {
    hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.doc_id.cmp(&b.doc_id),
        other => other,
    });
}

/// Run `query_text` against a pinned reader and keep the top `limit` hits.
pub fn search(reader: &IndexReader, query_text: &str, similarity: Similarity, limit: usize) -> Result<SearchResults> {
    let start = Instant::now();
    let query = Query::parse(query_text)?;
    let scored = score_candidates(reader, &query, similarity);
    let total_hits = scored.len();

    let hits = scored
        .into_iter()
        .take(limit)
        .filter_map(|h| {
            reader
                .stored_fields(h.doc_id)
                .map(|stored| SearchHit { doc_id: h.doc_id, score: h.score, stored: stored.clone() })
        })
        .collect();

    let took = start.elapsed();
    tracing::info!(query = query_text, model = %similarity, total_hits, generation = reader.generation(), "search complete");
    Ok(SearchResults { query: query_text.to_string(), similarity, total_hits, hits, took })
}

/// Open the index at `index_location` and run a query with the named model (`VS` or `OK`).
pub fn run_query<P: AsRef<Path>>(index_location: P, query_text: &str, model_name: &str) -> Result<SearchResults> {
    run_query_with(index_location, query_text, model_name, &SearchConfig::default())
}

pub fn run_query_with<P: AsRef<Path>>(
    index_location: P,
    query_text: &str,
    model_name: &str,
    config: &SearchConfig,
) -> Result<SearchResults> {
    let similarity = Similarity::from_name(model_name, config.bm25)?;
    let reader = IndexReader::open(index_location)?;
    search(&reader, query_text, similarity, config.limit)
}
