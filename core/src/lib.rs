//! Inverted-index retrieval over a folder of HTML documents, ranked with
//! either a tf-idf vector-space model or Okapi BM25.

pub mod builder;
pub mod config;
pub mod error;
pub mod html;
pub mod index;
pub mod ingest;
pub mod persist;
pub mod query;
pub mod search;
pub mod similarity;
pub mod store;
pub mod tokenizer;

pub use builder::{BuildStats, IndexBuilder};
pub use config::{Bm25Params, SearchConfig, DISPLAY_LIMIT};
pub use error::{Error, Result};
pub use index::{
    DocId, Field, FieldIndex, Generation, IndexedFields, Posting, StoredFields, TermFrequencies, TermId,
    TermStatistics, SEARCH_FIELDS,
};
pub use ingest::{build_index, build_index_with_mode};
pub use query::Query;
pub use search::{run_query, run_query_with, search, SearchHit, SearchResults};
pub use similarity::Similarity;
pub use store::{IndexReader, IndexStore, OpenMode};
