use crate::error::Result;
use crate::store::IndexStore;
use crate::tokenizer::{term_frequencies, tokenize};
use crate::{Field, IndexedFields, StoredFields};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub generation: u64,
    pub elapsed: Duration,
}

impl BuildStats {
    pub fn indexed(&self) -> usize {
        self.added + self.updated
    }
}

/// Turns documents into store mutations. One upsert per document, one commit per run.
pub struct IndexBuilder<'a> {
    store: &'a IndexStore,
    stats: BuildStats,
    started: Instant,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self { store, stats: BuildStats::default(), started: Instant::now() }
    }

    /// Tokenize title and body and upsert the document under `key`.
    pub fn add_document(&mut self, key: &str, modified: i64, title: &str, body: &str) {
        let indexed = IndexedFields::from([
            (Field::Title, term_frequencies(tokenize(title))),
            (Field::Contents, term_frequencies(tokenize(body))),
        ]);
        let stored = StoredFields { path: key.to_string(), title: title.to_string(), modified };
        if self.store.upsert(key, stored, &indexed) {
            tracing::info!(path = key, "Updating");
            self.stats.updated += 1;
        } else {
            tracing::info!(path = key, "Adding");
            self.stats.added += 1;
        }
    }

    /// Record a document that could not be extracted.
    pub fn skip(&mut self, key: &str, reason: &dyn std::fmt::Display) {
        tracing::warn!(path = key, %reason, "skipping document");
        self.stats.skipped += 1;
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Commit everything added so far as a single new generation.
    pub fn finish(mut self) -> Result<BuildStats> {
        self.stats.generation = self.store.commit()?;
        self.stats.elapsed = self.started.elapsed();
        tracing::info!(
            added = self.stats.added,
            updated = self.stats.updated,
            skipped = self.stats.skipped,
            secs = self.stats.elapsed.as_secs_f64(),
            "index build complete"
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OpenMode;
    use tempfile::tempdir;

    #[test]
    fn indexes_title_and_contents_separately() {
        let dir = tempdir().unwrap();
        let store = IndexStore::open(dir.path(), OpenMode::Create).unwrap();
        let mut builder = IndexBuilder::new(&store);
        builder.add_document("a.html", 42, "Football Club", "Manchester United play football football");
        let stats = builder.finish().unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.generation, 1);

        let reader = store.open_reader();
        let term = &tokenize("football")[0];
        assert_eq!(reader.postings(Field::Title, term)[0].term_freq, 1);
        assert_eq!(reader.postings(Field::Contents, term)[0].term_freq, 2);
        assert_eq!(reader.field_length(0, Field::Title), 2);
        assert_eq!(reader.field_length(0, Field::Contents), 5);
        let stored = reader.stored_fields(0).unwrap();
        assert_eq!(stored.title, "Football Club");
        assert_eq!(stored.modified, 42);
    }

    #[test]
    fn same_key_counts_as_update() {
        let dir = tempdir().unwrap();
        let store = IndexStore::open(dir.path(), OpenMode::Create).unwrap();
        let mut builder = IndexBuilder::new(&store);
        builder.add_document("a.html", 1, "Old", "first text");
        builder.add_document("a.html", 2, "New", "second text");
        builder.skip("b.html", &"unreadable");
        let stats = builder.finish().unwrap();
        assert_eq!((stats.added, stats.updated, stats.skipped), (1, 1, 1));
        assert_eq!(store.open_reader().document_count(), 1);
    }
}
