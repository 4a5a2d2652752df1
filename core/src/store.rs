//! Generation-based inverted index store.
//!
//! Writers mutate a private pending copy of the current generation. `commit`
//! persists it and swaps it in as the new current generation; readers hold an
//! `Arc` to whichever generation was current when they were opened. The store
//! is `Sync`, so one build thread and any number of reader threads can share it.

use crate::error::{Error, Result};
use crate::persist::{self, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::{DocId, Field, Generation, IndexedFields, Posting, StoredFields, TermStatistics};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Discard whatever is at the location and start empty.
    Create,
    /// Continue from the latest committed generation, creating one if absent.
    CreateOrAppend,
}

pub struct IndexStore {
    paths: IndexPaths,
    current: RwLock<Arc<Generation>>,
    pending: Mutex<Generation>,
}

impl IndexStore {
    pub fn open<P: AsRef<Path>>(location: P, mode: OpenMode) -> Result<Self> {
        let paths = IndexPaths::new(location);
        let unavailable = |source: io::Error| Error::StoreUnavailable { path: paths.root.clone(), source };

        fs::create_dir_all(&paths.root).map_err(unavailable)?;
        let marker = paths.root.join(".write-check");
        fs::write(&marker, b"").and_then(|_| fs::remove_file(&marker)).map_err(unavailable)?;

        let committed = match (mode, persist::load_current(&paths)) {
            (_, Ok(found)) => found,
            // A damaged index is about to be thrown away anyway.
            (OpenMode::Create, Err(e)) => {
                tracing::warn!(root = %paths.root.display(), error = %e, "discarding unreadable index");
                None
            }
            (OpenMode::CreateOrAppend, Err(e)) => return Err(unavailable(e)),
        };
        let current = committed.unwrap_or_default();
        let pending = match mode {
            OpenMode::Create => Generation { number: current.number, ..Generation::new() },
            OpenMode::CreateOrAppend => current.clone(),
        };
        tracing::debug!(root = %paths.root.display(), ?mode, generation = current.number, "opened index store");
        Ok(Self { paths, current: RwLock::new(Arc::new(current)), pending: Mutex::new(pending) })
    }

    /// Add a document to the pending generation, replacing any earlier version with the same key.
    /// Returns true when an existing document was replaced.
    pub fn upsert(&self, key: &str, stored: StoredFields, indexed: &IndexedFields) -> bool {
        self.pending.lock().upsert(key, stored, indexed)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.pending.lock().remove(key)
    }

    /// Number of documents in the pending generation.
    pub fn pending_count(&self) -> u32 {
        self.pending.lock().document_count()
    }

    /// Persist the pending generation and make it current.
    /// On failure the previously committed generation stays current.
    pub fn commit(&self) -> Result<u64> {
        let mut pending = self.pending.lock();
        let number = self.current.read().number + 1;
        let mut next = pending.clone();
        next.number = number;

        let failed = |source: io::Error| Error::CommitFailed { path: self.paths.root.clone(), generation: number, source };
        persist::save_generation(&self.paths, &next).map_err(failed)?;
        let meta = MetaFile {
            generation: number,
            num_docs: next.document_count(),
            created_at: persist::now_rfc3339(),
            version: FORMAT_VERSION,
        };
        persist::save_meta(&self.paths, &meta).map_err(failed)?;
        persist::remove_stale_generations(&self.paths, number);

        pending.number = number;
        *self.current.write() = Arc::new(next);
        tracing::info!(generation = number, num_docs = meta.num_docs, "committed index generation");
        Ok(number)
    }

    /// A reader pinned to the generation current right now.
    pub fn open_reader(&self) -> IndexReader {
        IndexReader { generation: Arc::clone(&self.current.read()) }
    }

    pub fn location(&self) -> &Path {
        &self.paths.root
    }
}

/// Read-only view of one committed generation.
#[derive(Debug, Clone)]
pub struct IndexReader {
    generation: Arc<Generation>,
}

impl IndexReader {
    /// Open the latest generation committed at `location`.
    pub fn open<P: AsRef<Path>>(location: P) -> Result<Self> {
        let paths = IndexPaths::new(location);
        let unavailable = |reason: String| Error::IndexUnavailable { path: paths.root.clone(), reason };
        match persist::load_current(&paths) {
            Ok(Some(generation)) => Ok(Self { generation: Arc::new(generation) }),
            Ok(None) => Err(unavailable("no committed index found".into())),
            Err(e) => Err(unavailable(e.to_string())),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.number
    }

    pub fn document_count(&self) -> u32 {
        self.generation.document_count()
    }

    pub fn term_statistics(&self, field: Field, term: &str) -> TermStatistics {
        self.generation
            .field(field)
            .map(|fi| fi.term_statistics(term))
            .unwrap_or_default()
    }

    pub fn postings(&self, field: Field, term: &str) -> &[Posting] {
        self.generation.field(field).map(|fi| fi.postings(term)).unwrap_or(&[])
    }

    pub fn field_length(&self, doc_id: DocId, field: Field) -> u32 {
        self.generation
            .field(field)
            .and_then(|fi| fi.lengths.get(&doc_id).copied())
            .unwrap_or(0)
    }

    pub fn average_field_length(&self, field: Field) -> f32 {
        self.generation.average_field_length(field)
    }

    pub fn stored_fields(&self, doc_id: DocId) -> Option<&StoredFields> {
        self.generation.docs.get(&doc_id)
    }

    /// Exact-match lookup on the document key.
    pub fn lookup(&self, key: &str) -> Option<DocId> {
        self.generation.keys.get(key).copied()
    }
}
