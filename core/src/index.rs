use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub type TermId = u32;
pub type DocId = u32;

/// Per-document term counts for one field, as produced by the builder.
pub type TermFrequencies = HashMap<String, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Stored, exact-match searchable. Doubles as the document key.
    Path,
    Title,
    /// Indexed only, never stored.
    Contents,
    Modified,
}

/// Fields a free-text query is matched against, in order.
pub const SEARCH_FIELDS: [Field; 2] = [Field::Title, Field::Contents];

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Path => "path",
            Field::Title => "title",
            Field::Contents => "contents",
            Field::Modified => "modified",
        }
    }

    pub fn is_tokenized(&self) -> bool {
        matches!(self, Field::Title | Field::Contents)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(Field::Path),
            "title" => Ok(Field::Title),
            "contents" => Ok(Field::Contents),
            "modified" => Ok(Field::Modified),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Values kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFields {
    pub path: String,
    pub title: String,
    /// Last modification, milliseconds since the Unix epoch.
    pub modified: i64,
}

/// Tokenized fields of one document.
pub type IndexedFields = BTreeMap<Field, TermFrequencies>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStatistics {
    pub document_frequency: u32,
    pub total_occurrences: u64,
}

/// Term dictionary, postings and length statistics of a single tokenized field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldIndex {
    pub dictionary: HashMap<String, TermId>,
    /// Indexed by term id; each list sorted by doc_id.
    pub postings: Vec<Vec<Posting>>,
    pub lengths: HashMap<DocId, u32>,
    pub total_length: u64,
    /// Terms each document contributed, so removal only touches its own lists.
    pub doc_terms: HashMap<DocId, Vec<TermId>>,
    /// Term ids whose posting lists emptied out, ready for reuse.
    pub free_ids: Vec<TermId>,
}

impl FieldIndex {
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.dictionary
            .get(term)
            .and_then(|&tid| self.postings.get(tid as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn term_statistics(&self, term: &str) -> TermStatistics {
        let postings = self.postings(term);
        TermStatistics {
            document_frequency: postings.len() as u32,
            total_occurrences: postings.iter().map(|p| u64::from(p.term_freq)).sum(),
        }
    }

    fn term_id(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = match self.free_ids.pop() {
            Some(tid) => tid,
            None => {
                self.postings.push(Vec::new());
                (self.postings.len() - 1) as TermId
            }
        };
        self.dictionary.insert(term.to_string(), tid);
        tid
    }

    fn insert(&mut self, doc_id: DocId, terms: &TermFrequencies) {
        let mut length = 0u32;
        let mut tids = Vec::with_capacity(terms.len());
        for (term, &tf) in terms {
            if tf == 0 {
                continue;
            }
            let tid = self.term_id(term);
            tids.push(tid);
            let list = &mut self.postings[tid as usize];
            // Doc ids are handed out in increasing order, so appending keeps the list sorted.
            match list.last() {
                Some(last) if last.doc_id >= doc_id => {
                    let at = list.partition_point(|p| p.doc_id < doc_id);
                    list.insert(at, Posting { doc_id, term_freq: tf });
                }
                _ => list.push(Posting { doc_id, term_freq: tf }),
            }
            length += tf;
        }
        self.lengths.insert(doc_id, length);
        self.total_length += u64::from(length);
        self.doc_terms.insert(doc_id, tids);
    }

    fn remove(&mut self, doc_id: DocId) {
        let Some(length) = self.lengths.remove(&doc_id) else { return };
        self.total_length -= u64::from(length);
        let tids = self.doc_terms.remove(&doc_id).unwrap_or_default();
        let mut emptied = Vec::new();
        for tid in tids {
            let list = &mut self.postings[tid as usize];
            if let Ok(at) = list.binary_search_by_key(&doc_id, |p| p.doc_id) {
                list.remove(at);
            }
            if list.is_empty() {
                emptied.push(tid);
            }
        }
        if !emptied.is_empty() {
            self.dictionary.retain(|_, tid| !emptied.contains(tid));
            self.free_ids.extend(emptied);
        }
    }
}

/// One immutable snapshot of the index once committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Generation {
    pub number: u64,
    pub fields: BTreeMap<Field, FieldIndex>,
    pub docs: BTreeMap<DocId, StoredFields>,
    /// Document key (path) -> doc id.
    pub keys: HashMap<String, DocId>,
    pub next_doc_id: DocId,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn field(&self, field: Field) -> Option<&FieldIndex> {
        self.fields.get(&field)
    }

    pub fn average_field_length(&self, field: Field) -> f32 {
        let n = self.document_count();
        match self.field(field) {
            Some(fi) if n > 0 => fi.total_length as f32 / n as f32,
            _ => 0.0,
        }
    }

    /// Add a document, replacing any previous one with the same key.
    /// Returns true when an older version was replaced.
    pub fn upsert(&mut self, key: &str, stored: StoredFields, indexed: &IndexedFields) -> bool {
        let replaced = self.remove(key);
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        for (&field, terms) in indexed {
            if field.is_tokenized() {
                self.fields.entry(field).or_default().insert(doc_id, terms);
            }
        }
        self.docs.insert(doc_id, stored);
        self.keys.insert(key.to_string(), doc_id);
        replaced
    }

    /// Drop the document stored under `key`, if any.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(doc_id) = self.keys.remove(key) else { return false };
        self.docs.remove(&doc_id);
        for fi in self.fields.values_mut() {
            fi.remove(doc_id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(path: &str) -> StoredFields {
        StoredFields { path: path.into(), title: String::new(), modified: 0 }
    }

    fn contents(pairs: &[(&str, u32)]) -> IndexedFields {
        let tf: TermFrequencies = pairs.iter().map(|(t, n)| (t.to_string(), *n)).collect();
        IndexedFields::from([(Field::Contents, tf)])
    }

    #[test]
    fn postings_stay_sorted_by_doc_id() {
        let mut g = Generation::new();
        g.upsert("a", stored("a"), &contents(&[("rust", 1)]));
        g.upsert("b", stored("b"), &contents(&[("rust", 2)]));
        g.upsert("a", stored("a"), &contents(&[("rust", 3)]));
        let ids: Vec<DocId> = g.field(Field::Contents).unwrap().postings("rust").iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn replace_updates_statistics() {
        let mut g = Generation::new();
        g.upsert("a", stored("a"), &contents(&[("rust", 4), ("fast", 1)]));
        assert!(g.upsert("a", stored("a"), &contents(&[("rust", 1)])));
        let fi = g.field(Field::Contents).unwrap();
        assert_eq!(g.document_count(), 1);
        assert_eq!(fi.total_length, 1);
        assert_eq!(fi.term_statistics("fast"), TermStatistics::default());
        assert_eq!(fi.term_statistics("rust"), TermStatistics { document_frequency: 1, total_occurrences: 1 });
    }

    #[test]
    fn emptied_terms_leave_the_dictionary() {
        let mut g = Generation::new();
        g.upsert("a", stored("a"), &contents(&[("gone", 1), ("kept", 1)]));
        g.upsert("b", stored("b"), &contents(&[("kept", 1)]));
        let gone = g.field(Field::Contents).unwrap().dictionary["gone"];
        g.remove("a");

        let fi = g.field(Field::Contents).unwrap();
        assert!(!fi.dictionary.contains_key("gone"));
        assert_eq!(fi.term_statistics("kept").document_frequency, 1);
        assert!(fi.doc_terms.get(&0).is_none());

        let slots = fi.postings.len();
        g.upsert("c", stored("c"), &contents(&[("fresh", 1)]));
        let fi = g.field(Field::Contents).unwrap();
        assert_eq!(fi.dictionary["fresh"], gone);
        assert_eq!(fi.postings.len(), slots);
    }

    #[test]
    fn remove_unknown_key_is_noop() {
        let mut g = Generation::new();
        g.upsert("a", stored("a"), &contents(&[("rust", 1)]));
        assert!(!g.remove("zzz"));
        assert_eq!(g.document_count(), 1);
    }

    #[test]
    fn average_length_counts_every_document() {
        let mut g = Generation::new();
        g.upsert("a", stored("a"), &contents(&[("x", 2), ("y", 2)]));
        g.upsert("b", stored("b"), &contents(&[("x", 2)]));
        assert!((g.average_field_length(Field::Contents) - 3.0).abs() < f32::EPSILON);
        assert_eq!(g.average_field_length(Field::Title), 0.0);
    }

    #[test]
    fn field_names_round_trip() {
        for f in [Field::Path, Field::Title, Field::Contents, Field::Modified] {
            assert_eq!(f.as_str().parse::<Field>().unwrap(), f);
        }
    }
}
