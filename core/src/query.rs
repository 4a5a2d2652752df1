use crate::error::{Error, Result};
use crate::index::{Field, SEARCH_FIELDS};
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    /// Occurrences in the query; repeated terms weigh proportionally more.
    pub count: u32,
}

/// OR of every query term over every target field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub terms: Vec<QueryTerm>,
    pub fields: Vec<Field>,
}

impl Query {
    /// Normalize `raw` with the same tokenizer used at index time.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_for_fields(raw, &SEARCH_FIELDS)
    }

    pub fn parse_for_fields(raw: &str, fields: &[Field]) -> Result<Self> {
        let mut terms: Vec<QueryTerm> = Vec::new();
        for token in tokenize(raw) {
            match terms.iter_mut().find(|t| t.text == token) {
                Some(t) => t.count += 1,
                None => terms.push(QueryTerm { text: token, count: 1 }),
            }
        }
        if terms.is_empty() {
            return Err(Error::QueryUnparsable(raw.to_string()));
        }
        Ok(Self { raw: raw.to_string(), terms, fields: fields.to_vec() })
    }

    /// Every (field, term) clause of the query.
    pub fn clauses(&self) -> impl Iterator<Item = (Field, &QueryTerm)> + '_ {
        self.fields
            .iter()
            .flat_map(move |&field| self.terms.iter().map(move |term| (field, term)))
    }
}
