//! Error types for field extraction.
//!
//! Only configuration mistakes and retrieval failures ever reach the caller of
//! the mapping functions. Data-quality problems inside a record are described
//! by [`MalformedRecord`], which the mapper logs and then replaces with empty
//! values.

use thiserror::Error;

/// Column name constants for consistent error and log reporting.
pub mod fields {
    pub const PMID: &str = "pmid";
    pub const TITLE: &str = "title";
    pub const JOURNAL: &str = "journal";
    pub const JOURNAL_ABBR: &str = "journal_abbr";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const VOLUME: &str = "volume";
    pub const ISSUE: &str = "issue";
    pub const PAGES: &str = "pages";
    pub const START_PAGE: &str = "start_page";
    pub const END_PAGE: &str = "end_page";
    pub const DOI: &str = "doi";
    pub const PMC_ID: &str = "pmc_id";
    pub const LANGUAGE: &str = "language";
    pub const ISSN: &str = "issn";
    pub const AUTHORS: &str = "authors";
    pub const ABSTRACT: &str = "abstract";
    pub const MESH_HEADINGS: &str = "mesh_headings";
    pub const MAJOR_TOPICS: &str = "major_topics";
    pub const KEYWORDS: &str = "keywords";
    pub const PUBLICATION_TYPES: &str = "publication_types";
}

/// Top-level error type for extraction operations.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid pattern for field {field}: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: crate::regex::Error,
    },

    #[error("Group {group} requested for field {field}, but its pattern only has {groups} groups")]
    InvalidGroupOrder {
        field: &'static str,
        group: usize,
        groups: usize,
    },

    #[error("Invalid mapper configuration: {0}")]
    InvalidConfig(String),

    #[error("Nested pattern for field {field} needs an outer pattern with at least two groups")]
    NestedWithoutDetail { field: &'static str },

    #[error(transparent)]
    Malformed(#[from] MalformedRecord),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// A record (or one field of it) that could not be read as citation markup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedRecord {
    #[error("Region for {field} opens with '{opener}' but is never closed")]
    UnclosedScope {
        field: &'static str,
        opener: String,
    },

    #[error("Record is {len} bytes, above the limit of {limit} bytes")]
    RecordTooLarge { len: usize, limit: usize },

    #[error("Record of {len} bytes contains no markup")]
    NoMarkup { len: usize },
}

/// Failure reported by a [`RecordSource`](crate::RecordSource).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unable to retrieve record {id}: {reason}")]
pub struct RetrievalError {
    /// Identifier that was requested
    pub id: String,
    /// Human readable cause
    pub reason: String,
}

impl RetrievalError {
    /// Create a new RetrievalError.
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
