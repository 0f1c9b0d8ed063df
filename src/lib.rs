//! Extraction of structured citation fields from PubMed/MEDLINE XML records.
//!
//! `medline_fields` turns raw, loosely structured citation records (as returned
//! by the PubMed EFetch service) into rows of scalar and multi-valued fields.
//! Records are read with tolerant patterns rather than an XML parser, so tags
//! may repeat, be missing, or be cut off without failing the batch.
//!
//! # Features
//!
//! - `regex` - Use the `regex` crate as pattern engine (enabled by default)
//! - `lite` - Use `regex-lite` instead, for smaller binaries
//! - `parallel` - Map batches on the rayon thread pool (enabled by default)
//!
//! # Key Characteristics
//!
//! - **Fixed columns**: every row has the same columns; missing data is an
//!   empty string or an empty list, never an absent value.
//! - **Index alignment**: a batch of `n` records always yields `n` rows, in
//!   input order, even when some records are unreadable.
//! - **Field isolation**: a damaged field only empties that field.
//! - **Nested values**: MeSH headings are paired with each of their
//!   qualifiers (`"Liver / pathology"`).
//!
//! # Basic Usage
//!
//! ```rust
//! let record = r#"<PubmedArticle><MedlineCitation>
//!   <PMID Version="1">123</PMID>
//!   <Article>
//!     <ArticleTitle>Sleep and memory.</ArticleTitle>
//!     <AuthorList>
//!       <Author ValidYN="Y"><LastName>Walker</LastName><ForeName>Matthew</ForeName></Author>
//!     </AuthorList>
//!   </Article>
//!   <MeshHeadingList>
//!     <MeshHeading>
//!       <DescriptorName UI="D012890">Sleep</DescriptorName>
//!       <QualifierName UI="Q000502">physiology</QualifierName>
//!     </MeshHeading>
//!   </MeshHeadingList>
//! </MedlineCitation></PubmedArticle>"#;
//!
//! let row = medline_fields::map_record(record);
//! assert_eq!(row.pmid, "123");
//! assert_eq!(row.title, "Sleep and memory.");
//! assert_eq!(row.authors, "Matthew Walker");
//! assert_eq!(row.mesh_headings, vec!["Sleep / physiology"]);
//! assert_eq!(row.doi, "");
//! ```
//!
//! # Configuration
//!
//! ```rust
//! use medline_fields::{FieldMapper, MapperConfig};
//!
//! let mut config = MapperConfig::new();
//! config.set_section_break("\n").set_run_in_parallel(false);
//!
//! let mapper = FieldMapper::with_config(config).unwrap();
//! let batch = mapper.map_batch(&["<PMID>1</PMID>", "<PMID>2</PMID>"]);
//! assert_eq!(batch[1].pmid, "2");
//! ```
//!
//! # Error Handling
//!
//! Data-quality problems never surface as errors: they are logged through
//! [`tracing`] and the affected field or row is left empty. [`ExtractError`]
//! is only returned for invalid configuration and for failures of a
//! [`RecordSource`] during [`FieldMapper::fetch_and_map`].
//!
//! # Thread Safety
//!
//! [`FieldMapper`] and [`FieldPattern`] are immutable after construction and
//! can be shared between threads.

use std::sync::LazyLock;

pub mod error;
pub mod mapper;
pub mod pattern;
pub mod row;
pub mod source;

// Reexports
pub use error::{ExtractError, MalformedRecord, RetrievalError};
pub use mapper::{FieldMapper, MapperConfig};
pub use pattern::{ExtractedField, FieldPattern};
pub use row::{Batch, Column, FieldValue, StructuredRow};
pub use source::RecordSource;

mod regex;
mod utils;

static DEFAULT_MAPPER: LazyLock<FieldMapper> = LazyLock::new(FieldMapper::new);

/// Map one record with the default field table.
///
/// See [`FieldMapper::map_record`].
pub fn map_record(raw: &str) -> StructuredRow {
    DEFAULT_MAPPER.map_record(raw)
}

/// Map a batch of records with the default field table.
///
/// See [`FieldMapper::map_batch`].
pub fn map_batch<S: AsRef<str> + Sync>(records: &[S]) -> Batch {
    DEFAULT_MAPPER.map_batch(records)
}
