//! Record field mapping and batch assembly.
//!
//! A [`FieldMapper`] owns a read-only field table built once from its
//! [`MapperConfig`]. Mapping a record never fails for data-quality reasons:
//! a field that cannot be read is left empty and logged, and a record that
//! cannot be read at all becomes an all-empty row at the same position.
//!
//! # Example
//!
//! ```
//! use medline_fields::FieldMapper;
//!
//! let record = r#"<PubmedArticle><MedlineCitation>
//!   <PMID Version="1">123</PMID>
//!   <Article><ArticleTitle>Sleep and memory.</ArticleTitle></Article>
//! </MedlineCitation></PubmedArticle>"#;
//!
//! let mapper = FieldMapper::new();
//! let batch = mapper.map_batch(&[record, "not a record"]);
//!
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch[0].pmid, "123");
//! assert_eq!(batch[0].title, "Sleep and memory.");
//! assert!(batch[1].is_empty());
//! ```

mod config;
mod rules;

pub use config::MapperConfig;

use crate::error::{ExtractError, MalformedRecord};
use crate::pattern::{ExtractedField, FieldPattern};
use crate::regex::Regex;
use crate::row::{Batch, Column, StructuredRow};
use crate::source::RecordSource;
use crate::utils::{complete_page_range, decode_entities, join_page_range, squash_whitespace};
use rules::{FieldRule, field_table};
use std::sync::LazyLock;
use tracing::{debug, error, info, instrument, warn};

static RECORD_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<PMID\b[^>]*>\s*(\d+)").unwrap());

/// Maps raw records to [`StructuredRow`]s.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    config: MapperConfig,
    rules: Vec<FieldRule>,
    extras: Vec<FieldPattern>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    /// Creates a mapper with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapperConfig::new()).expect("built-in field table is valid")
    }

    /// Creates a mapper with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidConfig`] if the configuration does not validate.
    pub fn with_config(config: MapperConfig) -> Result<Self, ExtractError> {
        config.validate().map_err(ExtractError::InvalidConfig)?;
        let rules = field_table(&config)?;
        Ok(Self {
            config,
            rules,
            extras: Vec::new(),
        })
    }

    /// Registers a caller-defined field, reported under `extra_fields`.
    ///
    /// ```
    /// use medline_fields::{FieldMapper, FieldPattern};
    ///
    /// let mapper = FieldMapper::new()
    ///     .with_extra_field(FieldPattern::tag("grants", "GrantID").unwrap());
    /// let row = mapper.map_record("<GrantList><Grant><GrantID>R01 AG1</GrantID></Grant></GrantList>");
    /// assert_eq!(row.extra_fields["grants"], vec!["R01 AG1"]);
    /// ```
    #[must_use]
    pub fn with_extra_field(mut self, pattern: FieldPattern) -> Self {
        self.extras.push(pattern);
        self
    }

    /// Gets a reference to the current configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Column names of every row this mapper produces, in cell order.
    pub fn columns(&self) -> Vec<String> {
        self.empty_row().header()
    }

    /// Flatten `row` into cells matching [`FieldMapper::columns`], joining
    /// list columns with the configured list separator.
    pub fn cells(&self, row: &StructuredRow) -> Vec<String> {
        row.cells(&self.config.list_separator)
    }

    /// Map one record. Never fails; unreadable input yields an empty row.
    pub fn map_record(&self, raw: &str) -> StructuredRow {
        self.map_indexed(None, raw).0
    }

    /// Map one record, reporting record-level problems instead of hiding them.
    ///
    /// Field-level problems are still logged and replaced by empty values.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRecord`] if the record is too large or holds no markup.
    pub fn try_map_record(&self, raw: &str) -> Result<StructuredRow, MalformedRecord> {
        self.map_fields(None, raw)
    }

    /// Map every record, returning exactly one row per record in input order.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn map_batch<S: AsRef<str> + Sync>(&self, records: &[S]) -> Batch {
        info!("Mapping batch");
        let mapped: Vec<(StructuredRow, bool)> = self.map_all(records);
        let failed = mapped.iter().filter(|(_, ok)| !ok).count();
        info!(failed, "Finished mapping batch");
        mapped.into_iter().map(|(row, _)| row).collect()
    }

    /// Fetch every identifier from `source`, then map the fetched records.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Retrieval`] for the first identifier the source
    /// cannot provide. Nothing is mapped in that case.
    #[instrument(skip(self, source, ids), fields(ids = ids.len()))]
    pub fn fetch_and_map<R, S>(&self, source: &R, ids: &[S]) -> Result<Batch, ExtractError>
    where
        R: RecordSource + ?Sized,
        S: AsRef<str>,
    {
        let records = ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                debug!(id, "Fetching record");
                source.fetch(id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(fetched = records.len(), "Fetched records");
        Ok(self.map_batch(&records))
    }

    fn map_all<S: AsRef<str> + Sync>(&self, records: &[S]) -> Vec<(StructuredRow, bool)> {
        #[cfg(feature = "parallel")]
        {
            if self.config.run_in_parallel {
                use rayon::prelude::*;

                return records
                    .par_iter()
                    .enumerate()
                    .map(|(index, raw)| self.map_indexed(Some(index), raw.as_ref()))
                    .collect();
            }
        }

        records
            .iter()
            .enumerate()
            .map(|(index, raw)| self.map_indexed(Some(index), raw.as_ref()))
            .collect()
    }

    /// Map one record, substituting an empty row on record-level failure.
    fn map_indexed(&self, index: Option<usize>, raw: &str) -> (StructuredRow, bool) {
        match self.map_fields(index, raw) {
            Ok(row) => (row, true),
            Err(err) => {
                error!(
                    record = ?index,
                    id = %record_identifier(raw),
                    columns = ?self.columns(),
                    error = %err,
                    "Record could not be mapped, emitting empty row"
                );
                (self.empty_row(), false)
            }
        }
    }

    fn map_fields(&self, index: Option<usize>, raw: &str) -> Result<StructuredRow, MalformedRecord> {
        self.check_record(raw)?;

        let mut row = self.empty_row();
        for rule in &self.rules {
            let value = rule.apply(raw, &self.config).unwrap_or_else(|err| {
                warn!(field = rule.column.as_str(), record = ?index, error = %err, "Malformed field, using empty value");
                ExtractedField::Scalar(String::new())
            });
            row.set(rule.column, self.normalize(value));
        }

        if row.pages.is_empty() {
            row.pages = join_page_range(&row.start_page, &row.end_page);
        }
        if self.config.complete_page_ranges {
            row.pages = complete_page_range(&row.pages);
        }

        for pattern in &self.extras {
            let value = pattern.extract_logged(raw, index);
            row.extra_fields
                .insert(pattern.name().to_string(), self.normalize(value).into_list());
        }

        debug!(
            record = ?index,
            filled = Column::ALL.iter().filter(|c| !row.get(**c).is_empty()).count(),
            "Mapped record"
        );
        Ok(row)
    }

    fn check_record(&self, raw: &str) -> Result<(), MalformedRecord> {
        if raw.len() > self.config.max_record_bytes {
            return Err(MalformedRecord::RecordTooLarge {
                len: raw.len(),
                limit: self.config.max_record_bytes,
            });
        }
        if !raw.contains('<') {
            return Err(MalformedRecord::NoMarkup { len: raw.len() });
        }
        Ok(())
    }

    fn normalize(&self, value: ExtractedField) -> ExtractedField {
        match value {
            ExtractedField::Scalar(s) => ExtractedField::Scalar(self.normalize_str(s)),
            ExtractedField::List(v) => {
                ExtractedField::List(v.into_iter().map(|s| self.normalize_str(s)).collect())
            }
        }
    }

    fn normalize_str(&self, value: String) -> String {
        let value = if self.config.decode_entities {
            decode_entities(&value).into_owned()
        } else {
            value
        };
        if self.config.squash_whitespace {
            squash_whitespace(&value).into_owned()
        } else {
            value
        }
    }

    fn empty_row(&self) -> StructuredRow {
        StructuredRow::empty_with_extras(self.extras.iter().map(|p| p.name()))
    }
}

/// Best-effort identifier of a record for log messages.
fn record_identifier(raw: &str) -> &str {
    RECORD_ID_REGEX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or("unknown", |m| m.as_str())
}
