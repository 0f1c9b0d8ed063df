//! Structured output rows.
//!
//! Every [`StructuredRow`] carries the same fixed set of columns, whatever the
//! source record contained. Absent values are empty strings or empty lists.

use crate::error::fields;
use crate::pattern::ExtractedField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered sequence of rows, index-aligned with the input records.
pub type Batch = Vec<StructuredRow>;

/// The fixed columns of a [`StructuredRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Pmid,
    Title,
    Journal,
    JournalAbbr,
    Year,
    Month,
    Volume,
    Issue,
    Pages,
    StartPage,
    EndPage,
    Doi,
    PmcId,
    Language,
    Issn,
    Authors,
    Abstract,
    MeshHeadings,
    MajorTopics,
    Keywords,
    PublicationTypes,
}

impl Column {
    /// All columns in output order.
    pub const ALL: [Column; 21] = [
        Column::Pmid,
        Column::Title,
        Column::Journal,
        Column::JournalAbbr,
        Column::Year,
        Column::Month,
        Column::Volume,
        Column::Issue,
        Column::Pages,
        Column::StartPage,
        Column::EndPage,
        Column::Doi,
        Column::PmcId,
        Column::Language,
        Column::Issn,
        Column::Authors,
        Column::Abstract,
        Column::MeshHeadings,
        Column::MajorTopics,
        Column::Keywords,
        Column::PublicationTypes,
    ];

    /// Convert the column to its name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Pmid => fields::PMID,
            Column::Title => fields::TITLE,
            Column::Journal => fields::JOURNAL,
            Column::JournalAbbr => fields::JOURNAL_ABBR,
            Column::Year => fields::YEAR,
            Column::Month => fields::MONTH,
            Column::Volume => fields::VOLUME,
            Column::Issue => fields::ISSUE,
            Column::Pages => fields::PAGES,
            Column::StartPage => fields::START_PAGE,
            Column::EndPage => fields::END_PAGE,
            Column::Doi => fields::DOI,
            Column::PmcId => fields::PMC_ID,
            Column::Language => fields::LANGUAGE,
            Column::Issn => fields::ISSN,
            Column::Authors => fields::AUTHORS,
            Column::Abstract => fields::ABSTRACT,
            Column::MeshHeadings => fields::MESH_HEADINGS,
            Column::MajorTopics => fields::MAJOR_TOPICS,
            Column::Keywords => fields::KEYWORDS,
            Column::PublicationTypes => fields::PUBLICATION_TYPES,
        }
    }

    /// Whether the column holds a list of values rather than one string.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Column::Issn
                | Column::MeshHeadings
                | Column::MajorTopics
                | Column::Keywords
                | Column::PublicationTypes
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed view of one column's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Scalar(&'a str),
    List(&'a [String]),
}

impl FieldValue<'_> {
    /// Whether the value is an empty string or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Scalar(s) => s.is_empty(),
            FieldValue::List(v) => v.is_empty(),
        }
    }

    /// Render the value as a single cell, joining lists with `list_separator`.
    pub fn to_cell(&self, list_separator: &str) -> String {
        match self {
            FieldValue::Scalar(s) => s.to_string(),
            FieldValue::List(v) => v.join(list_separator),
        }
    }
}

/// The structured result of mapping one record through every configured field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRow {
    /// PubMed ID
    pub pmid: String,
    /// Article title
    pub title: String,
    /// Full journal title
    pub journal: String,
    /// ISO journal abbreviation
    pub journal_abbr: String,
    /// Four digit publication year
    pub year: String,
    /// Publication month as written in the record
    pub month: String,
    /// Volume number
    pub volume: String,
    /// Issue number
    pub issue: String,
    /// Page range
    pub pages: String,
    pub start_page: String,
    pub end_page: String,
    /// Digital Object Identifier
    pub doi: String,
    /// PubMed Central ID
    pub pmc_id: String,
    pub language: String,
    pub issn: Vec<String>,
    /// "Forename Lastname" entries joined into one string
    pub authors: String,
    /// Abstract text, with labelled sections joined by the section break
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// MeSH headings, one entry per heading/qualifier pair
    pub mesh_headings: Vec<String>,
    /// Values flagged as major topics
    pub major_topics: Vec<String>,
    pub keywords: Vec<String>,
    pub publication_types: Vec<String>,
    /// Caller-defined fields, keyed by field name
    pub extra_fields: BTreeMap<String, Vec<String>>,
}

impl StructuredRow {
    /// Create a row with every column empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row that still lists every registered extra field.
    pub(crate) fn empty_with_extras<'a>(extra_names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            extra_fields: extra_names
                .into_iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
            ..Self::default()
        }
    }

    /// Borrow the value of `column`.
    pub fn get(&self, column: Column) -> FieldValue<'_> {
        match column {
            Column::Issn => FieldValue::List(&self.issn),
            Column::MeshHeadings => FieldValue::List(&self.mesh_headings),
            Column::MajorTopics => FieldValue::List(&self.major_topics),
            Column::Keywords => FieldValue::List(&self.keywords),
            Column::PublicationTypes => FieldValue::List(&self.publication_types),
            scalar => FieldValue::Scalar(self.scalar_ref(scalar)),
        }
    }

    /// Store `value` into `column`.
    ///
    /// A list stored into a scalar column is joined with `"; "`; a scalar
    /// stored into a list column becomes a one element list unless it is empty.
    pub fn set(&mut self, column: Column, value: ExtractedField) {
        if let Some(slot) = self.list_mut(column) {
            *slot = value.into_list();
        } else if let Some(slot) = self.scalar_mut(column) {
            *slot = value.into_scalar("; ");
        }
    }

    /// Whether every column, extra fields included, is empty.
    pub fn is_empty(&self) -> bool {
        Column::ALL.iter().all(|c| self.get(*c).is_empty())
            && self.extra_fields.values().all(Vec::is_empty)
    }

    /// Column names in cell order: the fixed columns followed by extra fields.
    pub fn header(&self) -> Vec<String> {
        Column::ALL
            .iter()
            .map(|c| c.as_str().to_string())
            .chain(self.extra_fields.keys().cloned())
            .collect()
    }

    /// Flatten the row into cells matching [`StructuredRow::header`].
    pub fn cells(&self, list_separator: &str) -> Vec<String> {
        Column::ALL
            .iter()
            .map(|c| self.get(*c).to_cell(list_separator))
            .chain(self.extra_fields.values().map(|v| v.join(list_separator)))
            .collect()
    }

    fn scalar_ref(&self, column: Column) -> &str {
        match column {
            Column::Pmid => &self.pmid,
            Column::Title => &self.title,
            Column::Journal => &self.journal,
            Column::JournalAbbr => &self.journal_abbr,
            Column::Year => &self.year,
            Column::Month => &self.month,
            Column::Volume => &self.volume,
            Column::Issue => &self.issue,
            Column::Pages => &self.pages,
            Column::StartPage => &self.start_page,
            Column::EndPage => &self.end_page,
            Column::Doi => &self.doi,
            Column::PmcId => &self.pmc_id,
            Column::Language => &self.language,
            Column::Authors => &self.authors,
            Column::Abstract => &self.abstract_text,
            _ => "",
        }
    }

    fn scalar_mut(&mut self, column: Column) -> Option<&mut String> {
        let slot = match column {
            Column::Pmid => &mut self.pmid,
            Column::Title => &mut self.title,
            Column::Journal => &mut self.journal,
            Column::JournalAbbr => &mut self.journal_abbr,
            Column::Year => &mut self.year,
            Column::Month => &mut self.month,
            Column::Volume => &mut self.volume,
            Column::Issue => &mut self.issue,
            Column::Pages => &mut self.pages,
            Column::StartPage => &mut self.start_page,
            Column::EndPage => &mut self.end_page,
            Column::Doi => &mut self.doi,
            Column::PmcId => &mut self.pmc_id,
            Column::Language => &mut self.language,
            Column::Authors => &mut self.authors,
            Column::Abstract => &mut self.abstract_text,
            _ => return None,
        };
        Some(slot)
    }

    fn list_mut(&mut self, column: Column) -> Option<&mut Vec<String>> {
        match column {
            Column::Issn => Some(&mut self.issn),
            Column::MeshHeadings => Some(&mut self.mesh_headings),
            Column::MajorTopics => Some(&mut self.major_topics),
            Column::Keywords => Some(&mut self.keywords),
            Column::PublicationTypes => Some(&mut self.publication_types),
            _ => None,
        }
    }
}
