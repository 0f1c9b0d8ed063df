//! The pattern extractor.
//!
//! A [`FieldPattern`] pulls every occurrence of one field out of a raw record.
//! The search can be narrowed to a scoped region first, and each occurrence
//! can be expanded by a nested pattern applied to its last captured group.
//!
//! # Example
//!
//! ```
//! use medline_fields::{ExtractedField, FieldPattern};
//!
//! let headings = FieldPattern::new(
//!     "mesh",
//!     r"(?s)<MeshHeading>\s*<DescriptorName[^>]*>(.*?)</DescriptorName>(.*?)</MeshHeading>",
//! )
//! .unwrap()
//! .with_nested(r"<QualifierName[^>]*>(.*?)</QualifierName>")
//! .unwrap();
//!
//! let record = "<MeshHeading><DescriptorName>Humans</DescriptorName></MeshHeading>\
//!               <MeshHeading><DescriptorName>Liver</DescriptorName>\
//!               <QualifierName>drug effects</QualifierName>\
//!               <QualifierName>pathology</QualifierName></MeshHeading>";
//!
//! assert_eq!(
//!     headings.extract(record),
//!     ExtractedField::List(vec![
//!         "Humans".to_string(),
//!         "Liver / drug effects".to_string(),
//!         "Liver / pathology".to_string(),
//!     ])
//! );
//! ```

use crate::error::{ExtractError, MalformedRecord};
use crate::regex::{Captures, Regex, escape};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The result of applying one [`FieldPattern`] to one record.
///
/// Absence is always an empty string or an empty list, never a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedField {
    Scalar(String),
    List(Vec<String>),
}

impl ExtractedField {
    /// Whether the field holds an empty string or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedField::Scalar(s) => s.is_empty(),
            ExtractedField::List(v) => v.is_empty(),
        }
    }

    /// Convert to a single string, joining list values with `separator`.
    pub fn into_scalar(self, separator: &str) -> String {
        match self {
            ExtractedField::Scalar(s) => s,
            ExtractedField::List(v) => v.join(separator),
        }
    }

    /// Convert to a list. An empty scalar becomes an empty list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            ExtractedField::Scalar(s) if s.is_empty() => Vec::new(),
            ExtractedField::Scalar(s) => vec![s],
            ExtractedField::List(v) => v,
        }
    }

    /// Borrow the value if it is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ExtractedField::Scalar(s) => Some(s),
            ExtractedField::List(_) => None,
        }
    }

    /// Borrow the values if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ExtractedField::Scalar(_) => None,
            ExtractedField::List(v) => Some(v),
        }
    }
}

/// Region a pattern is restricted to before matching.
#[derive(Debug, Clone)]
struct Scope {
    /// Captures the region in its first group (or whole match without groups)
    region: Regex,
    /// Start of the region; seeing it without a match means the region is cut off
    opener: Option<Regex>,
}

/// A named extraction rule.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    name: &'static str,
    matcher: Regex,
    scope: Option<Scope>,
    nested: Option<Regex>,
    /// 1-based group indices, in the order they are joined
    group_order: Vec<usize>,
    group_separator: String,
    nested_separator: String,
    /// When set, occurrences are joined into one scalar
    join_separator: Option<String>,
}

impl FieldPattern {
    /// Create a pattern named `name` matching `pattern`.
    ///
    /// Every capture group is joined, in declaration order, with a single
    /// space unless [`with_group_separator`](Self::with_group_separator) says
    /// otherwise. A pattern without groups yields the whole match.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, ExtractError> {
        let matcher = compile(name, pattern)?;
        let group_order = (1..matcher.captures_len()).collect();
        Ok(Self {
            name,
            matcher,
            scope: None,
            nested: None,
            group_order,
            group_separator: " ".to_string(),
            nested_separator: " / ".to_string(),
            join_separator: None,
        })
    }

    /// Create a pattern capturing the text of every `<tag ...>text</tag>` element.
    ///
    /// ```
    /// use medline_fields::{ExtractedField, FieldPattern};
    ///
    /// let keywords = FieldPattern::tag("keywords", "Keyword").unwrap();
    /// let record = r#"<KeywordList><Keyword MajorTopicYN="N">aging</Keyword><Keyword>sleep</Keyword></KeywordList>"#;
    /// assert_eq!(
    ///     keywords.extract(record),
    ///     ExtractedField::List(vec!["aging".to_string(), "sleep".to_string()])
    /// );
    /// ```
    pub fn tag(name: &'static str, tag: &str) -> Result<Self, ExtractError> {
        Self::new(name, &element_pattern(tag))
    }

    /// Restrict matching to the region captured by the first match of `pattern`.
    ///
    /// If `opener` is given and matches the record while `pattern` does not,
    /// the region is treated as cut off and the record as malformed.
    pub fn with_scope(mut self, pattern: &str, opener: Option<&str>) -> Result<Self, ExtractError> {
        let region = compile(self.name, pattern)?;
        let opener = opener.map(|o| compile(self.name, o)).transpose()?;
        self.scope = Some(Scope { region, opener });
        Ok(self)
    }

    /// Restrict matching to the content of the first `<tag ...>...</tag>` element.
    pub fn scoped_to_tag(self, tag: &str) -> Result<Self, ExtractError> {
        let opener = format!(r"<{}\b", escape(tag));
        self.with_scope(&element_pattern(tag), Some(&opener))
    }

    /// Expand each occurrence with every match of `pattern` inside its last group.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NestedWithoutDetail`] when the outer pattern has
    /// fewer than two groups, since the first group is the base value and the
    /// last one the detail region.
    pub fn with_nested(mut self, pattern: &str) -> Result<Self, ExtractError> {
        if self.group_count() < 2 {
            return Err(ExtractError::NestedWithoutDetail { field: self.name });
        }
        self.nested = Some(compile(self.name, pattern)?);
        Ok(self)
    }

    /// Join groups in the given order (1-based) instead of declaration order.
    pub fn with_group_order(mut self, order: &[usize]) -> Result<Self, ExtractError> {
        let groups = self.group_count();
        if let Some(&group) = order.iter().find(|&&g| g == 0 || g > groups) {
            return Err(ExtractError::InvalidGroupOrder {
                field: self.name,
                group,
                groups,
            });
        }
        self.group_order = order.to_vec();
        Ok(self)
    }

    /// Separator placed between the groups of one occurrence.
    #[must_use]
    pub fn with_group_separator(mut self, separator: impl Into<String>) -> Self {
        self.group_separator = separator.into();
        self
    }

    /// Separator placed between the base value and one nested value.
    #[must_use]
    pub fn with_nested_separator(mut self, separator: impl Into<String>) -> Self {
        self.nested_separator = separator.into();
        self
    }

    /// Join all occurrences into one scalar with `separator`.
    #[must_use]
    pub fn collapsed(mut self, separator: impl Into<String>) -> Self {
        self.join_separator = Some(separator.into());
        self
    }

    /// Name of the field this pattern extracts.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of capture groups in the match pattern.
    pub fn group_count(&self) -> usize {
        self.matcher.captures_len() - 1
    }

    /// Whether occurrences are joined into one scalar.
    pub fn is_collapsed(&self) -> bool {
        self.join_separator.is_some()
    }

    /// The empty value of this field's shape.
    pub fn empty(&self) -> ExtractedField {
        if self.is_collapsed() {
            ExtractedField::Scalar(String::new())
        } else {
            ExtractedField::List(Vec::new())
        }
    }

    /// Apply the pattern to `text`, logging and swallowing malformed input.
    pub fn extract(&self, text: &str) -> ExtractedField {
        self.extract_logged(text, None)
    }

    /// Apply the pattern to every record, one result per record, in order.
    pub fn extract_batch<S: AsRef<str>>(&self, records: &[S]) -> Vec<ExtractedField> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.extract_logged(record.as_ref(), Some(index)))
            .collect()
    }

    /// Apply the pattern to `text`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRecord::UnclosedScope`] when the scoped region starts
    /// but never ends.
    pub fn try_extract(&self, text: &str) -> Result<ExtractedField, MalformedRecord> {
        let values = self.occurrences(text)?;
        Ok(match &self.join_separator {
            Some(separator) => ExtractedField::Scalar(values.join(separator)),
            None => ExtractedField::List(values),
        })
    }

    /// Every value produced by the pattern, left to right.
    ///
    /// With a nested pattern one occurrence may produce several values.
    pub fn occurrences(&self, text: &str) -> Result<Vec<String>, MalformedRecord> {
        let Some(region) = self.search_region(text)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .matcher
            .captures_iter(region)
            .flat_map(|caps| self.render(&caps))
            .collect())
    }

    /// The raw groups of every occurrence, in group order.
    ///
    /// Unmatched optional groups are empty strings. Nested patterns are not
    /// applied.
    pub fn occurrence_groups(&self, text: &str) -> Result<Vec<Vec<String>>, MalformedRecord> {
        let Some(region) = self.search_region(text)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .matcher
            .captures_iter(region)
            .map(|caps| self.ordered_groups(&caps))
            .collect())
    }

    pub(crate) fn extract_logged(&self, text: &str, record: Option<usize>) -> ExtractedField {
        self.try_extract(text).unwrap_or_else(|error| {
            warn!(field = self.name, record = ?record, %error, "Malformed field, using empty value");
            self.empty()
        })
    }

    fn search_region<'t>(&self, text: &'t str) -> Result<Option<&'t str>, MalformedRecord> {
        let Some(scope) = &self.scope else {
            return Ok(Some(text));
        };
        if let Some(caps) = scope.region.captures(text) {
            return Ok(caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str()));
        }
        if let Some(opener) = scope.opener.as_ref().and_then(|o| o.find(text)) {
            return Err(MalformedRecord::UnclosedScope {
                field: self.name,
                opener: opener.as_str().to_string(),
            });
        }
        debug!(field = self.name, "Scope not found");
        Ok(None)
    }

    fn ordered_groups(&self, caps: &Captures<'_>) -> Vec<String> {
        if self.group_order.is_empty() {
            return vec![group_text(caps, 0).to_string()];
        }
        self.group_order
            .iter()
            .map(|&i| group_text(caps, i).to_string())
            .collect()
    }

    /// Values contributed by one occurrence.
    fn render(&self, caps: &Captures<'_>) -> Vec<String> {
        let Some(nested) = &self.nested else {
            return vec![self.ordered_groups(caps).join(&self.group_separator)];
        };
        let base = group_text(caps, self.group_order.first().copied().unwrap_or(1));
        let detail = group_text(caps, self.group_count());
        let values: Vec<String> = nested
            .captures_iter(detail)
            .map(|inner| {
                let value = if inner.len() > 1 {
                    (1..inner.len())
                        .map(|i| group_text(&inner, i))
                        .join(&self.group_separator)
                } else {
                    group_text(&inner, 0).to_string()
                };
                format!("{}{}{}", base, self.nested_separator, value)
            })
            .collect();
        if values.is_empty() {
            vec![base.to_string()]
        } else {
            values
        }
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern { field, source })
}

fn element_pattern(tag: &str) -> String {
    let tag = escape(tag);
    format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>")
}

fn group_text<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}
