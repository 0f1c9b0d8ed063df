//! Mapper configuration.
//!
//! Separators and normalisation switches used when the field table turns
//! pattern occurrences into row values.

/// Default upper bound on the size of one record, in bytes.
pub(crate) const DEFAULT_MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for [`FieldMapper`](crate::FieldMapper).
///
/// # Examples
///
/// ```
/// use medline_fields::MapperConfig;
///
/// let mut config = MapperConfig::new();
/// config
///     .set_author_separator("; ")
///     .set_section_break("\n\n")
///     .set_qualifier_separator("/");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Joins "Forename Lastname" entries in the authors column
    pub(crate) author_separator: String,
    /// Placed between labelled abstract sections
    pub(crate) section_break: String,
    /// Placed between an abstract section label and its text
    pub(crate) section_label_separator: String,
    /// Placed between a MeSH heading and one of its qualifiers
    pub(crate) qualifier_separator: String,
    /// Joins list values when a row is flattened into cells
    pub(crate) list_separator: String,
    /// Decode XML character references in extracted values
    pub(crate) decode_entities: bool,
    /// Collapse whitespace runs inside extracted values
    pub(crate) squash_whitespace: bool,
    /// Expand abbreviated page ranges such as "1234-45"
    pub(crate) complete_page_ranges: bool,
    /// Map batch records on the rayon thread pool
    pub(crate) run_in_parallel: bool,
    /// Records larger than this are treated as malformed
    pub(crate) max_record_bytes: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperConfig {
    /// Creates a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            author_separator: ", ".to_string(),
            section_break: "<br>".to_string(),
            section_label_separator: ": ".to_string(),
            qualifier_separator: " / ".to_string(),
            list_separator: "; ".to_string(),
            decode_entities: true,
            squash_whitespace: false,
            complete_page_ranges: true,
            run_in_parallel: true,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
        }
    }

    /// Sets the separator between authors
    pub fn set_author_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.author_separator = separator.into();
        self
    }

    /// Sets the break placed between labelled abstract sections
    pub fn set_section_break(&mut self, separator: impl Into<String>) -> &mut Self {
        self.section_break = separator.into();
        self
    }

    /// Sets the separator between an abstract section label and its text
    pub fn set_section_label_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.section_label_separator = separator.into();
        self
    }

    /// Sets the separator between a MeSH heading and a qualifier
    pub fn set_qualifier_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.qualifier_separator = separator.into();
        self
    }

    /// Sets the separator used when flattening list columns into cells
    pub fn set_list_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.list_separator = separator.into();
        self
    }

    /// Sets whether XML character references are decoded
    pub fn set_decode_entities(&mut self, decode: bool) -> &mut Self {
        self.decode_entities = decode;
        self
    }

    /// Sets whether whitespace runs are collapsed into single spaces
    pub fn set_squash_whitespace(&mut self, squash: bool) -> &mut Self {
        self.squash_whitespace = squash;
        self
    }

    /// Sets whether abbreviated page ranges are expanded
    pub fn set_complete_page_ranges(&mut self, complete: bool) -> &mut Self {
        self.complete_page_ranges = complete;
        self
    }

    /// Sets whether batches are mapped in parallel (needs the `parallel` feature)
    pub fn set_run_in_parallel(&mut self, parallel: bool) -> &mut Self {
        self.run_in_parallel = parallel;
        self
    }

    /// Sets the largest record, in bytes, that will be mapped
    pub fn set_max_record_bytes(&mut self, limit: usize) -> &mut Self {
        self.max_record_bytes = limit;
        self
    }

    /// Gets the separator used when flattening list columns into cells
    pub fn list_separator(&self) -> &str {
        &self.list_separator
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_record_bytes == 0 {
            return Err("Maximum record size must be greater than zero".to_string());
        }
        if self.author_separator.is_empty() {
            return Err("Author separator cannot be empty".to_string());
        }
        if self.section_break.is_empty() {
            return Err("Section break cannot be empty".to_string());
        }
        if self.qualifier_separator.is_empty() {
            return Err("Qualifier separator cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = MapperConfig::new();
        assert_eq!(config.author_separator, ", ");
        assert_eq!(config.section_break, "<br>");
        assert_eq!(config.qualifier_separator, " / ");
        assert!(config.decode_entities);
        assert!(!config.squash_whitespace);
        assert_eq!(config.max_record_bytes, DEFAULT_MAX_RECORD_BYTES);
    }

    #[test]
    fn test_validate_success() {
        assert!(MapperConfig::new().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = MapperConfig::new();
        config.set_max_record_bytes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_separators() {
        let mut config = MapperConfig::new();
        config.set_author_separator("");
        assert!(config.validate().is_err());

        let mut config = MapperConfig::new();
        config.set_section_break("");
        assert!(config.validate().is_err());

        let mut config = MapperConfig::new();
        config.set_qualifier_separator("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_chaining() {
        let mut config = MapperConfig::new();
        config
            .set_author_separator("; ")
            .set_section_break("\n")
            .set_section_label_separator(" - ")
            .set_qualifier_separator("/")
            .set_list_separator("|")
            .set_decode_entities(false)
            .set_squash_whitespace(true)
            .set_complete_page_ranges(false)
            .set_run_in_parallel(false)
            .set_max_record_bytes(1024);

        assert_eq!(config.author_separator, "; ");
        assert_eq!(config.section_break, "\n");
        assert_eq!(config.section_label_separator, " - ");
        assert_eq!(config.qualifier_separator, "/");
        assert_eq!(config.list_separator(), "|");
        assert!(!config.decode_entities);
        assert!(config.squash_whitespace);
        assert!(!config.complete_page_ranges);
        assert!(!config.run_in_parallel);
        assert_eq!(config.max_record_bytes, 1024);
    }
}
