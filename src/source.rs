//! Record retrieval interface.
//!
//! Fetching records (over the network, from disk, ...) is left to the caller.
//! The mapper only needs something that turns an identifier into raw text.

use crate::error::RetrievalError;
use std::collections::HashMap;

/// A source of raw records, addressed by identifier.
pub trait RecordSource {
    /// Fetch the raw text of the record identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] if the record cannot be provided.
    fn fetch(&self, id: &str) -> Result<String, RetrievalError>;
}

impl RecordSource for HashMap<String, String> {
    fn fetch(&self, id: &str) -> Result<String, RetrievalError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| RetrievalError::new(id, "record not found"))
    }
}

impl<F> RecordSource for F
where
    F: Fn(&str) -> Result<String, RetrievalError>,
{
    fn fetch(&self, id: &str) -> Result<String, RetrievalError> {
        self(id)
    }
}
