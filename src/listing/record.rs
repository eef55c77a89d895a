//! Record schema of one list endpoint element.

use serde::Deserialize;

use super::ItemReference;

/// One element of the list endpoint's JSON array.
///
/// Only `url` is read. Every other field (`title`, `publishTime`, ...) is
/// ignored whatever its type, so a record is kept or dropped on its URL alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRecord {
    /// Detail page URL. Required for a record to yield an item.
    #[serde(default)]
    pub url: Option<String>,
}

impl ListRecord {
    /// Converts the record into an item reference when it carries a non-empty URL.
    #[must_use]
    pub fn into_reference(self) -> Option<ItemReference> {
        let url = self.url?;
        let url = url.trim();
        (!url.is_empty()).then(|| ItemReference::new(url))
    }
}
