//! Quote data structure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A quote harvested from the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quote {
    /// Quote body, without the decorative quotation marks
    pub text: String,

    /// Attributed author
    pub author: String,
}

impl Quote {
    /// Cache field holding the quote body.
    pub const TEXT_FIELD: &'static str = "text";

    /// Cache field holding the author.
    pub const AUTHOR_FIELD: &'static str = "author";

    /// Substituted on read when an entry has no author field.
    pub const UNKNOWN_AUTHOR: &'static str = "Unknown";

    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }

    /// Field map as written to the cache.
    pub fn fields(&self) -> [(&'static str, &str); 2] {
        [
            (Self::TEXT_FIELD, self.text.as_str()),
            (Self::AUTHOR_FIELD, self.author.as_str()),
        ]
    }

    /// Rebuild a quote from a cached field map.
    ///
    /// Returns `None` without a text field. A missing author becomes
    /// [`Quote::UNKNOWN_AUTHOR`].
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let text = fields.get(Self::TEXT_FIELD)?.clone();
        let author = fields
            .get(Self::AUTHOR_FIELD)
            .cloned()
            .unwrap_or_else(|| Self::UNKNOWN_AUTHOR.to_string());
        Some(Self { text, author })
    }

    /// Stable digest of text and author, used for content-addressed keys.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.author.as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }
}
