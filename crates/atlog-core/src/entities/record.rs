use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::enums::RecordKind;
use crate::text;

/// An embedded record pulled into memory by the record scanner.
///
/// Never written to disk by the scanner. The bytes are not serialized;
/// output carries the kind, origin and size only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordBuffer {
    pub kind: RecordKind,
    /// Entry path at every nesting level, outermost first.
    pub origin: Vec<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl RecordBuffer {
    #[must_use]
    pub fn new(kind: RecordKind, origin: Vec<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            origin,
            bytes,
        }
    }

    /// Base name of the originating entry.
    #[must_use]
    pub fn name(&self) -> &str {
        let entry = self.origin.last().map_or("", String::as_str);
        entry.rsplit('/').next().unwrap_or(entry)
    }

    /// Lower-cased base name without extension, used to pair records with
    /// their schema documents.
    #[must_use]
    pub fn stem(&self) -> String {
        let name = self.name();
        name.rsplit_once('.')
            .map_or(name, |(stem, _)| stem)
            .to_ascii_lowercase()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Decoded text content.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        text::decode(&self.bytes)
    }
}
