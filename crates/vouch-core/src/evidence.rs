//! Evidence compaction for prompting.
//!
//! Evidence is numbered and joined into one block whose size is bounded no
//! matter how much evidence a retrieval step returns.

use crate::types::EvidenceItem;

/// Default upper bound on the compacted evidence block, in characters.
pub const DEFAULT_MAX_EVIDENCE_CHARS: usize = 6000;

/// Placeholder used by the fact-check prompt when there is no evidence.
pub const NO_EVIDENCE_SENTINEL: &str = "No source evidence was provided.";

/// Serializes evidence into a numbered, size-bounded text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceCompactor {
    max_chars: usize,
}

impl EvidenceCompactor {
    /// Create a compactor that never emits more than `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Compact evidence into `Source N: ...` blocks separated by blank lines.
    ///
    /// Empty entries are dropped; numbering counts the retained entries in
    /// their original order. Returns an empty string when nothing is
    /// retained.
    pub fn compact(&self, items: &[EvidenceItem]) -> String {
        let mut block = items
            .iter()
            .map(|item| item.text.as_str())
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(idx, text)| format!("Source {}: {}", idx + 1, text))
            .collect::<Vec<_>>()
            .join("\n\n");

        truncate_chars(&mut block, self.max_chars);
        block
    }

    /// Like [`compact`](Self::compact), but emits [`NO_EVIDENCE_SENTINEL`]
    /// whenever the compacted block would be empty.
    pub fn compact_or_sentinel(&self, items: &[EvidenceItem]) -> String {
        let block = self.compact(items);
        if block.is_empty() {
            NO_EVIDENCE_SENTINEL.to_string()
        } else {
            block
        }
    }
}

impl Default for EvidenceCompactor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVIDENCE_CHARS)
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
}
