//! Marker-delimited paragraph range deletion.

use super::TemplateDocument;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A pair of marker substrings delimiting a block of body paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRange {
    /// Text contained in the first paragraph to delete
    pub start: String,

    /// Text contained in the last paragraph to delete
    pub end: String,
}

impl DeletionRange {
    /// Create a new marker pair.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// How paragraphs inside a matched range are deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStrategy {
    /// Detach the paragraphs from the document.
    #[default]
    Remove,

    /// Empty the paragraphs' runs but keep the paragraphs.
    ClearText,
}

enum ScanState {
    SearchingStart,
    SearchingEnd { start: usize },
}

/// Locate the inclusive paragraph range for a marker pair.
///
/// The range starts at the first paragraph containing `start` and ends at
/// the first paragraph from there on (the start paragraph included)
/// containing `end`. Returns `None` when either marker is missing or empty.
pub fn find_range<S: AsRef<str>>(
    paragraphs: &[S],
    range: &DeletionRange,
) -> Option<RangeInclusive<usize>> {
    if range.start.is_empty() || range.end.is_empty() {
        return None;
    }

    let mut state = ScanState::SearchingStart;
    for (index, text) in paragraphs.iter().enumerate() {
        let text = text.as_ref();
        if let ScanState::SearchingStart = state {
            if text.contains(&range.start) {
                state = ScanState::SearchingEnd { start: index };
            }
        }
        if let ScanState::SearchingEnd { start } = state {
            if text.contains(&range.end) {
                return Some(start..=index);
            }
        }
    }
    None
}

/// Delete the paragraphs delimited by `range`, returning how many were affected.
///
/// A marker pair that is not found leaves the document untouched.
pub fn delete_range<D: TemplateDocument + ?Sized>(
    doc: &mut D,
    range: &DeletionRange,
    strategy: DeletionStrategy,
) -> usize {
    let Some(found) = find_range(&doc.paragraph_texts(), range) else {
        log::debug!(
            "Deletion markers {:?} .. {:?} not found, nothing removed",
            range.start,
            range.end
        );
        return 0;
    };

    log::debug!(
        "Deleting paragraphs {}..={} ({:?} .. {:?})",
        found.start(),
        found.end(),
        range.start,
        range.end
    );
    match strategy {
        DeletionStrategy::Remove => doc.remove_paragraphs(found),
        DeletionStrategy::ClearText => doc.clear_paragraphs(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_range() {
        let paragraphs = ["P0", "START here", "P2", "MID", "the END", "P5"];
        let range = DeletionRange::new("START", "END");
        assert_eq!(find_range(&paragraphs, &range), Some(1..=4));
    }

    #[test]
    fn test_find_range_same_paragraph() {
        let paragraphs = ["a", "START and END", "END"];
        let range = DeletionRange::new("START", "END");
        assert_eq!(find_range(&paragraphs, &range), Some(1..=1));
    }

    #[test]
    fn test_end_before_start_is_ignored() {
        let paragraphs = ["END", "START", "x"];
        let range = DeletionRange::new("START", "END");
        assert_eq!(find_range(&paragraphs, &range), None);

        let paragraphs = ["END", "START", "END"];
        assert_eq!(find_range(&paragraphs, &range), Some(1..=2));
    }

    #[test]
    fn test_missing_or_empty_markers() {
        let paragraphs = ["START", "x"];
        assert_eq!(find_range(&paragraphs, &DeletionRange::new("START", "END")), None);
        assert_eq!(find_range(&paragraphs, &DeletionRange::new("NOPE", "x")), None);
        assert_eq!(find_range(&paragraphs, &DeletionRange::new("", "x")), None);
    }

    #[test]
    fn test_first_match_only() {
        let paragraphs = ["S", "E", "S", "E"];
        let range = DeletionRange::new("S", "E");
        assert_eq!(find_range(&paragraphs, &range), Some(0..=1));
    }
}
