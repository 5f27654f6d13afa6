//! Diff segments and the [`TextDiff`] result type.

use serde::{Deserialize, Serialize};

/// How a segment relates the original text to the updated text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Present in both texts.
    Equal,
    /// Present only in the updated text.
    Insert,
    /// Present only in the original text.
    Delete,
}

/// A run of text with a single [`SegmentKind`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
}

impl DiffSegment {
    pub fn new(value: impl Into<String>, kind: SegmentKind) -> Self {
        Self { value: value.into(), kind }
    }

    pub fn equal(value: impl Into<String>) -> Self {
        Self::new(value, SegmentKind::Equal)
    }

    pub fn insert(value: impl Into<String>) -> Self {
        Self::new(value, SegmentKind::Insert)
    }

    pub fn delete(value: impl Into<String>) -> Self {
        Self::new(value, SegmentKind::Delete)
    }

    /// Whether this segment is part of the original text.
    pub fn in_original(&self) -> bool {
        matches!(self.kind, SegmentKind::Equal | SegmentKind::Delete)
    }

    /// Whether this segment is part of the updated text.
    pub fn in_updated(&self) -> bool {
        matches!(self.kind, SegmentKind::Equal | SegmentKind::Insert)
    }
}

/// The alignment of two texts, in original-to-updated order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextDiff {
    pub segments: Vec<DiffSegment>,
}

impl TextDiff {
    pub fn new(segments: Vec<DiffSegment>) -> Self {
        Self { segments }
    }

    /// Returns `true` if there are no segments at all (both inputs empty).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if every segment is [`SegmentKind::Equal`].
    pub fn is_unchanged(&self) -> bool {
        self.segments.iter().all(|s| s.kind == SegmentKind::Equal)
    }

    /// Number of insert segments.
    pub fn insertions(&self) -> usize {
        self.count(SegmentKind::Insert)
    }

    /// Number of delete segments.
    pub fn deletions(&self) -> usize {
        self.count(SegmentKind::Delete)
    }

    /// Characters added by insert segments.
    pub fn inserted_chars(&self) -> usize {
        self.chars(SegmentKind::Insert)
    }

    /// Characters removed by delete segments.
    pub fn deleted_chars(&self) -> usize {
        self.chars(SegmentKind::Delete)
    }

    /// Rebuild the original text from equal and delete segments.
    pub fn original(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.in_original())
            .map(|s| s.value.as_str())
            .collect()
    }

    /// Rebuild the updated text from equal and insert segments.
    pub fn updated(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.in_updated())
            .map(|s| s.value.as_str())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffSegment> {
        self.segments.iter()
    }

    pub fn into_segments(self) -> Vec<DiffSegment> {
        self.segments
    }

    fn count(&self, kind: SegmentKind) -> usize {
        self.segments.iter().filter(|s| s.kind == kind).count()
    }

    fn chars(&self, kind: SegmentKind) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.value.chars().count())
            .sum()
    }
}

impl<'a> IntoIterator for &'a TextDiff {
    type Item = &'a DiffSegment;
    type IntoIter = std::slice::Iter<'a, DiffSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Collapse runs of same-kind segments into one segment each.
pub(crate) fn merge_adjacent(segments: Vec<DiffSegment>) -> Vec<DiffSegment> {
    let mut merged: Vec<DiffSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(prev) if prev.kind == segment.kind => prev.value.push_str(&segment.value),
            _ => merged.push(segment),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_joins_same_kind_runs() {
        let merged = merge_adjacent(vec![
            DiffSegment::equal("a"),
            DiffSegment::equal(" "),
            DiffSegment::delete("b"),
            DiffSegment::delete(" "),
            DiffSegment::insert("c"),
            DiffSegment::equal("d"),
        ]);
        assert_eq!(
            merged,
            vec![
                DiffSegment::equal("a "),
                DiffSegment::delete("b "),
                DiffSegment::insert("c"),
                DiffSegment::equal("d"),
            ]
        );
    }

    #[test]
    fn merge_empty_is_empty() {
        assert!(merge_adjacent(Vec::new()).is_empty());
    }

    #[test]
    fn reconstruction_and_counts() {
        let diff = TextDiff::new(vec![
            DiffSegment::equal("the "),
            DiffSegment::delete("old"),
            DiffSegment::insert("new"),
            DiffSegment::equal(" text"),
        ]);
        assert_eq!(diff.original(), "the old text");
        assert_eq!(diff.updated(), "the new text");
        assert_eq!(diff.insertions(), 1);
        assert_eq!(diff.deletions(), 1);
        assert_eq!(diff.inserted_chars(), 3);
        assert!(!diff.is_unchanged());
    }

    #[test]
    fn serializes_with_type_field() {
        let json = serde_json::to_value(TextDiff::new(vec![DiffSegment::insert("hi")])).unwrap();
        assert_eq!(json, serde_json::json!([{ "value": "hi", "type": "insert" }]));
    }
}
