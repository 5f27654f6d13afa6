//! Text revision diff for Postlens.
//!
//! Aligns two versions of a piece of text (typically an edited comment) at
//! the granularity of words and whitespace runs, producing segments the
//! dashboard renders as kept, removed, and added text.
//!
//! # Key Types
//!
//! - [`TextDiff`] / [`DiffSegment`] / [`SegmentKind`] -- Alignment result
//! - [`diff_strings`] -- Entry point; total over all inputs
//! - [`tokenize`] -- Whitespace-aware tokenizer used by the diff

pub mod segment;
pub mod text_diff;
pub mod token;

pub use segment::{DiffSegment, SegmentKind, TextDiff};
pub use text_diff::{diff_strings, diff_strings_with_limit, TOKEN_LIMIT_CELLS};
pub use token::{is_js_whitespace, tokenize};

/// Alias of [`diff_strings`].
pub fn diff(original: &str, updated: &str) -> TextDiff {
    diff_strings(original, updated)
}
