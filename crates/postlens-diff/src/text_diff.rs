//! Token-level text diff.
//!
//! Both inputs are tokenized into whitespace / non-whitespace runs and
//! aligned with a longest-common-subsequence table. Inputs whose table would
//! exceed [`TOKEN_LIMIT_CELLS`] skip the alignment and get a coarse
//! whole-text replacement instead.

use tracing::trace;

use crate::segment::{merge_adjacent, DiffSegment, TextDiff};
use crate::token::tokenize;

/// Upper bound on `(m + 1) * (n + 1)` LCS table cells.
pub const TOKEN_LIMIT_CELLS: usize = 120_000;

/// Compute the diff between `original` and `updated`.
///
/// Never fails. Concatenating the equal and delete segments yields
/// `original`; concatenating the equal and insert segments yields `updated`.
pub fn diff_strings(original: &str, updated: &str) -> TextDiff {
    diff_strings_with_limit(original, updated, TOKEN_LIMIT_CELLS)
}

/// Like [`diff_strings`], with an explicit LCS table cell limit.
pub fn diff_strings_with_limit(original: &str, updated: &str, cell_limit: usize) -> TextDiff {
    let a = tokenize(original);
    let b = tokenize(updated);

    if a.is_empty() && b.is_empty() {
        return TextDiff::default();
    }
    if a.is_empty() {
        return TextDiff::new(vec![DiffSegment::insert(updated)]);
    }
    if b.is_empty() {
        return TextDiff::new(vec![DiffSegment::delete(original)]);
    }

    let cells = (a.len() + 1).saturating_mul(b.len() + 1);
    if cells > cell_limit {
        trace!(cells, cell_limit, "token table over limit, using whole-text fallback");
        return diff_fallback(&a, &b);
    }

    trace!(
        original_tokens = a.len(),
        updated_tokens = b.len(),
        "aligning tokens"
    );
    TextDiff::new(merge_adjacent(align(&a, &b)))
}

/// Coarse diff for oversized inputs: identical token streams stay equal
/// token by token, anything else is one delete followed by one insert.
fn diff_fallback(a: &[&str], b: &[&str]) -> TextDiff {
    let original = a.concat();
    let updated = b.concat();

    if original == updated {
        return TextDiff::new(a.iter().map(|t| DiffSegment::equal(*t)).collect());
    }

    let mut segments = Vec::with_capacity(2);
    if !a.is_empty() {
        segments.push(DiffSegment::delete(original));
    }
    if !b.is_empty() {
        segments.push(DiffSegment::insert(updated));
    }
    TextDiff::new(segments)
}

/// Exact LCS alignment. Returns unmerged single-token segments.
fn align(a: &[&str], b: &[&str]) -> Vec<DiffSegment> {
    let m = a.len();
    let n = b.len();
    let width = n + 1;

    // dp[i * width + j] = LCS length of a[..i] and b[..j]
    let mut dp = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            dp[i * width + j] = if a[i - 1] == b[j - 1] {
                dp[(i - 1) * width + (j - 1)] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + (j - 1)])
            };
        }
    }

    let mut reversed = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);

    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            reversed.push(DiffSegment::equal(a[i - 1]));
            i -= 1;
            j -= 1;
        } else if dp[(i - 1) * width + j] >= dp[i * width + (j - 1)] {
            // Ties resolve toward deleting from the original.
            reversed.push(DiffSegment::delete(a[i - 1]));
            i -= 1;
        } else {
            reversed.push(DiffSegment::insert(b[j - 1]));
            j -= 1;
        }
    }
    while i > 0 {
        reversed.push(DiffSegment::delete(a[i - 1]));
        i -= 1;
    }
    while j > 0 {
        reversed.push(DiffSegment::insert(b[j - 1]));
        j -= 1;
    }

    reversed.reverse();
    reversed
}
