//! Row-split (prefix-sum) primitives.
//!
//! A row-split table for `n` rows has `n + 1` entries, starts at 0 and never decreases;
//! `rs[i + 1] - rs[i]` is the number of entries of row `i` along the ragged axis.
//!
//! ```text
//! lengths      [2, 0, 3]
//! row splits   [0, 2, 2, 5]
//!
//! split_at(rs, 2)  ->  prefix [0, 2, 2]   rs becomes [0, 3]
//! merge([0, 2, 2], [0, 3])  ->  [0, 2, 2, 5]
//! ```
use crate::array::error::{ArrayError, ArrayResult};

/// Check that `row_splits` is empty or starts at 0 and never decreases.
pub fn validate(row_splits: &[i64]) -> ArrayResult<()> {
    let Some(&first) = row_splits.first() else {
        return Ok(());
    };
    if first != 0 {
        return Err(ArrayError::MalformedRowSplits {
            reason: "row splits must start at 0",
        });
    }
    if row_splits.windows(2).any(|w| w[1] < w[0]) {
        return Err(ArrayError::MalformedRowSplits {
            reason: "row splits must be non-decreasing",
        });
    }
    Ok(())
}

/// Concatenate two row-split tables.
///
/// Every entry of `b` is offset by the last entry of `a`, and `b[0]` (the junction, equal to
/// `a`'s last entry after offsetting) is dropped. If either input is empty the other is
/// returned unchanged.
pub fn merge(a: &[i64], b: &[i64]) -> Vec<i64> {
    let (Some(&last), Some(_)) = (a.last(), b.first()) else {
        return if a.is_empty() { b.to_vec() } else { a.to_vec() };
    };
    let mut out = Vec::with_capacity(a.len() + b.len() - 1);
    out.extend_from_slice(a);
    out.extend(b[1..].iter().map(|v| last + v));
    out
}

/// Split `row_splits` at `pivot` in place.
///
/// Returns the prefix `row_splits[..=pivot]` unchanged and rewrites `row_splits` to
/// `row_splits[pivot..]`, rebased to start at 0.
///
/// # Errors
/// [`ArrayError::RowSplitIndexOutOfRange`] if `pivot >= row_splits.len()`.
pub fn split_at(row_splits: &mut Vec<i64>, pivot: usize) -> ArrayResult<Vec<i64>> {
    if pivot >= row_splits.len() {
        return Err(ArrayError::RowSplitIndexOutOfRange {
            index: pivot,
            len: row_splits.len(),
        });
    }
    let base = row_splits[pivot];
    let prefix = row_splits[..=pivot].to_vec();
    row_splits.drain(..pivot);
    for value in row_splits.iter_mut() {
        *value -= base;
    }
    Ok(prefix)
}

/// Row splits to per-row lengths (adjacent differences).
pub fn to_row_lengths(row_splits: &[i64]) -> Vec<i64> {
    row_splits.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Per-row lengths to row splits (cumulative sum starting at 0).
pub fn from_row_lengths(lengths: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(lengths.len() + 1);
    out.push(0);
    let mut last = 0;
    for length in lengths {
        last += length;
        out.push(last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_then_merge_reconstructs() {
        let original = vec![0i64, 2, 2, 5, 9];
        for pivot in 0..original.len() {
            let mut rest = original.clone();
            let prefix = split_at(&mut rest, pivot).unwrap();
            assert_eq!(prefix, original[..=pivot]);
            assert_eq!(rest[0], 0);
            assert_eq!(merge(&prefix, &rest), original, "pivot {pivot}");
        }
    }

    #[test]
    fn split_at_rebases_suffix() {
        let mut rs = vec![0i64, 2, 2, 5];
        let prefix = split_at(&mut rs, 2).unwrap();
        assert_eq!(prefix, vec![0, 2, 2]);
        assert_eq!(rs, vec![0, 3]);
    }

    #[test]
    fn split_at_rejects_pivot_past_end() {
        let mut rs = vec![0i64, 1];
        let err = match split_at(&mut rs, 2) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        match err {
            ArrayError::RowSplitIndexOutOfRange { index, len } => {
                assert_eq!(index, 2);
                assert_eq!(len, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(rs, vec![0, 1]);
    }

    #[test]
    fn merge_with_empty_returns_other() {
        assert_eq!(merge(&[], &[0, 3]), vec![0, 3]);
        assert_eq!(merge(&[0, 3], &[]), vec![0, 3]);
        assert_eq!(merge(&[0, 3], &[0]), vec![0, 3]);
    }

    #[test]
    fn lengths_roundtrip() {
        let rs = from_row_lengths(&[2, 0, 3]);
        assert_eq!(rs, vec![0, 2, 2, 5]);
        assert_eq!(to_row_lengths(&rs), vec![2, 0, 3]);
        assert!(to_row_lengths(&[0]).is_empty());
    }

    #[test]
    fn validate_rejects_malformed() {
        assert!(validate(&[]).is_ok());
        assert!(validate(&[0, 0, 4]).is_ok());
        assert!(validate(&[1, 2]).is_err());
        assert!(validate(&[0, 3, 2]).is_err());
    }
}
