//! Semantic token delta calculation.
//!
//! Computes the edit that turns one flat token array into another using
//! prefix-suffix matching, and applies edits back onto a base array.

use super::dto::SemanticTokensEdit;
use crate::error::ApplyError;

/// Calculate the edits that transform `old` into `new`.
///
/// This algorithm:
/// 1. Finds the longest common prefix
/// 2. Finds the longest common suffix of what remains
/// 3. Returns a single edit replacing the middle section
///
/// Indices are word offsets into the flat array, not token indices.
pub fn compute_delta(old: &[u32], new: &[u32]) -> Vec<SemanticTokensEdit> {
    // --- Step 1: Find common prefix ---
    let common_prefix_len = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // If all words are the same, no edits needed
    if common_prefix_len == old.len() && common_prefix_len == new.len() {
        return Vec::new();
    }

    // --- Step 2: Find common suffix of the unmatched tails ---
    let old_rest = &old[common_prefix_len..];
    let new_rest = &new[common_prefix_len..];
    let common_suffix_len = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    // --- Step 3: Calculate the edit ---
    let delete_count = old_rest.len() - common_suffix_len;
    let data = new_rest[..new_rest.len() - common_suffix_len].to_vec();

    vec![SemanticTokensEdit {
        start: common_prefix_len as u32,
        delete_count: delete_count as u32,
        data,
    }]
}

/// Apply `edits` to `base`, producing the new array.
///
/// Every edit addresses the original `base` indices. Edits are applied in
/// `start` order and must not overlap.
pub fn apply_edits(base: &[u32], edits: &[SemanticTokensEdit]) -> Result<Vec<u32>, ApplyError> {
    let mut ordered: Vec<&SemanticTokensEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.start);

    let inserted: usize = ordered.iter().map(|edit| edit.data.len()).sum();
    let mut result = Vec::with_capacity(base.len() + inserted);
    let mut cursor = 0usize;

    for edit in ordered {
        let start = edit.start as usize;
        let end = start.saturating_add(edit.delete_count as usize);
        if end > base.len() {
            return Err(ApplyError::OutOfBounds {
                start: edit.start,
                delete_count: edit.delete_count,
                base_len: base.len(),
            });
        }
        if start < cursor {
            return Err(ApplyError::Overlapping {
                start: edit.start,
                previous_end: cursor,
            });
        }
        result.extend_from_slice(&base[cursor..start]);
        result.extend_from_slice(&edit.data);
        cursor = end;
    }
    result.extend_from_slice(&base[cursor..]);

    Ok(result)
}
