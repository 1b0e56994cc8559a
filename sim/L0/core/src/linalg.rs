//! Sparse index utilities: union of sorted DOF patterns.
//!
//! Pure routines with no pipeline state dependencies. Constraint rows in
//! sparse mode only store the DOFs that kinematically influence the
//! constrained bodies; when a row couples two bodies (or two tendons) the
//! two patterns are merged here. Counting is separate from building so
//! callers can size their buffers exactly before writing any value.
//!
//! Corresponds to `mju_combineSparseCount` / `mju_combineSparse` in
//! MuJoCo's `engine_util_sparse.c`.

use sim_types::SimError;

// ============================================================================
// Two-pointer walk
// ============================================================================

/// One entry of the union of two sorted index arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionEntry {
    /// The DOF index emitted into the union.
    pub index: usize,
    /// Position of `index` in the first array, if present there.
    pub a: Option<usize>,
    /// Position of `index` in the second array, if present there.
    pub b: Option<usize>,
}

/// Visit the union of two strictly increasing index arrays in order.
///
/// Tie-break: when `a[i] == b[j]` the index is emitted once and both
/// cursors advance. Runs in `O(m + n)` and never allocates.
///
/// # Panics
///
/// Panics if either array is not strictly increasing. Each element is
/// checked against its predecessor as the walk reaches it.
#[inline]
pub fn for_each_union(a: &[usize], b: &[usize], mut f: impl FnMut(UnionEntry)) {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (ai, bj) = (a[i], b[j]);
        if ai < bj {
            check_step(a, i, "first");
            f(UnionEntry { index: ai, a: Some(i), b: None });
            i += 1;
        } else if bj < ai {
            check_step(b, j, "second");
            f(UnionEntry { index: bj, a: None, b: Some(j) });
            j += 1;
        } else {
            check_step(a, i, "first");
            check_step(b, j, "second");
            f(UnionEntry { index: ai, a: Some(i), b: Some(j) });
            i += 1;
            j += 1;
        }
    }
    for (k, &ai) in a.iter().enumerate().skip(i) {
        check_step(a, k, "first");
        f(UnionEntry { index: ai, a: Some(k), b: None });
    }
    for (k, &bj) in b.iter().enumerate().skip(j) {
        check_step(b, k, "second");
        f(UnionEntry { index: bj, a: None, b: Some(k) });
    }
}

#[inline]
fn check_step(indices: &[usize], k: usize, which: &str) {
    assert!(
        k == 0 || indices[k - 1] < indices[k],
        "{which} index array not strictly increasing at position {k}: {} then {}",
        indices[k - 1],
        indices[k],
    );
}

// ============================================================================
// Count / build / combine
// ============================================================================

/// Cardinality of the union of two strictly increasing index arrays.
///
/// Used to size a sparse row before it is built. Empty inputs are allowed.
///
/// # Panics
///
/// Panics if either input is not strictly increasing.
#[must_use]
pub fn combine_sparse_count(a: &[usize], b: &[usize]) -> usize {
    let mut count = 0;
    for_each_union(a, b, |_| count += 1);
    count
}

/// Write the union of `a` and `b` into `out`.
///
/// `out` is cleared and reserved to exactly the union size first, so the
/// fill never reallocates.
pub fn combine_sparse_indices(a: &[usize], b: &[usize], out: &mut Vec<usize>) {
    let nnz = combine_sparse_count(a, b);
    out.clear();
    out.reserve_exact(nnz);
    for_each_union(a, b, |e| out.push(e.index));
    debug_assert_eq!(out.len(), nnz);
}

/// Sparse linear combination `out = a_scale·a + b_scale·b`.
///
/// Entries present in both inputs are summed, not concatenated. Both
/// output buffers are sized exactly by [`combine_sparse_count`].
#[allow(clippy::too_many_arguments)]
pub fn combine_sparse(
    a_ind: &[usize],
    a_val: &[f64],
    a_scale: f64,
    b_ind: &[usize],
    b_val: &[f64],
    b_scale: f64,
    out_ind: &mut Vec<usize>,
    out_val: &mut Vec<f64>,
) {
    assert_eq!(a_ind.len(), a_val.len(), "first sparse row: index/value length mismatch");
    assert_eq!(b_ind.len(), b_val.len(), "second sparse row: index/value length mismatch");

    let nnz = combine_sparse_count(a_ind, b_ind);
    out_ind.clear();
    out_val.clear();
    out_ind.reserve_exact(nnz);
    out_val.reserve_exact(nnz);

    for_each_union(a_ind, b_ind, |e| {
        let mut v = 0.0;
        if let Some(i) = e.a {
            v += a_scale * a_val[i];
        }
        if let Some(j) = e.b {
            v += b_scale * b_val[j];
        }
        out_ind.push(e.index);
        out_val.push(v);
    });
}

// ============================================================================
// Validation
// ============================================================================

/// Whether `indices` is strictly increasing (sorted, no duplicates).
#[inline]
#[must_use]
pub fn is_strictly_increasing(indices: &[usize]) -> bool {
    indices.windows(2).all(|w| w[0] < w[1])
}

/// Check that `indices` is a valid sparse pattern over `nv` DOFs.
///
/// The merge functions above panic on unsorted input; callers that accept
/// patterns from outside the crate can validate once here and get an
/// error instead.
pub fn validate_sparse_indices(indices: &[usize], nv: usize) -> Result<(), SimError> {
    for (k, &idx) in indices.iter().enumerate() {
        if idx >= nv {
            return Err(SimError::invalid_sparse_indices(
                k,
                format!("index {idx} out of range for nv={nv}"),
            ));
        }
        if k > 0 && indices[k - 1] >= idx {
            return Err(SimError::invalid_sparse_indices(
                k,
                format!("index {idx} does not follow {}", indices[k - 1]),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::unreadable_literal
)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_sparse_count_examples() {
        assert_eq!(combine_sparse_count(&[0, 1], &[2]), 3);
        assert_eq!(combine_sparse_count(&[2], &[0, 1]), 3);
        assert_eq!(combine_sparse_count(&[0, 1], &[2, 3, 4]), 5);
        assert_eq!(combine_sparse_count(&[5, 6], &[1, 3, 8]), 5);
        assert_eq!(combine_sparse_count(&[1, 2, 3], &[0, 4]), 5);
        assert_eq!(combine_sparse_count(&[1, 4], &[2, 3]), 4);
        assert_eq!(combine_sparse_count(&[0, 1, 3], &[0, 3, 4]), 4);
        assert_eq!(combine_sparse_count(&[1, 3, 5, 6], &[1, 3, 5, 6]), 4);
        assert_eq!(combine_sparse_count(&[], &[]), 0);
        assert_eq!(combine_sparse_count(&[], &[1, 2]), 2);
        assert_eq!(combine_sparse_count(&[0], &[]), 1);
    }

    #[test]
    #[should_panic(expected = "first index array not strictly increasing")]
    fn test_combine_sparse_indices_rejects_unsorted() {
        let mut out = Vec::new();
        combine_sparse_indices(&[3, 1], &[2], &mut out);
    }

    #[test]
    #[should_panic(expected = "second index array not strictly increasing")]
    fn test_combine_sparse_count_rejects_duplicate_with_empty_side() {
        let _ = combine_sparse_count(&[], &[4, 4]);
    }

    #[test]
    #[should_panic(expected = "not strictly increasing")]
    fn test_combine_sparse_rejects_unsorted_tail() {
        let (mut ind, mut val) = (Vec::new(), Vec::new());
        combine_sparse(&[0, 5, 2], &[1.0; 3], 1.0, &[1], &[1.0], 1.0, &mut ind, &mut val);
    }

    #[test]
    fn test_combine_sparse_indices_interleaved() {
        let mut out = Vec::new();
        combine_sparse_indices(&[5, 6], &[1, 3, 8], &mut out);
        assert_eq!(out, vec![1, 3, 5, 6, 8]);

        combine_sparse_indices(&[0, 1, 3], &[0, 3, 4], &mut out);
        assert_eq!(out, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_combine_sparse_indices_shared_edges() {
        let mut out = Vec::new();
        // Single shared leading element.
        combine_sparse_indices(&[0], &[0, 2], &mut out);
        assert_eq!(out, vec![0, 2]);
        // Single shared trailing element.
        combine_sparse_indices(&[1, 7], &[7], &mut out);
        assert_eq!(out, vec![1, 7]);
    }

    #[test]
    fn test_combine_sparse_indices_reuses_buffer_exactly() {
        let mut out = vec![99; 32];
        combine_sparse_indices(&[2], &[0, 1], &mut out);
        assert_eq!(out, vec![0, 1, 2]);
    }

    #[test]
    fn test_combine_sparse_sums_on_collision() {
        let mut ind = Vec::new();
        let mut val = Vec::new();
        combine_sparse(
            &[0, 2, 4],
            &[1.0, 2.0, 3.0],
            1.0,
            &[2, 3],
            &[10.0, 20.0],
            -1.0,
            &mut ind,
            &mut val,
        );
        assert_eq!(ind, vec![0, 2, 3, 4]);
        assert_eq!(val, vec![1.0, 2.0 - 10.0, -20.0, 3.0]);
    }

    #[test]
    fn test_combine_sparse_empty_sides() {
        let mut ind = vec![7];
        let mut val = vec![7.0];
        combine_sparse(&[], &[], 1.0, &[], &[], 1.0, &mut ind, &mut val);
        assert!(ind.is_empty());
        assert!(val.is_empty());

        combine_sparse(&[], &[], 1.0, &[3], &[2.5], 2.0, &mut ind, &mut val);
        assert_eq!(ind, vec![3]);
        assert_eq!(val, vec![5.0]);
    }

    #[test]
    fn test_for_each_union_positions() {
        let mut seen = Vec::new();
        for_each_union(&[1, 4], &[1, 2], |e| seen.push(e));
        assert_eq!(
            seen,
            vec![
                UnionEntry { index: 1, a: Some(0), b: Some(0) },
                UnionEntry { index: 2, a: None, b: Some(1) },
                UnionEntry { index: 4, a: Some(1), b: None },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_combine_sparse_rejects_ragged_row() {
        let mut ind = Vec::new();
        let mut val = Vec::new();
        combine_sparse(&[0, 1], &[1.0], 1.0, &[], &[], 1.0, &mut ind, &mut val);
    }

    #[test]
    fn test_validate_sparse_indices() {
        assert!(validate_sparse_indices(&[], 0).is_ok());
        assert!(validate_sparse_indices(&[0, 2, 5], 6).is_ok());

        let err = validate_sparse_indices(&[0, 2, 2], 6).unwrap_err();
        assert_eq!(
            err,
            SimError::invalid_sparse_indices(2, "index 2 does not follow 2")
        );

        let err = validate_sparse_indices(&[3, 1], 6).unwrap_err();
        assert!(matches!(err, SimError::InvalidSparseIndices { position: 1, .. }));

        let err = validate_sparse_indices(&[0, 6], 6).unwrap_err();
        assert!(matches!(err, SimError::InvalidSparseIndices { position: 1, .. }));
    }

    #[test]
    fn test_is_strictly_increasing() {
        assert!(is_strictly_increasing(&[]));
        assert!(is_strictly_increasing(&[4]));
        assert!(is_strictly_increasing(&[0, 1, 9]));
        assert!(!is_strictly_increasing(&[0, 0]));
        assert!(!is_strictly_increasing(&[2, 1]));
    }
}
