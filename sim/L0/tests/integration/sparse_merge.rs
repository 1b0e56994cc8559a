//! Union counting and merging of sorted DOF index lists.

use sim_core::{combine_sparse, combine_sparse_count, combine_sparse_indices};

#[test]
fn test_combine_sparse_count_cases() {
    let cases: [(&[usize], &[usize], usize); 11] = [
        (&[0, 1], &[2], 3),
        (&[2], &[0, 1], 3),
        (&[0, 1], &[2, 3, 4], 5),
        (&[5, 6], &[1, 3, 8], 5),
        (&[1, 2, 3], &[0, 4], 5),
        (&[1, 4], &[2, 3], 4),
        (&[0, 1, 3], &[0, 3, 4], 4),
        (&[1, 3, 5, 6], &[1, 3, 5, 6], 4),
        (&[], &[], 0),
        (&[], &[1, 2], 2),
        (&[0], &[], 1),
    ];
    for (a, b, expected) in cases {
        assert_eq!(combine_sparse_count(a, b), expected, "a={a:?} b={b:?}");
    }
}

#[test]
fn test_indices_agree_with_count() {
    let a = [0, 2, 3, 7, 9];
    let b = [1, 2, 8, 9, 11];
    let mut out = Vec::new();
    combine_sparse_indices(&a, &b, &mut out);
    assert_eq!(out, vec![0, 1, 2, 3, 7, 8, 9, 11]);
    assert_eq!(out.len(), combine_sparse_count(&a, &b));
}

#[test]
fn test_shared_index_values_sum() {
    let mut ind = Vec::new();
    let mut val = Vec::new();
    combine_sparse(&[1, 4], &[2.0, 3.0], 1.0, &[4, 5], &[1.0, 6.0], -0.5, &mut ind, &mut val);
    assert_eq!(ind, vec![1, 4, 5]);
    assert_eq!(val, vec![2.0, 2.5, -3.0]);
}
