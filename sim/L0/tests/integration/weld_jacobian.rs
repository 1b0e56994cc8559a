//! Weld rotational Jacobian against finite differences.
//!
//! A ball-jointed body sits beside a body with three offset hinges. The
//! relative orientation residual `imag(conj(q2) ⊗ q1)` is differentiated
//! numerically (perturbing `qpos` on the joint manifold) and compared with
//! the analytical map `0.5 · imag(conj(q2) ⊗ (J1 − J2)_col ⊗ q1)`.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector, Vector3};
use sim_conformance_tests::{
    BALL_AND_HINGES_QPOS, assemble_at, fd_jacobian, rotation_residual, welded_ball_and_hinges,
};
use sim_core::{
    ConstraintOptions, ConstraintType, Model, mj_fwd_position, mj_jac_dif_pair,
    constraint::orientation_jacobian,
};

const EPS: f64 = 1e-6;

#[test]
fn test_rotation_jacobian_matches_finite_differences() {
    let model = Model::ball_and_hinges().unwrap();
    assert_eq!(model.nq, 7);
    assert_eq!(model.nv, 6);

    let fd = fd_jacobian(&model, &BALL_AND_HINGES_QPOS, EPS, rotation_residual);

    let mut data = model.make_data();
    data.qpos.copy_from_slice(&BALL_AND_HINGES_QPOS);
    mj_fwd_position(&model, &mut data);
    let point = Vector3::zeros();
    // dif = jac(body 1) − jac(body 2).
    let pair = mj_jac_dif_pair(&model, &data, 2, 1, &point, &point, false);
    let analytical = orientation_jacobian(&data.xquat[1], &data.xquat[2], &pair.dif.jacr);

    for r in 0..3 {
        for c in 0..6 {
            assert!(
                (fd[(r, c)] - analytical[(r, c)]).abs() < EPS,
                "entry ({r}, {c}): fd {} vs analytical {}",
                fd[(r, c)],
                analytical[(r, c)]
            );
        }
    }
}

#[test]
fn test_sparse_pair_gives_same_rotation_jacobian() {
    let model = Model::ball_and_hinges().unwrap();
    let mut data = model.make_data();
    data.qpos.copy_from_slice(&BALL_AND_HINGES_QPOS);
    mj_fwd_position(&model, &mut data);
    let point = Vector3::zeros();

    let dense = mj_jac_dif_pair(&model, &data, 2, 1, &point, &point, false);
    let sparse = mj_jac_dif_pair(&model, &data, 2, 1, &point, &point, true);
    assert_eq!(sparse.dif.layout.indices(), Some(&[0, 1, 2, 3, 4, 5][..]));
    assert_relative_eq!(dense.dif.jacr, sparse.dif.jacr, epsilon = 1e-15);
}

/// Full weld rows (translation and rotation) from assembly.
#[test]
fn test_assembled_weld_rows_match_finite_differences() {
    let model = welded_ball_and_hinges(1.0).unwrap();
    for options in [ConstraintOptions::dense(), ConstraintOptions::sparse()] {
        let data = assemble_at(&model, &BALL_AND_HINGES_QPOS, &options);
        assert_eq!(data.ne, 6);
        assert!(data.efc_type.iter().all(|&t| t == ConstraintType::Equality));

        let fd = fd_jacobian(&model, &BALL_AND_HINGES_QPOS, EPS, |d| {
            let mut d = d.clone();
            sim_core::mj_make_constraint(&model, &mut d, &options).unwrap();
            DVector::from_vec(d.efc_pos.clone())
        });
        let jac = data.efc_J.to_dense();
        assert_relative_eq!(jac, fd, epsilon = 1e-6);
    }
}

/// The rotational rows are half the relative angular velocity near
/// alignment, and scale with the torque scale.
#[test]
fn test_rotation_rows_have_half_sensitivity() {
    let zero = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    for torquescale in [1.0, 0.25] {
        let model = welded_ball_and_hinges(torquescale).unwrap();
        let data = assemble_at(&model, &zero, &ConstraintOptions::dense());
        let jac = data.efc_J.to_dense();
        let rot = jac.view((3, 0), (3, 6));

        let mut expected = DMatrix::zeros(3, 6);
        for i in 0..3 {
            expected[(i, i)] = 0.5 * torquescale;
            expected[(i, 3 + i)] = -0.5 * torquescale;
        }
        assert_relative_eq!(rot.clone_owned(), expected, epsilon = 1e-14);
        for r in 0..6 {
            assert_relative_eq!(data.efc_pos[r], 0.0, epsilon = 1e-14);
        }
    }
}

/// A small ball rotation `θ` about x gives a residual of `sin(θ/2) ≈ θ/2`.
#[test]
fn test_small_rotation_residual_is_half_angle() {
    let model = welded_ball_and_hinges(1.0).unwrap();
    let theta = 1e-3;
    let q = nalgebra::UnitQuaternion::from_axis_angle(&Vector3::x_axis(), theta);
    let qpos = [q.w, q.i, q.j, q.k, 0.0, 0.0, 0.0];
    let data = assemble_at(&model, &qpos, &ConstraintOptions::dense());
    assert_relative_eq!(data.efc_pos[3], (theta / 2.0).sin(), epsilon = 1e-15);
    assert_relative_eq!(data.efc_pos[3], theta / 2.0, epsilon = 1e-9);
    assert_relative_eq!(data.efc_pos[4], 0.0, epsilon = 1e-15);
}
