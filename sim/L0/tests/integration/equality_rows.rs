//! Connect, joint and tendon equality rows against finite differences.
//!
//! Model layout:
//! - body 1: hinge about z at the origin (joint 0, dof 0)
//! - body 2: child of body 1 at (1, 0, 0), ball joint (joint 1, dofs 1-3)
//! - body 3: child of the world at (0, 1, 0), slide x and hinge y
//!   (joints 2-3, dofs 4-5)

use approx::assert_relative_eq;
use nalgebra::{DVector, UnitQuaternion, Vector3};
use sim_conformance_tests::{assemble_at, fd_jacobian};
use sim_core::{
    ConstraintJacobian, ConstraintOptions, EqualityType, JacobianRow, MjJointType, Model,
    mj_make_constraint,
};

fn coupled_model() -> Model {
    let mut m = Model::empty();
    let b1 = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
    let j0 = m.add_joint(b1, MjJointType::Hinge, Vector3::zeros(), Vector3::z());
    let b2 = m.add_body(b1, Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity(), None);
    m.add_joint(b2, MjJointType::Ball, Vector3::zeros(), Vector3::z());
    let b3 = m.add_body(0, Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), None);
    m.add_joint(b3, MjJointType::Slide, Vector3::zeros(), Vector3::x());
    let j3 = m.add_joint(b3, MjJointType::Hinge, Vector3::new(0.0, 0.0, 0.1), Vector3::y());

    m.add_connect(b2, b3, Vector3::new(0.2, 0.0, 0.0));
    m.add_joint_equality(j3, Some(j0), [0.1, 0.5, 0.2, 0.0, 0.0]);
    let t1 = m.add_fixed_tendon(&[(j0, 1.0), (j3, 2.0)]);
    let t2 = m.add_fixed_tendon(&[(j0, -1.0)]);
    m.add_tendon_equality(t1, Some(t2), [0.0, 1.5, 0.3, 0.0, 0.0]);
    m.finalize().unwrap();
    m
}

fn test_qpos() -> Vec<f64> {
    let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.6);
    vec![0.3, q.w, q.i, q.j, q.k, 0.2, -0.4]
}

fn equality_residual<'a>(
    model: &'a Model,
    options: &ConstraintOptions,
) -> impl Fn(&sim_core::Data) -> DVector<f64> + 'a {
    let options = options.clone();
    move |d| {
        let mut d = d.clone();
        mj_make_constraint(model, &mut d, &options).unwrap();
        DVector::from_vec(d.efc_pos.clone())
    }
}

#[test]
fn test_equality_rows_match_finite_differences() {
    let model = coupled_model();
    assert_eq!(
        model.eq_type,
        vec![EqualityType::Connect, EqualityType::Joint, EqualityType::Tendon]
    );
    let qpos = test_qpos();

    for options in [ConstraintOptions::dense(), ConstraintOptions::sparse()] {
        let data = assemble_at(&model, &qpos, &options);
        assert_eq!(data.ne, 5);
        assert_eq!(data.nefc, 5);
        let fd = fd_jacobian(&model, &qpos, 1e-6, equality_residual(&model, &options));
        assert_relative_eq!(data.efc_J.to_dense(), fd, epsilon = 1e-7);
    }
}

#[test]
fn test_equality_sparse_patterns() {
    let model = coupled_model();
    let data = assemble_at(&model, &test_qpos(), &ConstraintOptions::sparse());
    let ConstraintJacobian::Sparse(jac) = &data.efc_J else {
        panic!("expected sparse Jacobian");
    };
    // Connect: chain of body 2 (dofs 0-3) and body 3 (dofs 4-5).
    assert_eq!(jac.row(0).indices, &[0, 1, 2, 3, 4, 5]);
    // Joint coupling: hinge y of body 3 against hinge z of body 1.
    assert_eq!(jac.row(3).indices, &[0, 5]);
    // Tendon coupling: both tendons touch dof 0; only t1 touches dof 5.
    assert_eq!(jac.row(4).indices, &[0, 5]);
    assert_eq!(jac.rownnz, vec![6, 6, 6, 2, 2]);
}

#[test]
fn test_coupling_residuals_at_reference() {
    let model = coupled_model();
    let data = assemble_at(&model, model.qpos0.as_slice(), &ConstraintOptions::dense());
    // Connect holds at qpos0 by construction.
    for r in 0..3 {
        assert_relative_eq!(data.efc_pos[r], 0.0, epsilon = 1e-14);
    }
    // Joint: 0 − poly(0) = −0.1.
    assert_relative_eq!(data.efc_pos[3], -0.1, epsilon = 1e-14);
    assert_relative_eq!(data.efc_J.row(3).value_at(0), -0.5, epsilon = 1e-14);
    assert_relative_eq!(data.efc_J.row(3).value_at(5), 1.0, epsilon = 1e-14);
    // Tendon: dL1 − 1.5·dL2 with dL1 = q0 + 2 q5, dL2 = −q0.
    assert_relative_eq!(data.efc_pos[4], 0.0, epsilon = 1e-14);
    assert_relative_eq!(data.efc_J.row(4).value_at(0), 1.0 + 1.5, epsilon = 1e-14);
    assert_relative_eq!(data.efc_J.row(4).value_at(5), 2.0, epsilon = 1e-14);
}

#[test]
fn test_inactive_equality_is_skipped() {
    let mut model = coupled_model();
    model.eq_active[1] = false;
    let data = assemble_at(&model, &test_qpos(), &ConstraintOptions::dense());
    assert_eq!(data.ne, 4);
    assert_eq!(data.efc_id, vec![0, 0, 0, 2]);

    let only_contacts = ConstraintOptions::dense()
        .without_equality()
        .without_limits()
        .without_frictionloss();
    let data = assemble_at(&model, &test_qpos(), &only_contacts);
    assert_eq!(data.nefc, 0);
}
