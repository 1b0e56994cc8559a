//! Contact rows: frame projection of the relative velocity and cone
//! expansion.
//!
//! Contacts are supplied directly (no collision stage). The velocity of the
//! material point of each geom's body at the contact position is measured
//! by integrating `qpos` forward and backward, so the check is independent
//! of the Jacobian code under test.

use approx::assert_relative_eq;
use nalgebra::{DVector, UnitQuaternion, Vector3};
use sim_core::{
    ConeType, ConstraintOptions, ConstraintType, Contact, Data, MjJointType, Model,
    mj_fwd_position, mj_integrate_pos,
};

/// Free body resting on a hinged paddle.
fn paddle_and_box() -> Model {
    let mut m = Model::empty();
    let paddle = m.add_body(0, Vector3::new(0.0, 0.0, 0.5), UnitQuaternion::identity(), None);
    m.add_joint(paddle, MjJointType::Hinge, Vector3::new(-1.0, 0.0, 0.0), Vector3::y());
    m.add_geom(paddle, Vector3::zeros(), Some("paddle"));
    let boxed = m.add_body(0, Vector3::new(0.3, 0.1, 0.6), UnitQuaternion::identity(), None);
    m.add_joint(boxed, MjJointType::Free, Vector3::zeros(), Vector3::z());
    m.add_geom(boxed, Vector3::zeros(), Some("box"));
    m.finalize().unwrap();
    m
}

fn state(model: &Model) -> (DVector<f64>, DVector<f64>) {
    let mut qpos = model.qpos0.clone();
    qpos[0] = 0.2;
    let q = UnitQuaternion::from_euler_angles(0.1, 0.4, -0.3);
    qpos.rows_mut(4, 4).copy_from_slice(&[q.w, q.i, q.j, q.k]);
    let qvel = DVector::from_vec(vec![0.7, -0.3, 0.2, 0.5, 1.1, -0.8, 0.4]);
    (qpos, qvel)
}

fn kinematics(model: &Model, qpos: &DVector<f64>) -> Data {
    let mut d = model.make_data();
    d.qpos.copy_from(qpos);
    mj_fwd_position(model, &mut d);
    d
}

/// Linear and angular velocity of the point of `body` located at `point`.
fn point_velocity(
    model: &Model,
    qpos: &DVector<f64>,
    qvel: &DVector<f64>,
    body: usize,
    point: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let eps = 1e-6;
    let d0 = kinematics(model, qpos);
    let local = d0.xquat[body].inverse() * (point - d0.xpos[body]);
    let at = |dt: f64| {
        let mut q = qpos.clone();
        mj_integrate_pos(model, &mut q, qvel, dt);
        let d = kinematics(model, &q);
        (d.xpos[body] + d.xquat[body] * local, d.xquat[body])
    };
    let (p_plus, q_plus) = at(eps);
    let (p_minus, q_minus) = at(-eps);
    let lin = (p_plus - p_minus) / (2.0 * eps);
    let ang = (q_plus * q_minus.inverse()).scaled_axis() / (2.0 * eps);
    (lin, ang)
}

#[test]
fn test_elliptic_frame_rows_project_relative_velocity() {
    let model = paddle_and_box();
    assert_eq!(model.nv, 7);
    let (qpos, qvel) = state(&model);
    let d0 = kinematics(&model, &qpos);
    let point = d0.geom_xpos[1] - Vector3::new(0.0, 0.0, 0.05);
    let normal = Vector3::new(0.1, 0.0, 1.0).normalize();
    let contact = Contact::with_condim(point, normal, -0.002, 0, 1, 0.8, 0.05, 0.01, 6);

    let mut data = kinematics(&model, &qpos);
    data.qvel.copy_from(&qvel);
    data.contacts.push(contact.clone());
    let options = ConstraintOptions::sparse().cone(ConeType::Elliptic);
    data.forward_with(&model, &options).unwrap();
    assert_eq!(data.nefc, 6);
    assert_eq!(data.efc_type, vec![ConstraintType::ContactElliptic; 6]);

    let (v1, w1) = point_velocity(&model, &qpos, &qvel, 1, &point);
    let (v2, w2) = point_velocity(&model, &qpos, &qvel, 2, &point);
    let (dv, dw) = (v2 - v1, w2 - w1);
    for k in 0..3 {
        assert_relative_eq!(data.efc_vel[k], contact.axis(k).dot(&dv), epsilon = 1e-7);
        assert_relative_eq!(data.efc_vel[3 + k], contact.axis(k).dot(&dw), epsilon = 1e-7);
    }
}

#[test]
fn test_pyramidal_rows_combine_normal_and_friction() {
    let model = paddle_and_box();
    let (qpos, qvel) = state(&model);
    let d0 = kinematics(&model, &qpos);
    let contact = Contact::with_condim(d0.geom_xpos[1], Vector3::z(), -0.002, 0, 1, 0.8, 0.05, 0.0, 4);

    let assemble = |cone| {
        let mut data = kinematics(&model, &qpos);
        data.qvel.copy_from(&qvel);
        data.contacts.push(contact.clone());
        data.forward_with(&model, &ConstraintOptions::dense().cone(cone)).unwrap();
        data
    };
    let frame = assemble(ConeType::Elliptic);
    let pyramid = assemble(ConeType::Pyramidal);
    assert_eq!(frame.nefc, 4);
    assert_eq!(pyramid.nefc, 6);
    assert!(pyramid.efc_pos.iter().all(|&p| p == -0.002));

    let (fj, pj) = (frame.efc_J.to_dense(), pyramid.efc_J.to_dense());
    for k in 1..4 {
        let mu = contact.mu()[k - 1];
        let plus = fj.row(0) + fj.row(k) * mu;
        let minus = fj.row(0) - fj.row(k) * mu;
        assert_relative_eq!(pj.row(2 * (k - 1)).clone_owned(), plus, epsilon = 1e-15);
        assert_relative_eq!(pj.row(2 * (k - 1) + 1).clone_owned(), minus, epsilon = 1e-15);
    }
}

#[test]
fn test_contact_activation_and_margin() {
    let model = paddle_and_box();
    let mut data = model.make_data();
    let p = Vector3::zeros();
    data.contacts = vec![
        Contact::new(p, Vector3::z(), 0.01, 0, 1, 0.0),
        Contact::new(p, Vector3::z(), 0.01, 0, 1, 0.0).with_margin(0.02),
        Contact::new(p, Vector3::z(), 0.02, 0, 1, 0.0).with_margin(0.02),
    ];
    data.forward(&model).unwrap();
    assert_eq!(data.nefc, 1);
    assert_eq!(data.efc_id, vec![1]);
    assert_eq!(data.efc_type, vec![ConstraintType::ContactFrictionless]);
    assert_eq!(data.efc_margin, vec![0.02]);
}
