//! Forward kinematics: body poses, joint frames and per-DOF motion axes.
//!
//! Corresponds to the position stage of MuJoCo's `engine_core_smooth.c`,
//! reduced to what constraint assembly reads.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3, Vector6};

use crate::tendon::mj_fwd_tendon;
use crate::types::{Data, MjJointType, Model};

/// Read the unit quaternion stored at `qpos[adr..adr + 4]` (`w, x, y, z`).
#[inline]
pub(crate) fn qpos_quat(data: &Data, adr: usize) -> UnitQuaternion<f64> {
    UnitQuaternion::new_normalize(Quaternion::new(
        data.qpos[adr],
        data.qpos[adr + 1],
        data.qpos[adr + 2],
        data.qpos[adr + 3],
    ))
}

#[inline]
fn motion(ang: Vector3<f64>, lin: Vector3<f64>) -> Vector6<f64> {
    Vector6::new(ang.x, ang.y, ang.z, lin.x, lin.y, lin.z)
}

/// Forward kinematics: compute body poses from qpos.
///
/// Traverses the kinematic tree from root to leaves. For every joint the
/// world anchor and axis are recorded before the joint is applied, and each
/// DOF gets its world motion axis in `cdof` (`[angular; linear]`, angular
/// part acting about the joint anchor). Rotational DOFs of ball and free
/// joints are expressed in the frame after the joint rotation, matching the
/// body-frame increments applied by `mj_integrate_pos`.
pub fn mj_fwd_position(model: &Model, data: &mut Data) {
    // Body 0 (world) is always at origin
    data.xpos[0] = Vector3::zeros();
    data.xquat[0] = UnitQuaternion::identity();

    // Parent before child is guaranteed by finalize.
    for body_id in 1..model.nbody {
        let parent_id = model.body_parent[body_id];
        let mut pos = data.xpos[parent_id] + data.xquat[parent_id] * model.body_pos[body_id];
        let mut quat = data.xquat[parent_id] * model.body_quat[body_id];

        let jnt_start = model.body_jnt_adr[body_id];
        for jnt_id in jnt_start..jnt_start + model.body_jnt_num[body_id] {
            let qpos_adr = model.jnt_qpos_adr[jnt_id];
            let dof_adr = model.jnt_dof_adr[jnt_id];

            match model.jnt_type[jnt_id] {
                MjJointType::Hinge => {
                    let anchor = pos + quat * model.jnt_pos[jnt_id];
                    let axis = quat * model.jnt_axis[jnt_id];
                    data.xanchor[jnt_id] = anchor;
                    data.xaxis[jnt_id] = axis;
                    data.cdof[dof_adr] = motion(axis, Vector3::zeros());

                    let rot = UnitQuaternion::from_axis_angle(
                        &Unit::new_unchecked(axis),
                        data.qpos[qpos_adr],
                    );
                    quat = rot * quat;
                    pos = anchor + rot * (pos - anchor);
                }
                MjJointType::Slide => {
                    let axis = quat * model.jnt_axis[jnt_id];
                    data.xanchor[jnt_id] = pos + quat * model.jnt_pos[jnt_id];
                    data.xaxis[jnt_id] = axis;
                    data.cdof[dof_adr] = motion(Vector3::zeros(), axis);
                    pos += axis * data.qpos[qpos_adr];
                }
                MjJointType::Ball => {
                    let anchor = pos + quat * model.jnt_pos[jnt_id];
                    data.xanchor[jnt_id] = anchor;
                    data.xaxis[jnt_id] = Vector3::zeros();

                    let new_quat = quat * qpos_quat(data, qpos_adr);
                    let rot = new_quat * quat.inverse();
                    pos = anchor + rot * (pos - anchor);
                    quat = new_quat;
                    for i in 0..3 {
                        let axis = quat * Vector3::ith(i, 1.0);
                        data.cdof[dof_adr + i] = motion(axis, Vector3::zeros());
                    }
                }
                MjJointType::Free => {
                    pos = Vector3::new(
                        data.qpos[qpos_adr],
                        data.qpos[qpos_adr + 1],
                        data.qpos[qpos_adr + 2],
                    );
                    quat = qpos_quat(data, qpos_adr + 3);
                    data.xanchor[jnt_id] = pos;
                    data.xaxis[jnt_id] = Vector3::zeros();
                    for i in 0..3 {
                        data.cdof[dof_adr + i] = motion(Vector3::zeros(), Vector3::ith(i, 1.0));
                        data.cdof[dof_adr + 3 + i] =
                            motion(quat * Vector3::ith(i, 1.0), Vector3::zeros());
                    }
                }
            }
        }

        data.xpos[body_id] = pos;
        data.xquat[body_id] = quat;
    }

    for geom_id in 0..model.ngeom {
        let body_id = model.geom_body[geom_id];
        data.geom_xpos[geom_id] = data.xpos[body_id] + data.xquat[body_id] * model.geom_pos[geom_id];
    }

    mj_fwd_tendon(model, data);
}
