//! Fixed tendon kinematics: linear combination of joint positions.

use crate::types::{Data, Model};

/// Fixed tendon kinematics for a single tendon.
///
/// Fixed tendon length is a linear combination of joint positions:
///   L_t = Σ_w coef_w * qpos[qpos_adr(jnt_w)]
///
/// The Jacobian is constant (configuration-independent):
///   J_t[dof_adr(jnt_w)] += coef_w
///
/// Repeated joints accumulate, so the nonzeros of `ten_J[t]` are exactly
/// `model.tendon_dofs(t)` (minus entries whose coefficients cancel).
#[inline]
pub fn mj_fwd_tendon_fixed(model: &Model, data: &mut Data, t: usize) {
    let adr = model.tendon_adr[t];
    let num = model.tendon_num[t];

    data.ten_J[t].fill(0.0);

    let mut length = 0.0;
    for w in adr..(adr + num) {
        let jnt = model.wrap_jnt[w];
        let coef = model.wrap_coef[w];
        length += coef * data.qpos[model.jnt_qpos_adr[jnt]];
        data.ten_J[t][model.jnt_dof_adr[jnt]] += coef;
    }

    data.ten_length[t] = length;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::MjJointType;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn test_length_and_jacobian() {
        let mut m = Model::empty();
        let b = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
        m.add_joint(b, MjJointType::Ball, Vector3::zeros(), Vector3::z());
        let j1 = m.add_joint(b, MjJointType::Hinge, Vector3::zeros(), Vector3::x());
        let j2 = m.add_joint(b, MjJointType::Slide, Vector3::zeros(), Vector3::y());
        let t = m.add_fixed_tendon(&[(j1, 2.0), (j2, -1.0), (j1, 0.5)]);
        m.finalize().unwrap();

        let mut d = m.make_data();
        d.qpos[4] = 0.3;
        d.qpos[5] = 0.1;
        mj_fwd_tendon_fixed(&m, &mut d, t);

        assert!((d.ten_length[t] - (2.5 * 0.3 - 0.1)).abs() < 1e-15);
        assert_eq!(d.ten_J[t].as_slice(), &[0.0, 0.0, 0.0, 2.5, -1.0]);
        assert_eq!(m.tendon_dofs(t), &[3, 4]);
    }

    #[test]
    fn test_dofless_tendon() {
        let mut m = Model::empty();
        let t = m.add_fixed_tendon(&[]);
        m.finalize().unwrap();
        let mut d = m.make_data();
        mj_fwd_tendon_fixed(&m, &mut d, t);
        assert_eq!(d.ten_length[t], 0.0);
        assert_eq!(d.ten_J[t].len(), 0);
    }
}
