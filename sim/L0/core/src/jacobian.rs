//! Point Jacobians, pair-difference Jacobians and position integration.
//!
//! Provides the point Jacobian infrastructure (`mj_jac`, `mj_jac_sparse`),
//! the two-body difference Jacobian used by every body-pair constraint
//! (`mj_jac_dif_pair`), and SO(3)-aware position integration
//! (`mj_integrate_pos`).
//!
//! Corresponds to the Jacobian sections of MuJoCo's `engine_core_smooth.c`
//! and `mj_jacDifPair` in `engine_core_constraint.c`.

use nalgebra::{DMatrix, DVector, Matrix3xX, UnitQuaternion, Vector3};

use crate::linalg::{combine_sparse_count, for_each_union};
use crate::types::{Data, MjJointType, Model};

/// Column layout of a Jacobian block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DofLayout {
    /// Column `k` is DOF `k`; `nv` columns.
    Dense,
    /// Column `k` is DOF `indices[k]`; indices strictly increasing.
    Sparse(Vec<usize>),
}

impl DofLayout {
    /// Number of stored columns.
    #[must_use]
    pub fn ncol(&self, nv: usize) -> usize {
        match self {
            Self::Dense => nv,
            Self::Sparse(ind) => ind.len(),
        }
    }

    /// DOF of stored column `k`.
    #[inline]
    #[must_use]
    pub fn dof(&self, k: usize) -> usize {
        match self {
            Self::Dense => k,
            Self::Sparse(ind) => ind[k],
        }
    }

    /// Sparse indices, or `None` for the dense layout.
    #[must_use]
    pub fn indices(&self) -> Option<&[usize]> {
        match self {
            Self::Dense => None,
            Self::Sparse(ind) => Some(ind),
        }
    }
}

/// Translational and rotational Jacobian of a point, 3 rows each.
#[derive(Debug, Clone, PartialEq)]
pub struct PointJacobian {
    /// Column layout shared by `jacp` and `jacr`.
    pub layout: DofLayout,
    /// Translational Jacobian (3 × ncol).
    pub jacp: Matrix3xX<f64>,
    /// Rotational Jacobian (3 × ncol).
    pub jacr: Matrix3xX<f64>,
}

impl PointJacobian {
    fn zeros(layout: DofLayout, nv: usize) -> Self {
        let ncol = layout.ncol(nv);
        Self {
            layout,
            jacp: Matrix3xX::zeros(ncol),
            jacr: Matrix3xX::zeros(ncol),
        }
    }

    /// Number of stored columns.
    #[must_use]
    pub fn ncol(&self) -> usize {
        self.jacp.ncols()
    }

    /// Expand to dense `(jacp, jacr)`, each 3×nv.
    #[must_use]
    #[allow(clippy::similar_names)] // jacp/jacr are canonical MuJoCo names
    pub fn to_dense(&self, nv: usize) -> (DMatrix<f64>, DMatrix<f64>) {
        let mut jacp = DMatrix::zeros(3, nv);
        let mut jacr = DMatrix::zeros(3, nv);
        for k in 0..self.ncol() {
            let dof = self.layout.dof(k);
            jacp.column_mut(dof).copy_from(&self.jacp.column(k));
            jacr.column_mut(dof).copy_from(&self.jacr.column(k));
        }
        (jacp, jacr)
    }
}

/// Jacobians of two points on two bodies and their difference.
#[derive(Debug, Clone, PartialEq)]
pub struct PairJacobian {
    /// Jacobian of `pos1` on `body1`.
    pub jac1: PointJacobian,
    /// Jacobian of `pos2` on `body2`.
    pub jac2: PointJacobian,
    /// `jac2 − jac1` over the union of both layouts.
    pub dif: PointJacobian,
}

/// Translational and rotational contribution of `dof` at `point`.
///
/// `jacp = lin + ang × (point − anchor)`, `jacr = ang`, where `cdof[dof] =
/// [ang; lin]` and `anchor` is the world anchor of the owning joint.
#[inline]
fn dof_column(model: &Model, data: &Data, dof: usize, point: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let cdof = &data.cdof[dof];
    let ang = Vector3::new(cdof[0], cdof[1], cdof[2]);
    let lin = Vector3::new(cdof[3], cdof[4], cdof[5]);
    let anchor = data.xanchor[model.dof_jnt[dof]];
    (lin + ang.cross(&(point - anchor)), ang)
}

fn fill_columns(model: &Model, data: &Data, body_id: usize, point: &Vector3<f64>, jac: &mut PointJacobian) {
    let chain = model.body_chain(body_id);
    match &jac.layout {
        DofLayout::Dense => {
            for &dof in chain {
                let (p, r) = dof_column(model, data, dof, point);
                jac.jacp.set_column(dof, &p);
                jac.jacr.set_column(dof, &r);
            }
        }
        DofLayout::Sparse(_) => {
            for (k, &dof) in chain.iter().enumerate() {
                let (p, r) = dof_column(model, data, dof, point);
                jac.jacp.set_column(k, &p);
                jac.jacr.set_column(k, &r);
            }
        }
    }
}

/// Dense Jacobian of a world-frame point attached to `body_id`: 3×nv
/// translational and 3×nv rotational.
///
/// Canonical equivalent of MuJoCo's `mj_jac(m, d, jacp, jacr, point, body)`.
/// Only the body's DOF chain contributes; every other column is zero.
#[must_use]
pub fn mj_jac(model: &Model, data: &Data, body_id: usize, point: &Vector3<f64>) -> PointJacobian {
    let mut jac = PointJacobian::zeros(DofLayout::Dense, model.nv);
    fill_columns(model, data, body_id, point, &mut jac);
    jac
}

/// Sparse counterpart of [`mj_jac`]: columns are exactly the body's DOF
/// chain. Bodies without DOFs (world, welded bodies) give zero columns.
#[must_use]
pub fn mj_jac_sparse(
    model: &Model,
    data: &Data,
    body_id: usize,
    point: &Vector3<f64>,
) -> PointJacobian {
    let layout = DofLayout::Sparse(model.body_chain(body_id).to_vec());
    let mut jac = PointJacobian::zeros(layout, model.nv);
    fill_columns(model, data, body_id, point, &mut jac);
    jac
}

/// Jacobians of `pos1` on `body1` and `pos2` on `body2`, and their
/// difference `dif = jac2 − jac1`.
///
/// In sparse mode `dif` is laid out over the union of both body chains,
/// sized with [`combine_sparse_count`] before any value is written. A DOF
/// present in only one chain contributes zero from the other side.
#[must_use]
pub fn mj_jac_dif_pair(
    model: &Model,
    data: &Data,
    body1: usize,
    body2: usize,
    pos1: &Vector3<f64>,
    pos2: &Vector3<f64>,
    sparse: bool,
) -> PairJacobian {
    if !sparse {
        let jac1 = mj_jac(model, data, body1, pos1);
        let jac2 = mj_jac(model, data, body2, pos2);
        let dif = PointJacobian {
            layout: DofLayout::Dense,
            jacp: &jac2.jacp - &jac1.jacp,
            jacr: &jac2.jacr - &jac1.jacr,
        };
        return PairJacobian { jac1, jac2, dif };
    }

    let jac1 = mj_jac_sparse(model, data, body1, pos1);
    let jac2 = mj_jac_sparse(model, data, body2, pos2);
    let chain1 = model.body_chain(body1);
    let chain2 = model.body_chain(body2);

    let nnz = combine_sparse_count(chain1, chain2);
    let mut indices = Vec::with_capacity(nnz);
    let mut jacp = Matrix3xX::zeros(nnz);
    let mut jacr = Matrix3xX::zeros(nnz);
    for_each_union(chain1, chain2, |e| {
        let mut p = Vector3::<f64>::zeros();
        let mut r = Vector3::<f64>::zeros();
        if let Some(i) = e.a {
            p -= jac1.jacp.column(i);
            r -= jac1.jacr.column(i);
        }
        if let Some(j) = e.b {
            p += jac2.jacp.column(j);
            r += jac2.jacr.column(j);
        }
        let k = indices.len();
        jacp.set_column(k, &p);
        jacr.set_column(k, &r);
        indices.push(e.index);
    });
    assert_eq!(indices.len(), nnz, "pair Jacobian nnz count mismatch");

    let dif = PointJacobian {
        layout: DofLayout::Sparse(indices),
        jacp,
        jacr,
    };
    PairJacobian { jac1, jac2, dif }
}

/// Integrate `qpos` in place by `qvel · dt`, respecting joint geometry.
///
/// Hinge and slide coordinates are additive. Ball and free rotations are
/// right-multiplied by the body-frame increment `exp(ω·dt)`; free-joint
/// translation is additive in the world frame.
pub fn mj_integrate_pos(model: &Model, qpos: &mut DVector<f64>, qvel: &DVector<f64>, dt: f64) {
    for jnt_id in 0..model.njnt {
        let qpos_adr = model.jnt_qpos_adr[jnt_id];
        let dof_adr = model.jnt_dof_adr[jnt_id];

        match model.jnt_type[jnt_id] {
            MjJointType::Hinge | MjJointType::Slide => {
                qpos[qpos_adr] += qvel[dof_adr] * dt;
            }
            MjJointType::Ball => {
                integrate_quat(qpos, qpos_adr, qvel, dof_adr, dt);
            }
            MjJointType::Free => {
                for i in 0..3 {
                    qpos[qpos_adr + i] += qvel[dof_adr + i] * dt;
                }
                integrate_quat(qpos, qpos_adr + 3, qvel, dof_adr + 3, dt);
            }
        }
    }
}

fn integrate_quat(qpos: &mut DVector<f64>, qpos_adr: usize, qvel: &DVector<f64>, dof_adr: usize, dt: f64) {
    let omega = Vector3::new(qvel[dof_adr], qvel[dof_adr + 1], qvel[dof_adr + 2]);
    let q_old = UnitQuaternion::new_normalize(nalgebra::Quaternion::new(
        qpos[qpos_adr],
        qpos[qpos_adr + 1],
        qpos[qpos_adr + 2],
        qpos[qpos_adr + 3],
    ));
    let q_new = q_old * UnitQuaternion::from_scaled_axis(omega * dt);
    qpos[qpos_adr] = q_new.w;
    qpos[qpos_adr + 1] = q_new.i;
    qpos[qpos_adr + 2] = q_new.j;
    qpos[qpos_adr + 3] = q_new.k;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::forward::mj_fwd_position;
    use approx::assert_relative_eq;

    /// Two independent arms: body 1 (slide x, hinge z) and body 2 (hinge y)
    /// whose child body 3 carries a ball joint.
    fn two_arms() -> (Model, Data) {
        let mut m = Model::empty();
        let b1 = m.add_body(0, Vector3::new(0.0, 0.0, 1.0), UnitQuaternion::identity(), None);
        m.add_joint(b1, MjJointType::Slide, Vector3::zeros(), Vector3::x());
        m.add_joint(b1, MjJointType::Hinge, Vector3::new(0.1, 0.0, 0.0), Vector3::z());
        let b2 = m.add_body(0, Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity(), None);
        m.add_joint(b2, MjJointType::Hinge, Vector3::zeros(), Vector3::y());
        let b3 = m.add_body(b2, Vector3::new(0.0, 0.0, 0.5), UnitQuaternion::identity(), None);
        m.add_joint(b3, MjJointType::Ball, Vector3::zeros(), Vector3::z());
        m.finalize().unwrap();

        let mut d = m.make_data();
        d.qpos[0] = 0.2;
        d.qpos[1] = 0.3;
        d.qpos[2] = -0.4;
        let q = UnitQuaternion::from_euler_angles(0.2, -0.1, 0.7);
        d.qpos.rows_mut(3, 4).copy_from_slice(&[q.w, q.i, q.j, q.k]);
        mj_fwd_position(&m, &mut d);
        (m, d)
    }

    #[test]
    fn test_sparse_matches_dense() {
        let (m, d) = two_arms();
        let p = Vector3::new(0.3, -0.2, 0.9);
        let dense = mj_jac(&m, &d, 3, &p);
        let sparse = mj_jac_sparse(&m, &d, 3, &p);
        assert_eq!(sparse.layout, DofLayout::Sparse(vec![2, 3, 4, 5]));
        let (jp, jr) = sparse.to_dense(m.nv);
        assert_relative_eq!(jp, dense.to_dense(m.nv).0, epsilon = 1e-15);
        assert_relative_eq!(jr, dense.to_dense(m.nv).1, epsilon = 1e-15);
    }

    #[test]
    fn test_point_jacobian_matches_finite_difference() {
        let (m, d) = two_arms();
        let local = Vector3::new(0.1, 0.2, -0.3);
        let world = |d: &Data| d.xpos[3] + d.xquat[3] * local;
        let jac = mj_jac(&m, &d, 3, &world(&d));

        let eps = 1e-6;
        for dof in 0..m.nv {
            let mut dq = DVector::zeros(m.nv);
            dq[dof] = 1.0;
            let mut plus = d.clone();
            mj_integrate_pos(&m, &mut plus.qpos, &dq, eps);
            mj_fwd_position(&m, &mut plus);
            let mut minus = d.clone();
            mj_integrate_pos(&m, &mut minus.qpos, &dq, -eps);
            mj_fwd_position(&m, &mut minus);
            let fd = (world(&plus) - world(&minus)) / (2.0 * eps);
            assert_relative_eq!(fd, jac.jacp.column(dof).into_owned(), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_dif_pair_sparse_union_and_values() {
        let (m, d) = two_arms();
        let p1 = Vector3::new(0.0, 0.0, 1.0);
        let p2 = Vector3::new(1.0, 0.0, 0.6);
        let dense = mj_jac_dif_pair(&m, &d, 1, 3, &p1, &p2, false);
        let sparse = mj_jac_dif_pair(&m, &d, 1, 3, &p1, &p2, true);

        assert_eq!(sparse.dif.layout, DofLayout::Sparse(vec![0, 1, 2, 3, 4, 5]));
        let (jp, jr) = sparse.dif.to_dense(m.nv);
        assert_relative_eq!(jp, dense.dif.to_dense(m.nv).0, epsilon = 1e-15);
        assert_relative_eq!(jr, dense.dif.to_dense(m.nv).1, epsilon = 1e-15);

        // Body 1's slide DOF only enters through jac1.
        assert_relative_eq!(dense.dif.jacp.column(0).into_owned(), -Vector3::x());
    }

    #[test]
    fn test_dif_pair_with_world_is_zero_width() {
        let mut m = Model::empty();
        let b = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
        m.add_geom(b, Vector3::zeros(), None);
        m.finalize().unwrap();
        let mut d = m.make_data();
        mj_fwd_position(&m, &mut d);

        let pair = mj_jac_dif_pair(&m, &d, b, 0, &Vector3::zeros(), &Vector3::zeros(), true);
        assert_eq!(pair.dif.ncol(), 0);
        assert_eq!(pair.dif.layout, DofLayout::Sparse(vec![]));
    }

    #[test]
    fn test_integrate_ball_is_body_frame() {
        let mut m = Model::empty();
        let b = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
        m.add_joint(b, MjJointType::Ball, Vector3::zeros(), Vector3::z());
        m.finalize().unwrap();

        let q0 = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.5);
        let mut qpos = DVector::from_vec(vec![q0.w, q0.i, q0.j, q0.k]);
        let qvel = DVector::from_vec(vec![0.0, 0.0, 0.3]);
        mj_integrate_pos(&m, &mut qpos, &qvel, 2.0);

        let expected = q0 * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.6);
        assert_relative_eq!(qpos[0], expected.w, epsilon = 1e-12);
        assert_relative_eq!(qpos[3], expected.k, epsilon = 1e-12);
    }
}
