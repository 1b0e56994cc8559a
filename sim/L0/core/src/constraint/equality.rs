//! Equality constraint rows: connect, weld, joint and tendon couplings.
//!
//! Each function returns the residual and Jacobian block of one equality
//! constraint. Body couplings go through [`mj_jac_dif_pair`] with the
//! reference body first, so `dif = jac(body1) − jac(body2)` matches the
//! residual `pos1 − pos2`.

use nalgebra::{DMatrix, Vector3};

use super::assembly::ConstraintBlock;
use super::orientation::{orientation_jacobian, orientation_residual};
use crate::jacobian::{DofLayout, mj_jac_dif_pair};
use crate::linalg::combine_sparse;
use crate::types::model_init::NO_OBJECT;
use crate::types::{Data, Model};

/// World position of a body-local anchor.
#[inline]
fn anchor_world(data: &Data, body: usize, local: &[f64]) -> Vector3<f64> {
    data.xpos[body] + data.xquat[body] * Vector3::from_column_slice(local)
}

/// Connect: 3 translational rows, residual `p1 − p2`.
pub fn connect_block(model: &Model, data: &Data, eq_id: usize, sparse: bool) -> ConstraintBlock {
    let (b1, b2) = (model.eq_obj1id[eq_id], model.eq_obj2id[eq_id]);
    let prm = &model.eq_data[eq_id];
    let pos1 = anchor_world(data, b1, &prm[0..3]);
    let pos2 = anchor_world(data, b2, &prm[3..6]);

    let pair = mj_jac_dif_pair(model, data, b2, b1, &pos2, &pos1, sparse);
    let cpos = pos1 - pos2;

    let ncol = pair.dif.ncol();
    let mut jac = DMatrix::zeros(3, ncol);
    jac.rows_mut(0, 3).copy_from(&pair.dif.jacp);
    ConstraintBlock {
        layout: pair.dif.layout,
        jac,
        pos: cpos.iter().copied().collect(),
    }
}

/// Weld: 3 translational rows plus 3 rotational rows scaled by the torque
/// scale.
///
/// The rotational residual compares `xquat[b1] ⊗ relquat` against
/// `xquat[b2]` and is differentiated with [`orientation_jacobian`].
pub fn weld_block(model: &Model, data: &Data, eq_id: usize, sparse: bool) -> ConstraintBlock {
    let (b1, b2) = (model.eq_obj1id[eq_id], model.eq_obj2id[eq_id]);
    let prm = &model.eq_data[eq_id];
    let torquescale = prm[10];
    let pos1 = anchor_world(data, b1, &prm[3..6]);
    let pos2 = anchor_world(data, b2, &prm[0..3]);

    let pair = mj_jac_dif_pair(model, data, b2, b1, &pos2, &pos1, sparse);

    let q_current = data.xquat[b1] * model.weld_relquat(eq_id);
    let q_reference = data.xquat[b2];
    let rot_res = orientation_residual(&q_current, &q_reference) * torquescale;
    let rot_jac = orientation_jacobian(&q_current, &q_reference, &pair.dif.jacr) * torquescale;

    let ncol = pair.dif.ncol();
    let mut jac = DMatrix::zeros(6, ncol);
    jac.rows_mut(0, 3).copy_from(&pair.dif.jacp);
    jac.rows_mut(3, 3).copy_from(&rot_jac);

    let cpos = pos1 - pos2;
    let pos = cpos.iter().chain(rot_res.iter()).copied().collect();
    ConstraintBlock {
        layout: pair.dif.layout,
        jac,
        pos,
    }
}

/// Evaluate `poly(x)` and `poly'(x)` for 5 coefficients (lowest order first).
fn polynomial(coef: &[f64], x: f64) -> (f64, f64) {
    let value = coef[0] + x * (coef[1] + x * (coef[2] + x * (coef[3] + x * coef[4])));
    let deriv = coef[1] + x * (2.0 * coef[2] + x * (3.0 * coef[3] + x * 4.0 * coef[4]));
    (value, deriv)
}

/// Single row `ind1·1 − ind2·deriv` built as a block over the merged
/// pattern (sparse) or all `nv` DOFs (dense). Shared DOFs sum.
fn coupling_row(
    nv: usize,
    ind1: &[usize],
    val1: &[f64],
    ind2: &[usize],
    val2: &[f64],
    deriv: f64,
    sparse: bool,
) -> (DofLayout, DMatrix<f64>) {
    if sparse {
        let mut ind = Vec::new();
        let mut val = Vec::new();
        combine_sparse(ind1, val1, 1.0, ind2, val2, -deriv, &mut ind, &mut val);
        let jac = DMatrix::from_row_slice(1, val.len(), &val);
        (DofLayout::Sparse(ind), jac)
    } else {
        let mut jac = DMatrix::zeros(1, nv);
        for (&d, &v) in ind1.iter().zip(val1) {
            jac[(0, d)] += v;
        }
        for (&d, &v) in ind2.iter().zip(val2) {
            jac[(0, d)] -= deriv * v;
        }
        (DofLayout::Dense, jac)
    }
}

/// Joint coupling: residual `q1 − q1₀ − poly(q2 − q2₀)`, one row.
pub fn joint_block(model: &Model, data: &Data, eq_id: usize, sparse: bool) -> ConstraintBlock {
    let (j1, j2) = (model.eq_obj1id[eq_id], model.eq_obj2id[eq_id]);
    let coef = &model.eq_data[eq_id][0..5];

    let adr1 = model.jnt_qpos_adr[j1];
    let q1 = data.qpos[adr1] - model.qpos0[adr1];
    let dof1 = [model.jnt_dof_adr[j1]];

    let (pos, layout, jac) = if j2 == NO_OBJECT {
        let (layout, jac) = coupling_row(model.nv, &dof1, &[1.0], &[], &[], 0.0, sparse);
        (q1 - coef[0], layout, jac)
    } else {
        let adr2 = model.jnt_qpos_adr[j2];
        let (value, deriv) = polynomial(coef, data.qpos[adr2] - model.qpos0[adr2]);
        let dof2 = [model.jnt_dof_adr[j2]];
        let (layout, jac) = coupling_row(model.nv, &dof1, &[1.0], &dof2, &[1.0], deriv, sparse);
        (q1 - value, layout, jac)
    };
    ConstraintBlock {
        layout,
        jac,
        pos: vec![pos],
    }
}

/// Tendon coupling: residual `L1 − L1₀ − poly(L2 − L2₀)`, one row.
pub fn tendon_block(model: &Model, data: &Data, eq_id: usize, sparse: bool) -> ConstraintBlock {
    let (t1, t2) = (model.eq_obj1id[eq_id], model.eq_obj2id[eq_id]);
    let coef = &model.eq_data[eq_id][0..5];

    let l1 = data.ten_length[t1] - model.tendon_length0[t1];
    let ind1 = model.tendon_dofs(t1);
    let val1: Vec<f64> = ind1.iter().map(|&d| data.ten_J[t1][d]).collect();

    let (pos, layout, jac) = if t2 == NO_OBJECT {
        let (layout, jac) = coupling_row(model.nv, ind1, &val1, &[], &[], 0.0, sparse);
        (l1 - coef[0], layout, jac)
    } else {
        let (value, deriv) = polynomial(coef, data.ten_length[t2] - model.tendon_length0[t2]);
        let ind2 = model.tendon_dofs(t2);
        let val2: Vec<f64> = ind2.iter().map(|&d| data.ten_J[t2][d]).collect();
        let (layout, jac) = coupling_row(model.nv, ind1, &val1, ind2, &val2, deriv, sparse);
        (l1 - value, layout, jac)
    };
    ConstraintBlock {
        layout,
        jac,
        pos: vec![pos],
    }
}
