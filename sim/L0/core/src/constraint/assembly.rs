//! Constraint row assembly for all constraint types.
//!
//! Populates `efc_J` and the `efc_*` row metadata on [`Data`] for
//! equality, friction, limit and contact constraints. Corresponds to
//! MuJoCo's `mj_makeConstraint` in `engine_core_constraint.c`.
//!
//! Assembly runs in three phases:
//! 1. count rows and, for the sparse Jacobian, the exact nonzeros per row;
//! 2. allocate `efc_J` and the metadata vectors once at that size;
//! 3. build each constraint's block and copy it into place, checking it
//!    against the count from phase 1.

use nalgebra::DMatrix;
use sim_types::{ConeType, ConstraintOptions, SimError};

use super::equality::{connect_block, joint_block, tendon_block, weld_block};
use super::instance::{ConstraintInstance, collect_active_constraints};
use super::jacobian::contact_block;
use super::row::{ConstraintJacobian, SparseConstraintJacobian};
use crate::forward::{check_contacts, check_dimensions};
use crate::jacobian::DofLayout;
use crate::types::{ConstraintType, Data, EqualityType, LimitSide, MjJointType, Model};

/// Residuals and Jacobian rows of one constraint.
///
/// `jac` is `nrow × ncol`; column `k` belongs to DOF `layout.dof(k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBlock {
    /// Column layout.
    pub layout: DofLayout,
    /// Jacobian rows.
    pub jac: DMatrix<f64>,
    /// Residual per row (`efc_pos`).
    pub pos: Vec<f64>,
}

impl ConstraintBlock {
    /// One row `scale · e_dof`.
    fn unit_dof(nv: usize, dof: usize, scale: f64, pos: f64, sparse: bool) -> Self {
        if sparse {
            Self {
                layout: DofLayout::Sparse(vec![dof]),
                jac: DMatrix::from_element(1, 1, scale),
                pos: vec![pos],
            }
        } else {
            let mut jac = DMatrix::zeros(1, nv);
            jac[(0, dof)] = scale;
            Self {
                layout: DofLayout::Dense,
                jac,
                pos: vec![pos],
            }
        }
    }

    /// One row `scale · ten_J[tendon]` over the tendon's DOF pattern.
    fn tendon(model: &Model, data: &Data, tendon: usize, scale: f64, pos: f64, sparse: bool) -> Self {
        if sparse {
            let dofs = model.tendon_dofs(tendon);
            let jac = DMatrix::from_iterator(1, dofs.len(), dofs.iter().map(|&d| scale * data.ten_J[tendon][d]));
            Self {
                layout: DofLayout::Sparse(dofs.to_vec()),
                jac,
                pos: vec![pos],
            }
        } else {
            Self {
                layout: DofLayout::Dense,
                jac: DMatrix::from_row_slice(1, model.nv, (&data.ten_J[tendon] * scale).as_slice()),
                pos: vec![pos],
            }
        }
    }

    /// Ball joint limit: `−axis` over the joint's 3 DOFs, where `axis` is the
    /// unit rotation axis of the joint quaternion.
    fn ball_limit(model: &Model, data: &Data, jnt: usize, dist: f64, sparse: bool) -> Self {
        let adr = model.jnt_dof_adr[jnt];
        let rotvec = super::orientation::quat_to_rotvec(&crate::forward::qpos_quat(data, model.jnt_qpos_adr[jnt]));
        let (axis, _) = super::orientation::normalize_axis(&rotvec);
        let (layout, mut jac, offset) = if sparse {
            (DofLayout::Sparse(vec![adr, adr + 1, adr + 2]), DMatrix::zeros(1, 3), 0)
        } else {
            (DofLayout::Dense, DMatrix::zeros(1, model.nv), adr)
        };
        for i in 0..3 {
            jac[(0, offset + i)] = -axis[i];
        }
        Self {
            layout,
            jac,
            pos: vec![dist],
        }
    }
}

/// Build the block of one active constraint.
#[must_use]
pub fn constraint_block(
    model: &Model,
    data: &Data,
    instance: &ConstraintInstance,
    cone: ConeType,
    sparse: bool,
) -> ConstraintBlock {
    match *instance {
        ConstraintInstance::Equality { eq_id } => match model.eq_type[eq_id] {
            EqualityType::Connect => connect_block(model, data, eq_id, sparse),
            EqualityType::Weld => weld_block(model, data, eq_id, sparse),
            EqualityType::Joint => joint_block(model, data, eq_id, sparse),
            EqualityType::Tendon => tendon_block(model, data, eq_id, sparse),
        },
        ConstraintInstance::DofFriction { dof } => {
            ConstraintBlock::unit_dof(model.nv, dof, 1.0, 0.0, sparse)
        }
        ConstraintInstance::TendonFriction { tendon } => {
            ConstraintBlock::tendon(model, data, tendon, 1.0, 0.0, sparse)
        }
        ConstraintInstance::JointLimit { jnt, side, dist } => match model.jnt_type[jnt] {
            MjJointType::Ball => ConstraintBlock::ball_limit(model, data, jnt, dist, sparse),
            _ => ConstraintBlock::unit_dof(model.nv, model.jnt_dof_adr[jnt], side.sign(), dist, sparse),
        },
        ConstraintInstance::TendonLimit { tendon, side, dist } => {
            ConstraintBlock::tendon(model, data, tendon, side.sign(), dist, sparse)
        }
        ConstraintInstance::Contact { contact_id } => {
            contact_block(model, data, &data.contacts[contact_id], cone, sparse)
        }
    }
}

/// Row metadata that does not depend on the Jacobian.
fn row_margin_and_friction(model: &Model, data: &Data, instance: &ConstraintInstance) -> (f64, f64) {
    match *instance {
        ConstraintInstance::Equality { .. } => (0.0, 0.0),
        ConstraintInstance::DofFriction { dof } => (0.0, model.dof_frictionloss[dof]),
        ConstraintInstance::TendonFriction { tendon } => (0.0, model.tendon_frictionloss[tendon]),
        ConstraintInstance::JointLimit { jnt, .. } => (model.jnt_margin[jnt], 0.0),
        ConstraintInstance::TendonLimit { tendon, .. } => (model.tendon_margin[tendon], 0.0),
        ConstraintInstance::Contact { contact_id } => (data.contacts[contact_id].includemargin, 0.0),
    }
}

/// Assemble the constraint Jacobian and row metadata.
///
/// Requires up-to-date kinematics (`mj_fwd_position`). Row ordering:
/// 1. Equality constraints (connect, weld, joint, tendon)
/// 2. DOF friction loss
/// 3. Tendon friction loss
/// 4. Joint limits
/// 5. Tendon limits
/// 6. Contacts
///
/// Dense or sparse storage follows `options.jacobian`. Constraints whose
/// bodies or tendons have no DOFs still produce rows: all-zero in the dense
/// Jacobian, zero-width in the sparse one.
///
/// # Errors
///
/// Returns [`SimError::DimensionMismatch`] if `qpos`/`qvel` do not match
/// the model, and [`SimError::InvalidContact`] if a contact names a geom
/// outside the model or carries an invalid dimension or friction.
///
/// # Panics
///
/// Panics if a constraint block disagrees with the row or nonzero count
/// computed for it in the counting phase.
pub fn mj_make_constraint(
    model: &Model,
    data: &mut Data,
    options: &ConstraintOptions,
) -> Result<(), SimError> {
    check_dimensions(model, data)?;
    check_contacts(model, data)?;
    let nv = model.nv;
    let sparse = options.is_sparse(nv);
    let cone = options.cone;

    let instances = collect_active_constraints(model, data, options);

    // === Phase 1: Count rows and nonzeros ===
    let mut nefc = 0usize;
    let mut rownnz = Vec::new();
    let mut counts = Vec::with_capacity(instances.len());
    for inst in &instances {
        let nrow = inst.nrow(model, data, cone);
        let nnz = if sparse { inst.row_nnz(model, data) } else { nv };
        if nnz == 0 && nrow > 0 {
            tracing::trace!(?inst, "constraint has no DOFs");
        }
        if sparse {
            rownnz.extend(std::iter::repeat(nnz).take(nrow));
        }
        counts.push((nrow, nnz));
        nefc += nrow;
    }

    // === Phase 2: Allocate ===
    let mut efc_j = if sparse {
        ConstraintJacobian::Sparse(SparseConstraintJacobian::with_row_counts(nv, rownnz))
    } else {
        ConstraintJacobian::Dense(DMatrix::zeros(nefc, nv))
    };
    data.efc_type = Vec::with_capacity(nefc);
    data.efc_id = Vec::with_capacity(nefc);
    data.efc_pos = Vec::with_capacity(nefc);
    data.efc_margin = Vec::with_capacity(nefc);
    data.efc_frictionloss = Vec::with_capacity(nefc);
    let (mut ne, mut nf, mut nl) = (0, 0, 0);

    // === Phase 3: Populate rows ===
    let mut row = 0usize;
    let mut scratch = Vec::with_capacity(nv);
    for (inst, &(nrow, nnz)) in instances.iter().zip(&counts) {
        let block = constraint_block(model, data, inst, cone, sparse);
        assert_eq!(block.jac.nrows(), nrow, "constraint {inst:?}: row count mismatch");
        assert_eq!(block.jac.ncols(), nnz, "constraint {inst:?}: nnz count mismatch");

        let ctype = inst.constraint_type(data, cone);
        let (margin, frictionloss) = row_margin_and_friction(model, data, inst);

        for r in 0..nrow {
            match &mut efc_j {
                ConstraintJacobian::Dense(m) => {
                    for k in 0..nnz {
                        m[(row, block.layout.dof(k))] = block.jac[(r, k)];
                    }
                }
                ConstraintJacobian::Sparse(s) => {
                    scratch.clear();
                    scratch.extend(block.jac.row(r).iter().copied());
                    let indices = block.layout.indices().unwrap_or(&[]);
                    s.push_row(indices, &scratch);
                }
            }
            data.efc_type.push(ctype);
            data.efc_id.push(inst.id());
            data.efc_pos.push(block.pos[r]);
            data.efc_margin.push(margin);
            data.efc_frictionloss.push(frictionloss);
            row += 1;
        }

        match ctype {
            ConstraintType::Equality => ne += nrow,
            ConstraintType::FrictionDof | ConstraintType::FrictionTendon => nf += nrow,
            ConstraintType::LimitJoint | ConstraintType::LimitTendon => nl += nrow,
            _ => {}
        }
    }
    assert_eq!(row, nefc, "row count mismatch after assembly");
    if let ConstraintJacobian::Sparse(s) = &efc_j {
        assert!(s.is_complete(), "sparse Jacobian has unwritten rows");
    }

    data.efc_vel = efc_j.mul_vec(&data.qvel);
    tracing::debug!(
        nefc,
        ne,
        nf,
        nl,
        nnz = efc_j.nnz(),
        sparse,
        "constraint Jacobian assembled"
    );
    data.efc_J = efc_j;
    data.nefc = nefc;
    data.ne = ne;
    data.nf = nf;
    data.nl = nl;
    Ok(())
}
