//! Constraint activation: which constraints produce rows this step.
//!
//! [`collect_active_constraints`] walks the model in MuJoCo's row order
//! (equality, DOF friction, tendon friction, joint limits, tendon limits,
//! contacts) and returns one [`ConstraintInstance`] per active constraint.
//! Each instance knows how many rows it contributes and, for the sparse
//! Jacobian, how many nonzeros each of those rows holds. Both counts are
//! available before any Jacobian value is computed.

use sim_types::{ConeType, ConstraintOptions};

use super::orientation::quat_to_rotvec;
use crate::forward::qpos_quat;
use crate::linalg::combine_sparse_count;
use crate::types::model_init::NO_OBJECT;
use crate::types::{ConstraintType, Data, EqualityType, LimitSide, MjJointType, Model};

/// One active constraint, in assembly order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintInstance {
    /// Active equality constraint.
    Equality {
        /// Equality id.
        eq_id: usize,
    },
    /// Friction loss on a single DOF.
    DofFriction {
        /// DOF index.
        dof: usize,
    },
    /// Friction loss on a tendon.
    TendonFriction {
        /// Tendon id.
        tendon: usize,
    },
    /// Joint limit within its margin. Ball limits always use `Upper`.
    JointLimit {
        /// Joint id.
        jnt: usize,
        /// Which bound.
        side: LimitSide,
        /// Signed distance to the bound (negative = violated).
        dist: f64,
    },
    /// Tendon length limit within its margin.
    TendonLimit {
        /// Tendon id.
        tendon: usize,
        /// Which bound.
        side: LimitSide,
        /// Signed distance to the bound (negative = violated).
        dist: f64,
    },
    /// Contact closer than its include margin.
    Contact {
        /// Index into `Data::contacts`.
        contact_id: usize,
    },
}

impl ConstraintInstance {
    /// Source object id recorded in `efc_id`.
    #[must_use]
    pub fn id(&self) -> usize {
        match *self {
            Self::Equality { eq_id } => eq_id,
            Self::DofFriction { dof } => dof,
            Self::TendonFriction { tendon } | Self::TendonLimit { tendon, .. } => tendon,
            Self::JointLimit { jnt, .. } => jnt,
            Self::Contact { contact_id } => contact_id,
        }
    }

    /// Row tag recorded in `efc_type`.
    #[must_use]
    pub fn constraint_type(&self, data: &Data, cone: ConeType) -> ConstraintType {
        match *self {
            Self::Equality { .. } => ConstraintType::Equality,
            Self::DofFriction { .. } => ConstraintType::FrictionDof,
            Self::TendonFriction { .. } => ConstraintType::FrictionTendon,
            Self::JointLimit { .. } => ConstraintType::LimitJoint,
            Self::TendonLimit { .. } => ConstraintType::LimitTendon,
            Self::Contact { contact_id } => {
                if data.contacts[contact_id].dim == 1 {
                    ConstraintType::ContactFrictionless
                } else {
                    match cone {
                        ConeType::Pyramidal => ConstraintType::ContactPyramidal,
                        ConeType::Elliptic => ConstraintType::ContactElliptic,
                    }
                }
            }
        }
    }

    /// Number of Jacobian rows this constraint contributes.
    #[must_use]
    pub fn nrow(&self, model: &Model, data: &Data, cone: ConeType) -> usize {
        match *self {
            Self::Equality { eq_id } => model.eq_type[eq_id].nrow(),
            Self::DofFriction { .. }
            | Self::TendonFriction { .. }
            | Self::JointLimit { .. }
            | Self::TendonLimit { .. } => 1,
            Self::Contact { contact_id } => {
                let dim = data.contacts[contact_id].dim;
                match (dim, cone) {
                    (1, _) => 1,
                    (_, ConeType::Pyramidal) => 2 * (dim - 1),
                    (_, ConeType::Elliptic) => dim,
                }
            }
        }
    }

    /// Nonzeros in each row of this constraint's sparse Jacobian.
    ///
    /// All rows of one constraint share a pattern. The count is derived
    /// from body chains and tendon patterns only, never from values.
    #[must_use]
    pub fn row_nnz(&self, model: &Model, data: &Data) -> usize {
        match *self {
            Self::Equality { eq_id } => {
                let (o1, o2) = (model.eq_obj1id[eq_id], model.eq_obj2id[eq_id]);
                match model.eq_type[eq_id] {
                    EqualityType::Connect | EqualityType::Weld => {
                        combine_sparse_count(model.body_chain(o1), model.body_chain(o2))
                    }
                    EqualityType::Joint => {
                        let d1 = [model.jnt_dof_adr[o1]];
                        if o2 == NO_OBJECT {
                            1
                        } else {
                            combine_sparse_count(&d1, &[model.jnt_dof_adr[o2]])
                        }
                    }
                    EqualityType::Tendon => {
                        if o2 == NO_OBJECT {
                            model.tendon_dof_num[o1]
                        } else {
                            combine_sparse_count(model.tendon_dofs(o1), model.tendon_dofs(o2))
                        }
                    }
                }
            }
            Self::DofFriction { .. } => 1,
            Self::TendonFriction { tendon } | Self::TendonLimit { tendon, .. } => {
                model.tendon_dof_num[tendon]
            }
            Self::JointLimit { jnt, .. } => model.jnt_type[jnt].nv(),
            Self::Contact { contact_id } => {
                let c = &data.contacts[contact_id];
                combine_sparse_count(
                    model.body_chain(model.geom_body[c.geom1]),
                    model.body_chain(model.geom_body[c.geom2]),
                )
            }
        }
    }
}

/// Push lower/upper limit instances for a coordinate `value` in `range`.
fn push_range_limits(
    out: &mut Vec<ConstraintInstance>,
    value: f64,
    (lo, hi): (f64, f64),
    margin: f64,
    make: impl Fn(LimitSide, f64) -> ConstraintInstance,
) {
    let lower = value - lo;
    if lower < margin {
        out.push(make(LimitSide::Lower, lower));
    }
    let upper = hi - value;
    if upper < margin {
        out.push(make(LimitSide::Upper, upper));
    }
}

/// Decide which constraints are active for the current state.
///
/// Requires kinematics and tendon lengths to be up to date. A limit or
/// contact is active when its distance is strictly below its margin.
#[must_use]
pub fn collect_active_constraints(
    model: &Model,
    data: &Data,
    options: &ConstraintOptions,
) -> Vec<ConstraintInstance> {
    let mut out = Vec::new();

    if !options.disable_equality {
        out.extend(
            (0..model.neq)
                .filter(|&eq_id| model.eq_active[eq_id])
                .map(|eq_id| ConstraintInstance::Equality { eq_id }),
        );
    }

    if !options.disable_frictionloss {
        out.extend(
            (0..model.nv)
                .filter(|&dof| model.dof_frictionloss[dof] > 0.0)
                .map(|dof| ConstraintInstance::DofFriction { dof }),
        );
        out.extend(
            (0..model.ntendon)
                .filter(|&t| model.tendon_frictionloss[t] > 0.0)
                .map(|tendon| ConstraintInstance::TendonFriction { tendon }),
        );
    }

    if !options.disable_limit {
        for jnt in (0..model.njnt).filter(|&j| model.jnt_limited[j]) {
            let margin = model.jnt_margin[jnt];
            let adr = model.jnt_qpos_adr[jnt];
            match model.jnt_type[jnt] {
                MjJointType::Hinge | MjJointType::Slide => {
                    push_range_limits(&mut out, data.qpos[adr], model.jnt_range[jnt], margin, |side, dist| {
                        ConstraintInstance::JointLimit { jnt, side, dist }
                    });
                }
                MjJointType::Ball => {
                    let (lo, hi) = model.jnt_range[jnt];
                    let angle = quat_to_rotvec(&qpos_quat(data, adr)).norm();
                    let dist = lo.max(hi) - angle;
                    if dist < margin {
                        out.push(ConstraintInstance::JointLimit {
                            jnt,
                            side: LimitSide::Upper,
                            dist,
                        });
                    }
                }
                MjJointType::Free => {}
            }
        }
        for tendon in (0..model.ntendon).filter(|&t| model.tendon_limited[t]) {
            push_range_limits(
                &mut out,
                data.ten_length[tendon],
                model.tendon_range[tendon],
                model.tendon_margin[tendon],
                |side, dist| ConstraintInstance::TendonLimit { tendon, side, dist },
            );
        }
    }

    if !options.disable_contact {
        out.extend(
            data.contacts
                .iter()
                .enumerate()
                .filter(|(_, c)| c.dist < c.includemargin)
                .map(|(contact_id, _)| ConstraintInstance::Contact { contact_id }),
        );
    }

    out
}
