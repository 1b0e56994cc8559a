//! Contact Jacobian rows.
//!
//! The relative velocity of geom2 with respect to geom1 at the contact
//! point is projected onto the contact frame (normal, t1, t2, then the
//! angular normal and tangents for torsional and rolling friction). The
//! friction cone decides how those frame rows become constraint rows.

use nalgebra::DMatrix;
use sim_types::ConeType;

use super::assembly::ConstraintBlock;
use crate::jacobian::mj_jac_dif_pair;
use crate::types::{Contact, Data, Model};

/// Project the pair Jacobian onto the contact frame: `dim × ncol`.
///
/// - Row 0: normal (translational)
/// - Rows 1-2: tangents (translational, dim >= 3)
/// - Row 3: spin about the normal (rotational, dim >= 4)
/// - Rows 4-5: rolling about the tangents (rotational, dim = 6)
#[must_use]
pub fn contact_frame_jacobian(
    model: &Model,
    data: &Data,
    contact: &Contact,
    sparse: bool,
) -> ConstraintBlock {
    let body1 = model.geom_body[contact.geom1];
    let body2 = model.geom_body[contact.geom2];
    let pair = mj_jac_dif_pair(model, data, body1, body2, &contact.pos, &contact.pos, sparse);

    let dim = contact.dim;
    let ncol = pair.dif.ncol();
    let mut jac = DMatrix::zeros(dim, ncol);
    for r in 0..dim {
        let (block, axis) = if r < 3 {
            (&pair.dif.jacp, contact.axis(r))
        } else {
            (&pair.dif.jacr, contact.axis(r - 3))
        };
        for k in 0..ncol {
            jac[(r, k)] = axis.dot(&block.column(k));
        }
    }

    let mut pos = vec![0.0; dim];
    pos[0] = contact.dist;
    ConstraintBlock {
        layout: pair.dif.layout,
        jac,
        pos,
    }
}

/// Constraint rows of one contact under `cone`.
///
/// Frictionless and elliptic contacts use the frame rows directly.
/// Pyramidal contacts emit the `2·(dim−1)` cone edges
/// `J_n + μ_k·J_k` and `J_n − μ_k·J_k`, each at distance `dist`.
#[must_use]
pub fn contact_block(
    model: &Model,
    data: &Data,
    contact: &Contact,
    cone: ConeType,
    sparse: bool,
) -> ConstraintBlock {
    let frame = contact_frame_jacobian(model, data, contact, sparse);
    if contact.dim == 1 || cone == ConeType::Elliptic {
        return frame;
    }

    let dim = contact.dim;
    let ncol = frame.jac.ncols();
    let mut jac = DMatrix::zeros(2 * (dim - 1), ncol);
    for k in 1..dim {
        let mu = contact.mu[k - 1];
        for c in 0..ncol {
            let (n, t) = (frame.jac[(0, c)], frame.jac[(k, c)]);
            jac[(2 * (k - 1), c)] = n + mu * t;
            jac[(2 * (k - 1) + 1, c)] = n - mu * t;
        }
    }
    ConstraintBlock {
        layout: frame.layout,
        jac,
        pos: vec![contact.dist; 2 * (dim - 1)],
    }
}
