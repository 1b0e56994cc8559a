//! Data struct definition and core accessor methods.
//!
//! [`Data`] is the dynamic state: generalized coordinates (qpos, qvel),
//! quantities computed from them by kinematics, the contact list supplied
//! by collision detection, and the assembled constraint Jacobian. It is the
//! mutable counterpart to [`Model`]; one `Data` is created per environment
//! via `model.make_data()`.

use nalgebra::{DVector, UnitQuaternion, Vector3, Vector6};

use super::contact_types::Contact;
use super::enums::ConstraintType;
use super::model::Model;
use crate::constraint::ConstraintJacobian;

/// Dynamic state (like mjData).
///
/// # Key Invariant
///
/// `qpos`, `qvel` and `contacts` are the only inputs. Everything else
/// (xpos, cdof, ten_J, efc_*) is COMPUTED from them by [`Data::forward`].
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // ten_J, efc_J match MuJoCo naming convention
pub struct Data {
    // ==================== Generalized Coordinates ====================
    /// Joint positions (length `nq`), quaternions stored `w, x, y, z`.
    pub qpos: DVector<f64>,
    /// Joint velocities (length `nv`).
    pub qvel: DVector<f64>,

    // ==================== Body / Joint Kinematics ====================
    /// Body positions in world frame.
    pub xpos: Vec<Vector3<f64>>,
    /// Body orientations in world frame.
    pub xquat: Vec<UnitQuaternion<f64>>,
    /// Joint anchors in world frame (indexed by joint).
    pub xanchor: Vec<Vector3<f64>>,
    /// Joint axes in world frame (hinge/slide; zero for ball/free).
    pub xaxis: Vec<Vector3<f64>>,
    /// Per-DOF world motion axis `[angular; linear]` about the joint anchor.
    pub cdof: Vec<Vector6<f64>>,
    /// Geom positions in world frame.
    pub geom_xpos: Vec<Vector3<f64>>,

    // ==================== Tendons ====================
    /// Tendon lengths.
    pub ten_length: Vec<f64>,
    /// Tendon Jacobians (dense, length `nv` each). Nonzeros lie in
    /// `model.tendon_dofs(t)`.
    pub ten_J: Vec<DVector<f64>>,

    // ==================== Contacts (external input) ====================
    /// Contacts detected for the current configuration.
    pub contacts: Vec<Contact>,

    // ==================== Constraints (output of assembly) ====================
    /// Number of constraint rows.
    pub nefc: usize,
    /// Number of equality rows.
    pub ne: usize,
    /// Number of friction-loss rows.
    pub nf: usize,
    /// Number of limit rows.
    pub nl: usize,
    /// Constraint Jacobian (`nefc × nv`), dense or sparse.
    pub efc_J: ConstraintJacobian,
    /// Row type.
    pub efc_type: Vec<ConstraintType>,
    /// Source object id (eq id, dof, tendon, joint or contact index).
    pub efc_id: Vec<usize>,
    /// Residual / signed distance.
    pub efc_pos: Vec<f64>,
    /// Activation margin.
    pub efc_margin: Vec<f64>,
    /// Friction loss (friction rows only, else 0).
    pub efc_frictionloss: Vec<f64>,
    /// Constraint velocity `J · qvel`.
    pub efc_vel: DVector<f64>,
}

impl Data {
    /// Allocate state for `model` at its reference configuration.
    #[must_use]
    pub fn new(model: &Model) -> Self {
        Self {
            qpos: model.qpos0.clone(),
            qvel: DVector::zeros(model.nv),
            xpos: vec![Vector3::zeros(); model.nbody],
            xquat: vec![UnitQuaternion::identity(); model.nbody],
            xanchor: vec![Vector3::zeros(); model.njnt],
            xaxis: vec![Vector3::zeros(); model.njnt],
            cdof: vec![Vector6::zeros(); model.nv],
            geom_xpos: vec![Vector3::zeros(); model.ngeom],
            ten_length: vec![0.0; model.ntendon],
            ten_J: vec![DVector::zeros(model.nv); model.ntendon],
            contacts: Vec::new(),
            nefc: 0,
            ne: 0,
            nf: 0,
            nl: 0,
            efc_J: ConstraintJacobian::empty(model.nv),
            efc_type: Vec::new(),
            efc_id: Vec::new(),
            efc_pos: Vec::new(),
            efc_margin: Vec::new(),
            efc_frictionloss: Vec::new(),
            efc_vel: DVector::zeros(0),
        }
    }

    /// Number of contact rows (`nefc − ne − nf − nl`).
    #[must_use]
    pub fn ncon_rows(&self) -> usize {
        self.nefc - self.ne - self.nf - self.nl
    }

    /// Reset to the model's reference configuration and clear all outputs.
    pub fn reset(&mut self, model: &Model) {
        *self = Self::new(model);
    }
}
