//! Model struct definition and field accessors.
//!
//! [`Model`] is the static, immutable description of the simulated system:
//! kinematic tree, joint definitions, geometries, tendons, equality
//! constraints, and constraint options. It is built with the methods in
//! `model_init.rs` and shared (read-only) across all pipeline stages.

use nalgebra::{DVector, UnitQuaternion, Vector3};
use sim_types::ConstraintOptions;

use super::data::Data;
use super::enums::{EqualityType, MjJointType};

/// Number of parameters stored per equality constraint in `eq_data`.
///
/// Layout by type:
/// - Connect: `[0..3]` anchor on body 1, `[3..6]` anchor on body 2 (body-local).
/// - Weld: `[0..3]` anchor on body 2, `[3..6]` anchor on body 1,
///   `[6..10]` relative quaternion (w, x, y, z), `[10]` torque scale.
/// - Joint / Tendon: `[0..5]` polynomial coefficients.
pub const EQ_DATA_SIZE: usize = 11;

/// Static model definition (like mjModel).
///
/// Immutable after [`Model::finalize`]. Arrays are indexed by their
/// respective IDs:
/// - `body_*` arrays indexed by `body_id` (0 = world)
/// - `jnt_*` arrays indexed by `joint_id`
/// - `dof_*` arrays indexed by `dof_id` (velocity dimension index)
/// - `geom_*` arrays indexed by `geom_id`
/// - `tendon_*` arrays indexed by `tendon_id`
/// - `eq_*` arrays indexed by `eq_id`
#[derive(Debug, Clone)]
pub struct Model {
    // ==================== Metadata ====================
    /// Model name.
    pub name: String,

    // ==================== Dimensions ====================
    /// Number of generalized position coordinates (includes quaternions).
    pub nq: usize,
    /// Number of generalized velocity coordinates (DOFs, always <= nq).
    pub nv: usize,
    /// Number of bodies (including world body 0).
    pub nbody: usize,
    /// Number of joints.
    pub njnt: usize,
    /// Number of geoms.
    pub ngeom: usize,
    /// Number of tendons.
    pub ntendon: usize,
    /// Number of tendon wrap entries (joint/coefficient pairs).
    pub nwrap: usize,
    /// Number of equality constraints.
    pub neq: usize,

    // ==================== Body Tree (indexed by body_id, 0 = world) ====================
    /// Parent body index (0 for root bodies attached to world).
    pub body_parent: Vec<usize>,
    /// First joint index for this body in jnt_* arrays.
    pub body_jnt_adr: Vec<usize>,
    /// Number of joints attached to this body.
    pub body_jnt_num: Vec<usize>,
    /// First DOF index for this body.
    pub body_dof_adr: Vec<usize>,
    /// Number of DOFs for this body.
    pub body_dof_num: Vec<usize>,
    /// Position offset from parent frame to body frame.
    pub body_pos: Vec<Vector3<f64>>,
    /// Orientation offset from parent frame to body frame.
    pub body_quat: Vec<UnitQuaternion<f64>>,
    /// Optional body names for lookup.
    pub body_name: Vec<Option<String>>,

    // ==================== Body DOF Chains (computed by finalize) ====================
    /// Start of body `b`'s chain in `body_chain`.
    pub body_chain_adr: Vec<usize>,
    /// Length of body `b`'s chain (number of DOFs that move the body).
    pub body_chain_num: Vec<usize>,
    /// Concatenated, per-body strictly increasing ancestor DOF lists.
    pub body_chain: Vec<usize>,

    // ==================== Joints (indexed by jnt_id) ====================
    /// Joint type (Hinge, Slide, Ball, Free).
    pub jnt_type: Vec<MjJointType>,
    /// Body this joint belongs to (the child body).
    pub jnt_body: Vec<usize>,
    /// Start index in qpos array.
    pub jnt_qpos_adr: Vec<usize>,
    /// Start index in qvel array.
    pub jnt_dof_adr: Vec<usize>,
    /// Joint anchor position in body frame.
    pub jnt_pos: Vec<Vector3<f64>>,
    /// Joint axis for hinge/slide (in body frame, unit length after finalize).
    pub jnt_axis: Vec<Vector3<f64>>,
    /// Whether joint has limits.
    pub jnt_limited: Vec<bool>,
    /// Joint limits `(min, max)`. Ball joints use `max` as the cone angle.
    pub jnt_range: Vec<(f64, f64)>,
    /// Distance from the limit at which the limit row becomes active.
    pub jnt_margin: Vec<f64>,
    /// Optional joint names.
    pub jnt_name: Vec<Option<String>>,

    // ==================== DOFs (indexed by dof_id) ====================
    /// Body moved by this DOF.
    pub dof_body: Vec<usize>,
    /// Joint owning this DOF.
    pub dof_jnt: Vec<usize>,
    /// Parent DOF in the kinematic tree (`None` for DOFs of root joints).
    pub dof_parent: Vec<Option<usize>>,
    /// Dry friction loss; a positive value activates a friction row.
    pub dof_frictionloss: Vec<f64>,

    // ==================== Geoms (indexed by geom_id) ====================
    /// Body this geom is attached to.
    pub geom_body: Vec<usize>,
    /// Geom position in body frame.
    pub geom_pos: Vec<Vector3<f64>>,
    /// Optional geom names.
    pub geom_name: Vec<Option<String>>,

    // ==================== Tendons (indexed by tendon_id) ====================
    /// First wrap entry of the tendon.
    pub tendon_adr: Vec<usize>,
    /// Number of wrap entries of the tendon.
    pub tendon_num: Vec<usize>,
    /// Whether tendon length is limited.
    pub tendon_limited: Vec<bool>,
    /// Tendon length limits `(min, max)`.
    pub tendon_range: Vec<(f64, f64)>,
    /// Distance from the limit at which the limit row becomes active.
    pub tendon_margin: Vec<f64>,
    /// Dry friction loss; a positive value activates a friction row.
    pub tendon_frictionloss: Vec<f64>,
    /// Tendon length at `qpos0` (reference for tendon equality).
    pub tendon_length0: Vec<f64>,
    /// Optional tendon names.
    pub tendon_name: Vec<Option<String>>,
    /// Joint of each wrap entry (hinge or slide).
    pub wrap_jnt: Vec<usize>,
    /// Coefficient of each wrap entry.
    pub wrap_coef: Vec<f64>,

    // ==================== Tendon DOF Patterns (computed by finalize) ====================
    /// Start of tendon `t`'s pattern in `tendon_dofs`.
    pub tendon_dof_adr: Vec<usize>,
    /// Number of DOFs moving tendon `t`.
    pub tendon_dof_num: Vec<usize>,
    /// Concatenated, per-tendon strictly increasing DOF lists.
    pub tendon_dofs: Vec<usize>,

    // ==================== Equality Constraints (indexed by eq_id) ====================
    /// Equality constraint type.
    pub eq_type: Vec<EqualityType>,
    /// First object (body, joint, or tendon id depending on type).
    pub eq_obj1id: Vec<usize>,
    /// Second object. Body 0 (world) for body constraints, `usize::MAX`
    /// when a joint/tendon coupling has no second object.
    pub eq_obj2id: Vec<usize>,
    /// Whether the constraint is active.
    pub eq_active: Vec<bool>,
    /// Per-type parameters, see [`EQ_DATA_SIZE`].
    pub eq_data: Vec<[f64; EQ_DATA_SIZE]>,
    /// Optional equality names.
    pub eq_name: Vec<Option<String>>,

    // ==================== Defaults / Options ====================
    /// Reference configuration (length nq).
    pub qpos0: DVector<f64>,
    /// Constraint assembly options used by [`Data::forward`].
    pub opt: ConstraintOptions,
}

impl Model {
    /// DOFs that move `body_id`, strictly increasing. Empty for the world
    /// and for bodies welded to it.
    #[inline]
    #[must_use]
    pub fn body_chain(&self, body_id: usize) -> &[usize] {
        let adr = self.body_chain_adr[body_id];
        &self.body_chain[adr..adr + self.body_chain_num[body_id]]
    }

    /// DOFs that change the length of tendon `t`, strictly increasing.
    #[inline]
    #[must_use]
    pub fn tendon_dofs(&self, t: usize) -> &[usize] {
        let adr = self.tendon_dof_adr[t];
        &self.tendon_dofs[adr..adr + self.tendon_dof_num[t]]
    }

    /// Look up a body by name.
    #[must_use]
    pub fn body_id(&self, name: &str) -> Option<usize> {
        self.body_name
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Allocate a [`Data`] for this model at `qpos0`.
    #[must_use]
    pub fn make_data(&self) -> Data {
        Data::new(self)
    }
}
