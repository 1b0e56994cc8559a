//! Constraint system: activation, row construction and Jacobian assembly.
//!
//! Turns the current kinematic state into the constraint Jacobian `efc_J`
//! and its row metadata. Corresponds to MuJoCo's
//! `engine_core_constraint.c` (`mj_makeConstraint` and the per-type
//! instantiation helpers).
//!
//! - [`instance`]: which constraints are active and how many rows and
//!   nonzeros each one produces
//! - [`equality`], [`jacobian`]: rows of equality and contact constraints
//! - [`orientation`]: quaternion residual and rotational Jacobian for welds
//! - [`row`]: dense and sparse Jacobian storage
//! - [`assembly`]: the three-phase driver [`mj_make_constraint`]

pub mod assembly;
pub mod equality;
pub mod instance;
pub mod jacobian;
pub mod orientation;
pub mod row;

pub use assembly::{ConstraintBlock, constraint_block, mj_make_constraint};
pub use instance::{ConstraintInstance, collect_active_constraints};
pub use orientation::{mul_quat_axis, orientation_jacobian, orientation_residual};
pub use row::{
    ConstraintJacobian, DenseRow, JacobianRow, RowView, SparseConstraintJacobian, SparseRow,
};
