//! Integration tests for constraint Jacobian assembly.
//!
//! These tests verify end-to-end behavior of `sim-core`:
//! - Weld rotational rows against finite differences
//! - Connect, joint and tendon equality rows against finite differences
//! - Contact frame projection and friction cone expansion
//! - Dense/sparse equivalence and exact sparse preallocation on fixtures
//!   whose constraints have no DOFs
//! - Sorted index union counting

pub mod contact_rows;
pub mod equality_rows;
pub mod jacobian_preallocate;
pub mod sparse_merge;
pub mod weld_jacobian;
