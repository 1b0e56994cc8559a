//! Core constraint assembly engine.
//!
//! This crate provides the MuJoCo-aligned Model/Data architecture for
//! building the constraint Jacobian of an articulated system: equality
//! couplings, friction loss, joint and tendon limits, and contacts. It
//! follows Todorov's design where:
//!
//! - [`Model`] is static (immutable after `finalize`)
//! - [`Data`] is dynamic (qpos/qvel/contacts are the source of truth)
//! - Body poses, tendon lengths and `efc_*` rows are computed from them
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Model                               │
//! │  Static: kinematic tree, joints, tendons, equalities        │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Data                               │
//! │  qpos, qvel → FK → xpos, xquat, cdof, ten_J                 │
//! │  + contacts → mj_make_constraint → efc_J, efc_pos, ...      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Jacobian is stored dense (`nefc × nv`) or row-sparse. Sparse rows
//! hold exactly the DOFs that can move the constrained objects, counted
//! before any value is written, so storage is allocated once at its exact
//! size.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless training loops
//! - Hardware control code
//! - Analysis tools
//! - Other engines
//!
//! # Quick Start
//!
//! ```
//! use sim_core::{ConstraintOptions, Contact, Model};
//! use nalgebra::Vector3;
//!
//! let model = Model::hinge_chain(3)?;
//! let mut data = model.make_data();
//! data.qpos[0] = 0.2;
//! // Geom of link 1 touching the geom of link 3.
//! data.contacts.push(Contact::new(Vector3::zeros(), Vector3::z(), -0.01, 0, 2, 1.0));
//!
//! data.forward_with(&model, &ConstraintOptions::sparse())?;
//! for i in 0..data.nefc {
//!     println!("{:?} pos={}", data.efc_type[i], data.efc_pos[i]);
//! }
//! # Ok::<(), sim_core::SimError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-core/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x >= 0.0) is intentional for NaN rejection
    clippy::too_many_lines,             // Assembly functions naturally have many steps
    clippy::doc_markdown,               // Not all technical terms need backticks
    clippy::many_single_char_names,     // Quaternion and Jacobian math
)]

// Core type definitions (enums, Model, Data, contacts, factories)
pub mod types;

// Sparse index merging
pub mod linalg;

// Forward kinematics
pub mod forward;

// Fixed tendon length and Jacobian
pub mod tendon;

// Point and pair Jacobians, position integration
pub mod jacobian;

// Constraint activation and Jacobian assembly
pub mod constraint;

pub use constraint::{
    ConstraintInstance, ConstraintJacobian, JacobianRow, RowView, SparseConstraintJacobian,
    collect_active_constraints, mj_make_constraint,
};
pub use forward::mj_fwd_position;
pub use jacobian::{DofLayout, PairJacobian, PointJacobian, mj_integrate_pos, mj_jac, mj_jac_dif_pair, mj_jac_sparse};
pub use linalg::{combine_sparse, combine_sparse_count, combine_sparse_indices};

pub use types::{
    ConstraintFixture, ConstraintType, Contact, Data, EQ_DATA_SIZE, EqualityType, LimitSide,
    MjJointType, Model, NO_OBJECT, compute_tangent_frame,
};

// Re-export key types from sim-types for convenience
pub use sim_types::{AUTO_SPARSE_NV, ConeType, ConstraintOptions, JacobianType, SimError};
