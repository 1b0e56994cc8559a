//! Core data types shared by the constraint pipeline.
//!
//! This crate provides the foundational, behavior-free types used by
//! `sim-core` when assembling constraint Jacobians:
//!
//! - [`ConstraintOptions`] - Dense/sparse selector, friction cone, disable switches
//! - [`JacobianType`] - Jacobian storage selector (dense, sparse, auto)
//! - [`ConeType`] - Contact friction cone (pyramidal or elliptic)
//! - [`SimError`] - Error type for model construction and assembly
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless training loops
//! - Hardware control code
//! - Analysis tools
//! - Other engines
//!
//! # Example
//!
//! ```
//! use sim_types::{ConstraintOptions, JacobianType};
//!
//! let opt = ConstraintOptions::default().jacobian(JacobianType::Sparse);
//! assert!(opt.validate().is_ok());
//! assert!(opt.is_sparse(3));
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Builder methods read better as plain fns
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod config;
mod error;

pub use config::{ConeType, ConstraintOptions, JacobianType, AUTO_SPARSE_NV};
pub use error::SimError;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
