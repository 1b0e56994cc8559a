//! Core type definitions for constraint assembly.
//!
//! This module contains the fundamental types that flow through every stage of
//! the pipeline: enums, Model, Data, contacts, and test model factories.

pub(crate) mod contact_types;
pub(crate) mod data;
pub(crate) mod enums;
pub(crate) mod model;
pub(crate) mod model_factories;
pub(crate) mod model_init;

pub use contact_types::{Contact, compute_tangent_frame};
pub use data::Data;
pub use enums::*;
pub use model::{EQ_DATA_SIZE, Model};
pub use model_factories::ConstraintFixture;
pub use model_init::NO_OBJECT;
