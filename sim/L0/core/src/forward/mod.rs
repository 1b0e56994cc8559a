//! Forward pipeline: kinematics followed by constraint assembly.
//!
//! Implements [`Data::forward`]. Corresponds to the position half of
//! MuJoCo's `mj_fwdPosition` in `engine_forward.c`.

mod position;

pub use position::mj_fwd_position;
pub(crate) use position::qpos_quat;

use sim_types::{ConstraintOptions, SimError};

use crate::constraint::mj_make_constraint;
use crate::types::{Data, Model};

impl Data {
    /// Recompute kinematics, tendons and the constraint Jacobian from
    /// `qpos`, `qvel` and `contacts`, using `model.opt`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DimensionMismatch`] if `qpos`/`qvel` do not match
    /// the model, [`SimError::InvalidContact`] for a contact inconsistent
    /// with the model, or [`SimError::InvalidConfig`] for invalid options.
    pub fn forward(&mut self, model: &Model) -> Result<(), SimError> {
        self.forward_with(model, &model.opt)
    }

    /// Like [`Data::forward`] with explicit constraint options.
    ///
    /// # Errors
    ///
    /// Same as [`Data::forward`].
    pub fn forward_with(
        &mut self,
        model: &Model,
        options: &ConstraintOptions,
    ) -> Result<(), SimError> {
        options.validate()?;
        check_dimensions(model, self)?;
        mj_fwd_position(model, self);
        mj_make_constraint(model, self, options)
    }
}

pub(crate) fn check_dimensions(model: &Model, data: &Data) -> Result<(), SimError> {
    if data.qpos.len() != model.nq {
        return Err(SimError::dimension_mismatch("qpos", model.nq, data.qpos.len()));
    }
    if data.qvel.len() != model.nv {
        return Err(SimError::dimension_mismatch("qvel", model.nv, data.qvel.len()));
    }
    Ok(())
}

/// Validate every contact in `data.contacts` against the model.
pub(crate) fn check_contacts(model: &Model, data: &Data) -> Result<(), SimError> {
    data.contacts
        .iter()
        .enumerate()
        .try_for_each(|(i, c)| c.validate(i, model.ngeom))
}
