//! Tendon kinematics: length and Jacobian computations.
//!
//! Only fixed (joint-space) tendons are supported. Corresponds to the
//! tendon section of MuJoCo's `engine_core_smooth.c`.

pub(crate) mod fixed;

pub use fixed::mj_fwd_tendon_fixed;

use crate::types::{Data, Model};

/// Compute tendon lengths and Jacobians from current joint state.
///
/// Called from `mj_fwd_position()` after body poses.
pub(crate) fn mj_fwd_tendon(model: &Model, data: &mut Data) {
    for t in 0..model.ntendon {
        mj_fwd_tendon_fixed(model, data, t);
    }
}
