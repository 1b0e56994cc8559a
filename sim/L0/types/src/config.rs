//! Configuration types for constraint assembly.
//!
//! This module provides the options that control how the constraint
//! Jacobian is assembled: dense or sparse storage, friction cone shape,
//! and which constraint families are instantiated at all.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// DOF count at which [`JacobianType::Auto`] switches to sparse storage.
///
/// Matches MuJoCo's `mjJAC_AUTO` heuristic.
pub const AUTO_SPARSE_NV: usize = 60;

/// Storage selected for the constraint Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JacobianType {
    /// Full `nefc × nv` matrix.
    Dense,
    /// Compressed rows holding only the DOFs that influence each constraint.
    Sparse,
    /// Sparse when `nv >= AUTO_SPARSE_NV`, dense otherwise.
    #[default]
    Auto,
}

/// Friction cone used when expanding contacts into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConeType {
    /// Pyramidal approximation: `2·(dim−1)` rows per contact.
    #[default]
    Pyramidal,
    /// Elliptic cone: `dim` rows per contact.
    Elliptic,
}

/// Options for one constraint assembly pass.
///
/// Passed explicitly to `mj_make_constraint`; never read from global state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintOptions {
    /// Jacobian storage.
    pub jacobian: JacobianType,
    /// Contact friction cone.
    pub cone: ConeType,
    /// Skip equality constraints.
    pub disable_equality: bool,
    /// Skip DOF and tendon friction loss.
    pub disable_frictionloss: bool,
    /// Skip joint and tendon limits.
    pub disable_limit: bool,
    /// Skip contacts.
    pub disable_contact: bool,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            jacobian: JacobianType::Auto,
            cone: ConeType::Pyramidal,
            disable_equality: false,
            disable_frictionloss: false,
            disable_limit: false,
            disable_contact: false,
        }
    }
}

impl ConstraintOptions {
    /// Dense Jacobian, everything else default.
    #[must_use]
    pub fn dense() -> Self {
        Self {
            jacobian: JacobianType::Dense,
            ..Default::default()
        }
    }

    /// Sparse Jacobian, everything else default.
    #[must_use]
    pub fn sparse() -> Self {
        Self {
            jacobian: JacobianType::Sparse,
            ..Default::default()
        }
    }

    /// Set the Jacobian storage.
    #[must_use]
    pub fn jacobian(mut self, jacobian: JacobianType) -> Self {
        self.jacobian = jacobian;
        self
    }

    /// Set the friction cone.
    #[must_use]
    pub fn cone(mut self, cone: ConeType) -> Self {
        self.cone = cone;
        self
    }

    /// Disable equality constraints.
    #[must_use]
    pub fn without_equality(mut self) -> Self {
        self.disable_equality = true;
        self
    }

    /// Disable friction loss rows.
    #[must_use]
    pub fn without_frictionloss(mut self) -> Self {
        self.disable_frictionloss = true;
        self
    }

    /// Disable limit rows.
    #[must_use]
    pub fn without_limits(mut self) -> Self {
        self.disable_limit = true;
        self
    }

    /// Disable contact rows.
    #[must_use]
    pub fn without_contacts(mut self) -> Self {
        self.disable_contact = true;
        self
    }

    /// Resolve the storage for a model with `nv` DOFs.
    #[must_use]
    pub fn is_sparse(&self, nv: usize) -> bool {
        match self.jacobian {
            JacobianType::Dense => false,
            JacobianType::Sparse => true,
            JacobianType::Auto => nv >= AUTO_SPARSE_NV,
        }
    }

    /// Validate the configuration.
    ///
    /// Every combination of the current options is meaningful except
    /// disabling every constraint family at once, which always yields an
    /// empty Jacobian and is almost certainly a mistake.
    pub fn validate(&self) -> crate::Result<()> {
        if self.disable_equality
            && self.disable_frictionloss
            && self.disable_limit
            && self.disable_contact
        {
            return Err(crate::SimError::invalid_config(
                "all constraint families are disabled",
            ));
        }
        Ok(())
    }
}
