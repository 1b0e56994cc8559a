//! Enums shared across the pipeline: joint kinds, equality kinds, and
//! constraint row tags.

/// Joint type following `MuJoCo` conventions.
///
/// Named `MjJointType` to distinguish from `sim_types::JointType`-style
/// high-level joint descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MjJointType {
    /// Hinge joint (1 DOF): rotation about a single axis.
    /// qpos: 1 scalar (angle in radians)
    /// qvel: 1 scalar (angular velocity)
    #[default]
    Hinge,
    /// Slide joint (1 DOF): translation along a single axis.
    /// qpos: 1 scalar (displacement)
    /// qvel: 1 scalar (linear velocity)
    Slide,
    /// Ball joint (3 DOF): free rotation (spherical).
    /// qpos: 4 scalars (unit quaternion w, x, y, z)
    /// qvel: 3 scalars (angular velocity, body frame)
    Ball,
    /// Free joint (6 DOF): floating body with no constraints.
    /// qpos: 7 scalars (position x,y,z + quaternion w,x,y,z)
    /// qvel: 6 scalars (linear velocity world frame + angular velocity body frame)
    Free,
}

impl MjJointType {
    /// Number of position coordinates (nq contribution).
    #[must_use]
    pub const fn nq(self) -> usize {
        match self {
            Self::Hinge | Self::Slide => 1,
            Self::Ball => 4, // quaternion
            Self::Free => 7, // pos + quat
        }
    }

    /// Number of velocity coordinates / DOFs (nv contribution).
    #[must_use]
    pub const fn nv(self) -> usize {
        match self {
            Self::Hinge | Self::Slide => 1,
            Self::Ball => 3, // angular velocity
            Self::Free => 6, // linear + angular velocity
        }
    }

    /// Whether this joint type uses quaternion representation.
    #[must_use]
    pub const fn uses_quaternion(self) -> bool {
        matches!(self, Self::Ball | Self::Free)
    }
}

/// Equality constraint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualityType {
    /// Ball coupling: an anchor on body 1 coincides with an anchor on body 2.
    /// 3 rows.
    Connect,
    /// Weld: position and orientation of two body frames coincide. 6 rows.
    Weld,
    /// Joint coupling: `q1 = poly(q2)`. 1 row.
    Joint,
    /// Tendon coupling: `L1 = poly(L2)`. 1 row.
    Tendon,
}

impl EqualityType {
    /// Number of constraint rows contributed when active.
    #[must_use]
    pub const fn nrow(self) -> usize {
        match self {
            Self::Connect => 3,
            Self::Weld => 6,
            Self::Joint | Self::Tendon => 1,
        }
    }
}

/// Tag carried by every row of the constraint Jacobian (`efc_type`).
///
/// The solver interprets rows differently by type; the Jacobian itself is
/// built the same way for e.g. a tendon limit and a tendon friction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    /// Equality constraint row.
    Equality,
    /// DOF friction loss.
    FrictionDof,
    /// Tendon friction loss.
    FrictionTendon,
    /// Joint limit.
    LimitJoint,
    /// Tendon limit.
    LimitTendon,
    /// Frictionless contact (dim = 1).
    ContactFrictionless,
    /// Pyramidal friction cone facet.
    ContactPyramidal,
    /// Elliptic friction cone component.
    ContactElliptic,
}

/// Which side of a two-sided range a limit row enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSide {
    /// Lower bound: row pushes the coordinate up (`J = +∂q`).
    Lower,
    /// Upper bound: row pushes the coordinate down (`J = −∂q`).
    Upper,
}

impl LimitSide {
    /// Sign applied to the coordinate gradient for this side.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Lower => 1.0,
            Self::Upper => -1.0,
        }
    }
}
