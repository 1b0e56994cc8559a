//! Factory methods for canonical constraint test systems.
//!
//! These constructors produce finalized [`Model`] instances that exercise
//! the corner cases of constraint assembly: constraints whose bodies or
//! tendons have no DOFs, bilateral limits inside a margin, and a mixed
//! ball/hinge system for checking rotational Jacobians. Used by inline
//! tests, the `sim-conformance-tests` crate and the benchmarks.

use nalgebra::{UnitQuaternion, Vector3};
use sim_types::SimError;

use super::contact_types::Contact;
use super::data::Data;
use super::enums::MjJointType;
use super::model::Model;

/// Constraint systems with known row counts.
///
/// Each fixture builds a model and, where relevant, the contacts a collision
/// stage would report for it at `qpos0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintFixture {
    /// Contacts between the world, a static body and a free body.
    DoflessContact,
    /// Friction loss on an empty tendon and on a hinge tendon.
    DoflessTendonFrictional,
    /// Empty tendon violating its lower limit.
    DoflessTendonLimited,
    /// Empty tendon inside both limit margins.
    DoflessTendonLimitedMargin,
    /// Static body welded to the world.
    DoflessWeld,
    /// Hinge whose margin exceeds half its range.
    JointLimitedBilateralMargin,
    /// Two-hinge tendon whose margin exceeds half its range.
    TendonLimitedBilateralMargin,
}

impl ConstraintFixture {
    /// Every fixture.
    pub const ALL: [Self; 7] = [
        Self::DoflessContact,
        Self::DoflessTendonFrictional,
        Self::DoflessTendonLimited,
        Self::DoflessTendonLimitedMargin,
        Self::DoflessWeld,
        Self::JointLimitedBilateralMargin,
        Self::TendonLimitedBilateralMargin,
    ];

    /// Snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DoflessContact => "dofless_contact",
            Self::DoflessTendonFrictional => "dofless_tendon_frictional",
            Self::DoflessTendonLimited => "dofless_tendon_limited",
            Self::DoflessTendonLimitedMargin => "dofless_tendon_limitedmargin",
            Self::DoflessWeld => "dofless_weld",
            Self::JointLimitedBilateralMargin => "joint_limited_bilateral_margin",
            Self::TendonLimitedBilateralMargin => "tendon_limited_bilateral_margin",
        }
    }

    /// Rows assembled at `qpos0` with the pyramidal cone.
    #[must_use]
    pub fn expected_nefc(self) -> usize {
        match self {
            Self::DoflessContact => 8,
            Self::DoflessTendonFrictional
            | Self::DoflessTendonLimitedMargin
            | Self::JointLimitedBilateralMargin
            | Self::TendonLimitedBilateralMargin => 2,
            Self::DoflessTendonLimited => 1,
            Self::DoflessWeld => 6,
        }
    }

    /// Build the finalized model.
    ///
    /// # Errors
    ///
    /// Propagates [`Model::finalize`] errors.
    pub fn build(self) -> Result<Model, SimError> {
        let mut m = Model::empty();
        m.name = self.name().to_string();
        match self {
            Self::DoflessContact => {
                m.add_geom(0, Vector3::zeros(), Some("floor"));
                let fixed = m.add_body(0, Vector3::new(-1.0, 0.0, 0.1), UnitQuaternion::identity(), Some("fixed"));
                m.add_geom(fixed, Vector3::zeros(), Some("fixed_box"));
                let free = m.add_body(0, Vector3::new(1.0, 0.0, 0.1), UnitQuaternion::identity(), Some("free"));
                m.add_joint(free, MjJointType::Free, Vector3::zeros(), Vector3::z());
                m.add_geom(free, Vector3::zeros(), Some("free_box"));
            }
            Self::DoflessTendonFrictional => {
                let jnt = hinge_body(&mut m);
                let empty = m.add_fixed_tendon(&[]);
                m.tendon_frictionloss[empty] = 0.1;
                let t = m.add_fixed_tendon(&[(jnt, 1.0)]);
                m.tendon_frictionloss[t] = 0.2;
            }
            Self::DoflessTendonLimited => {
                hinge_body(&mut m);
                let t = m.add_fixed_tendon(&[]);
                m.set_tendon_limits(t, 0.5, 1.0, 0.0);
            }
            Self::DoflessTendonLimitedMargin => {
                hinge_body(&mut m);
                let t = m.add_fixed_tendon(&[]);
                m.set_tendon_limits(t, -0.1, 0.1, 0.2);
            }
            Self::DoflessWeld => {
                hinge_body(&mut m);
                let fixed = m.add_body(0, Vector3::new(0.0, 0.0, 1.0), UnitQuaternion::identity(), Some("fixed"));
                m.add_weld(fixed, 0, Vector3::zeros(), None, 1.0);
            }
            Self::JointLimitedBilateralMargin => {
                let b = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
                let hinge = m.add_joint(b, MjJointType::Hinge, Vector3::zeros(), Vector3::y());
                m.set_joint_limits(hinge, -0.1, 0.1, 0.2);
                let slide = m.add_joint(b, MjJointType::Slide, Vector3::zeros(), Vector3::x());
                m.set_joint_limits(slide, -1.0, 1.0, 0.5);
            }
            Self::TendonLimitedBilateralMargin => {
                let b1 = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
                let j1 = m.add_joint(b1, MjJointType::Hinge, Vector3::zeros(), Vector3::y());
                let b2 = m.add_body(b1, Vector3::new(0.0, 0.0, -1.0), UnitQuaternion::identity(), None);
                let j2 = m.add_joint(b2, MjJointType::Hinge, Vector3::zeros(), Vector3::y());
                let t = m.add_fixed_tendon(&[(j1, 1.0), (j2, -1.0)]);
                m.set_tendon_limits(t, -0.1, 0.1, 0.2);
            }
        }
        m.finalize()?;
        Ok(m)
    }

    /// Contacts a collision stage would report at `qpos0`.
    ///
    /// Only [`ConstraintFixture::DoflessContact`] has any. `data` must hold
    /// current kinematics.
    #[must_use]
    pub fn contacts(self, model: &Model, data: &Data) -> Vec<Contact> {
        if self != Self::DoflessContact {
            return Vec::new();
        }
        let up = Vector3::z();
        let fixed = data.geom_xpos[1] - Vector3::new(0.0, 0.0, 0.1);
        let free = data.geom_xpos[2] - Vector3::new(0.0, 0.0, 0.1);
        debug_assert_eq!(model.ngeom, 3);
        vec![
            // Static body on the floor: both sides dofless.
            Contact::new(fixed, up, -0.01, 0, 1, 1.0),
            Contact::new(free, up, -0.001, 0, 2, 0.5),
            // Separated beyond the margin.
            Contact::new(free + Vector3::x(), up, 0.05, 0, 2, 1.0),
        ]
    }
}

/// Body with a single hinge about y, so the model has `nv > 0`. Returns
/// the joint id.
fn hinge_body(m: &mut Model) -> usize {
    let b = m.add_body(0, Vector3::new(0.0, 0.0, -1.0), UnitQuaternion::identity(), Some("hinged"));
    m.add_joint(b, MjJointType::Hinge, Vector3::zeros(), Vector3::y())
}

impl Model {
    /// Ball-jointed body beside a body with three offset hinges (x, y, z).
    ///
    /// `nq = 7`, `nv = 6`. Both bodies are children of the world, so their
    /// Jacobians have disjoint DOF patterns.
    ///
    /// # Errors
    ///
    /// Propagates [`Model::finalize`] errors.
    pub fn ball_and_hinges() -> Result<Self, SimError> {
        let mut m = Self::empty();
        m.name = "ball_and_hinges".to_string();
        let ball = m.add_body(0, Vector3::zeros(), UnitQuaternion::identity(), None);
        m.add_joint(ball, MjJointType::Ball, Vector3::zeros(), Vector3::z());
        m.add_geom(ball, Vector3::zeros(), None);

        let hinged = m.add_body(0, Vector3::new(0.5, 0.0, 0.0), UnitQuaternion::identity(), None);
        m.add_joint(hinged, MjJointType::Hinge, Vector3::new(0.0, 0.0, 0.01), Vector3::x());
        m.add_joint(hinged, MjJointType::Hinge, Vector3::new(0.02, 0.0, 0.0), Vector3::y());
        m.add_joint(hinged, MjJointType::Hinge, Vector3::new(0.0, 0.03, 0.0), Vector3::z());
        m.add_geom(hinged, Vector3::zeros(), None);
        m.finalize()?;
        Ok(m)
    }

    /// Serial chain of `n` hinge links along -z, each with a geom at its tip,
    /// and the last link connected back to the world.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidModel`] if `n` is 0.
    pub fn hinge_chain(n: usize) -> Result<Self, SimError> {
        if n == 0 {
            return Err(SimError::invalid_model("hinge chain needs at least one link"));
        }
        let mut m = Self::empty();
        m.name = format!("hinge_chain_{n}");
        let mut parent = 0;
        for i in 0..n {
            let offset = if i == 0 { Vector3::zeros() } else { Vector3::new(0.0, 0.0, -1.0) };
            let b = m.add_body(parent, offset, UnitQuaternion::identity(), None);
            let axis = if i % 2 == 0 { Vector3::y() } else { Vector3::x() };
            let j = m.add_joint(b, MjJointType::Hinge, Vector3::zeros(), axis);
            m.set_joint_limits(j, -1.0, 1.0, 1.5);
            m.add_geom(b, Vector3::new(0.0, 0.0, -1.0), None);
            parent = b;
        }
        m.add_connect(parent, 0, Vector3::new(0.0, 0.0, -1.0));
        m.finalize()?;
        Ok(m)
    }
}
