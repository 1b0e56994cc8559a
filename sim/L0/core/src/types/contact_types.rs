//! Contact type consumed by constraint assembly.
//!
//! Contacts are produced by an external collision stage and pushed into
//! [`Data::contacts`](super::Data::contacts). This module only defines the
//! record and the [`compute_tangent_frame`] helper.

use nalgebra::Vector3;
use sim_types::SimError;

/// Contact point for constraint generation.
///
/// Matches the fields of MuJoCo's `mjContact` that the Jacobian needs.
#[derive(Debug, Clone)]
pub struct Contact {
    /// Contact position in world frame.
    pub pos: Vector3<f64>,
    /// Contact normal (from geom1 toward geom2, unit vector).
    pub normal: Vector3<f64>,
    /// Tangent directions `[t1, t2]`; `(normal, t1, t2)` is right-handed.
    pub frame: [Vector3<f64>; 2],
    /// Signed distance (negative = penetrating).
    pub dist: f64,
    /// First geometry ID.
    pub geom1: usize,
    /// Second geometry ID.
    pub geom2: usize,
    /// Contact dimension: 1 (frictionless), 3 (sliding), 4 (+torsional), 6 (+rolling).
    pub(crate) dim: usize,
    /// `[sliding1, sliding2, torsional, rolling1, rolling2]`.
    pub(crate) mu: [f64; 5],
    /// The contact is instantiated only when `dist < includemargin`.
    pub includemargin: f64,
}

impl Contact {
    /// Create a contact with isotropic sliding friction.
    ///
    /// `dim` is 3 when `friction > 0`, else 1. Negative or NaN friction is
    /// clamped to 0, NaN distance to 0.
    #[must_use]
    pub fn new(
        pos: Vector3<f64>,
        normal: Vector3<f64>,
        dist: f64,
        geom1: usize,
        geom2: usize,
        friction: f64,
    ) -> Self {
        let friction = sanitize(friction);
        let condim = if friction > 0.0 { 3 } else { 1 };
        Self::with_condim(pos, normal, dist, geom1, geom2, friction, 0.0, 0.0, condim)
    }

    /// Create a contact with explicit condim and per-type friction.
    ///
    /// Invalid `condim` values are rounded up to the next valid dimension
    /// (0 and 2 become 3, 5 and above become 6).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn with_condim(
        pos: Vector3<f64>,
        normal: Vector3<f64>,
        dist: f64,
        geom1: usize,
        geom2: usize,
        sliding: f64,
        torsional: f64,
        rolling: f64,
        condim: usize,
    ) -> Self {
        let (sliding, torsional, rolling) = (sanitize(sliding), sanitize(torsional), sanitize(rolling));
        let dist = if dist.is_finite() { dist } else { 0.0 };

        #[allow(clippy::match_same_arms)]
        let dim = match condim {
            1 => 1,
            0 | 2 | 3 => 3,
            4 => 4,
            _ => 6,
        };

        let normal_len = normal.norm();
        let normal = if normal_len.is_finite() && normal_len > 1e-10 {
            normal / normal_len
        } else {
            Vector3::z()
        };
        let (t1, t2) = compute_tangent_frame(&normal);

        Self {
            pos,
            normal,
            frame: [t1, t2],
            dist,
            geom1,
            geom2,
            dim,
            mu: [sliding, sliding, torsional, rolling, rolling],
            includemargin: 0.0,
        }
    }

    /// Set the activation margin.
    #[must_use]
    pub fn with_margin(mut self, includemargin: f64) -> Self {
        self.includemargin = includemargin;
        self
    }

    /// Contact dimension, one of 1, 3, 4 or 6.
    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Friction coefficients `[sliding1, sliding2, torsional, rolling1, rolling2]`.
    #[inline]
    #[must_use]
    pub fn mu(&self) -> &[f64; 5] {
        &self.mu
    }

    /// Check this contact against a model with `ngeom` geoms.
    ///
    /// `index` is the contact's position in the contact list and is only
    /// used in the error.
    pub fn validate(&self, index: usize, ngeom: usize) -> Result<(), SimError> {
        for (name, geom) in [("geom1", self.geom1), ("geom2", self.geom2)] {
            if geom >= ngeom {
                return Err(SimError::invalid_contact(
                    index,
                    format!("{name} = {geom} out of range for ngeom={ngeom}"),
                ));
            }
        }
        if !matches!(self.dim, 1 | 3 | 4 | 6) {
            return Err(SimError::invalid_contact(
                index,
                format!("dim = {} not in {{1, 3, 4, 6}}", self.dim),
            ));
        }
        if let Some(mu) = self.mu.iter().find(|mu| !mu.is_finite() || **mu < 0.0) {
            return Err(SimError::invalid_contact(index, format!("friction coefficient {mu}")));
        }
        if !self.includemargin.is_finite() {
            return Err(SimError::invalid_contact(index, "non-finite includemargin"));
        }
        Ok(())
    }

    /// Frame axis `k` of the contact: 0 = normal, 1 = t1, 2 = t2.
    #[inline]
    #[must_use]
    pub fn axis(&self, k: usize) -> Vector3<f64> {
        match k {
            0 => self.normal,
            1 => self.frame[0],
            _ => self.frame[1],
        }
    }
}

fn sanitize(mu: f64) -> f64 {
    if mu.is_finite() && mu > 0.0 { mu } else { 0.0 }
}

/// Compute orthonormal tangent frame from contact normal.
///
/// Returns (t1, t2) where t1, t2, normal form a right-handed orthonormal basis.
/// Degenerate (zero/NaN) normals get the default `x̂, ŷ` frame.
#[inline]
#[must_use]
pub fn compute_tangent_frame(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let normal_len = normal.norm();
    if !normal_len.is_finite() || normal_len < 1e-10 {
        return (Vector3::x(), Vector3::y());
    }
    let n = normal / normal_len;

    // Reference vector not parallel to the normal.
    let reference = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };

    let t1 = reference - n * n.dot(&reference);
    let t1_norm = t1.norm();
    let t1 = if t1_norm > 1e-10 { t1 / t1_norm } else { Vector3::x() };
    let t2 = n.cross(&t1);
    (t1, t2)
}
