//! Orientation residual of two body frames and its velocity Jacobian.
//!
//! The residual of a weld is the imaginary part of the relative rotation
//! `conj(q_ref) ⊗ q_cur`. For small errors it is half the rotation vector,
//! which is why its Jacobian carries a factor of `0.5`:
//!
//! ```text
//! d/dt imag(conj(q_ref) ⊗ q_cur) = 0.5 · imag(conj(q_ref) ⊗ (ω_cur − ω_ref) ⊗ q_cur)
//! ```
//!
//! with `ω` the world-frame angular velocities. Corresponds to the weld
//! branch of MuJoCo's `mj_instantiateEquality`.

use nalgebra::{Matrix3xX, Quaternion, UnitQuaternion, Vector3};

/// Orientation residual `imag(conj(q_reference) ⊗ q_current)`.
///
/// Zero when the frames coincide; equal to `sin(θ/2)·axis` for a relative
/// rotation of `θ` about `axis` (expressed in the reference frame).
#[inline]
#[must_use]
pub fn orientation_residual(
    q_current: &UnitQuaternion<f64>,
    q_reference: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    let rel = q_reference.conjugate().into_inner() * q_current.into_inner();
    rel.imag()
}

/// `q ⊗ (0, axis)`: multiply a quaternion by a pure-vector quaternion.
#[inline]
#[must_use]
pub fn mul_quat_axis(q: &Quaternion<f64>, axis: &Vector3<f64>) -> Quaternion<f64> {
    q * Quaternion::from_imag(*axis)
}

/// Rotational Jacobian of [`orientation_residual`].
///
/// `jacdif_r` is the 3×n rotational Jacobian difference `jac(current) −
/// jac(reference)`; each column is mapped to
/// `0.5 · imag(conj(q_reference) ⊗ column ⊗ q_current)`. The column layout
/// (dense or sparse) is preserved.
#[must_use]
pub fn orientation_jacobian(
    q_current: &UnitQuaternion<f64>,
    q_reference: &UnitQuaternion<f64>,
    jacdif_r: &Matrix3xX<f64>,
) -> Matrix3xX<f64> {
    let neg_ref = q_reference.conjugate().into_inner();
    let cur = q_current.into_inner();
    let mut out = Matrix3xX::zeros(jacdif_r.ncols());
    for (k, col) in jacdif_r.column_iter().enumerate() {
        let axis = Vector3::new(col[0], col[1], col[2]);
        let q = mul_quat_axis(&neg_ref, &axis) * cur;
        out.set_column(k, &(0.5 * q.imag()));
    }
    out
}

/// Rotation vector (axis · angle) of a unit quaternion, angle in `[0, π]`.
///
/// The double cover is resolved by flipping to `w >= 0`. Identity gives the
/// zero vector.
#[must_use]
pub fn quat_to_rotvec(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let mut quat = q.into_inner();
    if quat.w < 0.0 {
        quat = -quat;
    }
    let sin_half = quat.imag().norm();
    if sin_half < 1e-15 {
        return Vector3::zeros();
    }
    let angle = 2.0 * sin_half.atan2(quat.w);
    quat.imag() * (angle / sin_half)
}

/// Normalize `v`, returning the unit vector and the original length.
///
/// A zero-length (or non-finite) input yields `(x̂, 0.0)` instead of NaN.
#[inline]
#[must_use]
pub fn normalize_axis(v: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let norm = v.norm();
    if norm.is_finite() && norm > 1e-15 {
        (v / norm, norm)
    } else {
        (Vector3::x(), 0.0)
    }
}
