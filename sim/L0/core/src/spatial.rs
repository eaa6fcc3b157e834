//! Spatial algebra for 6D motion and force vectors.
//!
//! Featherstone's operators, written generically so that the same code runs
//! on `f64` and on the recording scalar. Vectors are split into a linear and
//! an angular part, matching the `[v, ω]` order of the floating-base state:
//!
//! - Motion vectors: `(v, ω)` (velocity of the frame origin, angular velocity)
//! - Force vectors: `(f, n)` (force, moment about the frame origin)

use std::ops::{Add, Sub};

use fbm_ad::Real;
use nalgebra::{Matrix3, Vector3};

/// 6D spatial vector: linear part and angular part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialVector<T> {
    /// Linear velocity / force.
    pub linear: Vector3<T>,
    /// Angular velocity / moment.
    pub angular: Vector3<T>,
}

impl<T: Real> SpatialVector<T> {
    /// Build from parts.
    #[must_use]
    pub fn new(linear: Vector3<T>, angular: Vector3<T>) -> Self {
        Self { linear, angular }
    }

    /// Zero vector.
    #[must_use]
    pub fn zeros() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Scale both parts.
    #[must_use]
    pub fn scale(&self, s: T) -> Self {
        Self::new(self.linear * s, self.angular * s)
    }

    /// Flatten to `[linear, angular]`.
    #[must_use]
    pub fn to_array(&self) -> [T; 6] {
        [
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        ]
    }
}

impl<T: Real> Add for SpatialVector<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.linear + rhs.linear, self.angular + rhs.angular)
    }
}

impl<T: Real> Sub for SpatialVector<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.linear - rhs.linear, self.angular - rhs.angular)
    }
}

/// Spatial cross product for motion vectors: `v × s`.
#[inline]
#[must_use]
pub fn spatial_cross_motion<T: Real>(v: &SpatialVector<T>, s: &SpatialVector<T>) -> SpatialVector<T> {
    SpatialVector::new(
        v.angular.cross(&s.linear) + v.linear.cross(&s.angular),
        v.angular.cross(&s.angular),
    )
}

/// Spatial cross product for force vectors: `v ×* f`.
#[inline]
#[must_use]
pub fn spatial_cross_force<T: Real>(v: &SpatialVector<T>, f: &SpatialVector<T>) -> SpatialVector<T> {
    SpatialVector::new(
        v.angular.cross(&f.linear),
        v.angular.cross(&f.angular) + v.linear.cross(&f.linear),
    )
}

/// Rigid-body inertia about a frame origin: mass, center of mass, and
/// rotational inertia about the center of mass, all in that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia<T> {
    /// Mass.
    pub mass: T,
    /// Center of mass.
    pub com: Vector3<T>,
    /// Rotational inertia about the center of mass.
    pub inertia_com: Matrix3<T>,
}

impl<T: Real> SpatialInertia<T> {
    /// Lift a constant `f64` inertia.
    #[must_use]
    pub fn from_f64(mass: f64, com: &Vector3<f64>, inertia_com: &Matrix3<f64>) -> Self {
        Self {
            mass: T::from_f64(mass),
            com: com.map(T::from_f64),
            inertia_com: inertia_com.map(T::from_f64),
        }
    }

    /// Momentum `I · v` of a motion vector.
    ///
    /// `p = m (v + ω × c)`, `L = I_c ω + c × p`.
    #[must_use]
    pub fn apply(&self, motion: &SpatialVector<T>) -> SpatialVector<T> {
        let p = (motion.linear + motion.angular.cross(&self.com)) * self.mass;
        let l = self.inertia_com * motion.angular + self.com.cross(&p);
        SpatialVector::new(p, l)
    }

    /// Rotational inertia about the frame origin (parallel axis theorem).
    #[must_use]
    pub fn inertia_origin(&self) -> Matrix3<T> {
        let c = self.com;
        self.inertia_com + (Matrix3::identity() * c.dot(&c) - c * c.transpose()) * self.mass
    }
}

/// Closed-form inverse of a 3×3 matrix via its adjugate.
///
/// Branch-free, so it records cleanly; the caller guarantees invertibility.
#[must_use]
pub fn inverse_3x3<T: Real>(m: &Matrix3<T>) -> Matrix3<T> {
    let c00 = m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)];
    let c01 = m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)];
    let c02 = m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)];
    let c10 = m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)];
    let c11 = m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)];
    let c12 = m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)];
    let c20 = m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)];
    let c21 = m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)];
    let c22 = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];

    let det = m[(0, 0)] * c00 + m[(0, 1)] * c01 + m[(0, 2)] * c02;
    let inv_det = T::one() / det;

    // Transposed cofactors.
    Matrix3::new(c00, c10, c20, c01, c11, c21, c02, c12, c22) * inv_det
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn motion() -> SpatialVector<f64> {
        SpatialVector::new(Vector3::new(0.3, -1.0, 0.2), Vector3::new(0.5, 0.1, -0.7))
    }

    #[test]
    fn test_cross_motion_self_is_zero() {
        let v = motion();
        let c = spatial_cross_motion(&v, &v);
        assert_relative_eq!(c.linear, Vector3::zeros(), epsilon = 1e-15);
        assert_relative_eq!(c.angular, Vector3::zeros(), epsilon = 1e-15);
    }

    #[test]
    fn test_force_cross_is_dual_of_motion_cross() {
        // (v ×* f) · s = -f · (v × s)
        let v = motion();
        let f = SpatialVector::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(-0.4, 0.0, 0.9));
        let s = SpatialVector::new(Vector3::new(-0.2, 0.6, 1.1), Vector3::new(0.8, -0.3, 0.05));
        let dot = |a: &SpatialVector<f64>, b: &SpatialVector<f64>| {
            a.linear.dot(&b.linear) + a.angular.dot(&b.angular)
        };
        let lhs = dot(&spatial_cross_force(&v, &f), &s);
        let rhs = -dot(&f, &spatial_cross_motion(&v, &s));
        assert_relative_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia_kinetic_energy() {
        // 2T = m |v_c|² + ωᵀ I_c ω
        let com = Vector3::new(0.1, -0.05, 0.2);
        let i_c = Matrix3::from_diagonal(&Vector3::new(0.2, 0.3, 0.25));
        let inertia = SpatialInertia::<f64>::from_f64(2.0, &com, &i_c);
        let v = motion();
        let h = inertia.apply(&v);
        let two_t = h.linear.dot(&v.linear) + h.angular.dot(&v.angular);

        let v_com = v.linear + v.angular.cross(&com);
        let expected = 2.0 * v_com.norm_squared() + v.angular.dot(&(i_c * v.angular));
        assert_relative_eq!(two_t, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia_origin_parallel_axis() {
        let inertia = SpatialInertia::<f64>::from_f64(3.0, &Vector3::new(0.0, 0.0, 2.0), &Matrix3::zeros());
        let i_o = inertia.inertia_origin();
        assert_relative_eq!(i_o[(0, 0)], 12.0);
        assert_relative_eq!(i_o[(1, 1)], 12.0);
        assert_relative_eq!(i_o[(2, 2)], 0.0);
    }

    #[test]
    fn test_inverse_3x3() {
        let m = Matrix3::new(4.0, 1.0, 0.5, 1.0, 3.0, -0.2, 0.5, -0.2, 2.0);
        let inv = inverse_3x3(&m);
        assert_relative_eq!(m * inv, Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(inv, m.try_inverse().unwrap(), epsilon = 1e-12);
    }
}
