//! Rotation parameterizations used by the floating base.
//!
//! Euler angles are intrinsic ZYX and stored as `[yaw, pitch, roll]`, so that
//! `R = Rz(yaw) · Ry(pitch) · Rx(roll)`. Quaternions are stored as
//! `[x, y, z, w]`, matching nalgebra's coordinate order.
//!
//! Everything except [`euler_zyx_from_quaternion`] is generic over [`Real`]
//! and therefore recordable.

use fbm_ad::Real;
use nalgebra::{Matrix3, UnitQuaternion, Vector3, Vector4};

/// Skew-symmetric matrix `[v]×` such that `[v]× w = v × w`.
#[must_use]
pub fn skew<T: Real>(v: &Vector3<T>) -> Matrix3<T> {
    let z = T::zero();
    Matrix3::new(z, -v.z, v.y, v.z, z, -v.x, -v.y, v.x, z)
}

/// Rotation matrix of ZYX Euler angles `[yaw, pitch, roll]`.
#[must_use]
pub fn rotation_zyx<T: Real>(euler: &Vector3<T>) -> Matrix3<T> {
    let (sy, cy) = (euler[0].sin(), euler[0].cos());
    let (sp, cp) = (euler[1].sin(), euler[1].cos());
    let (sr, cr) = (euler[2].sin(), euler[2].cos());

    Matrix3::new(
        cy * cp,
        cy * sp * sr - sy * cr,
        cy * sp * cr + sy * sr,
        sy * cp,
        sy * sp * sr + cy * cr,
        sy * sp * cr - cy * sr,
        -sp,
        cp * sr,
        cp * cr,
    )
}

/// Unit quaternion `[x, y, z, w]` of ZYX Euler angles.
#[must_use]
pub fn quaternion_from_zyx<T: Real>(euler: &Vector3<T>) -> Vector4<T> {
    let half = T::from_f64(0.5);
    let (sy, cy) = ((euler[0] * half).sin(), (euler[0] * half).cos());
    let (sp, cp) = ((euler[1] * half).sin(), (euler[1] * half).cos());
    let (sr, cr) = ((euler[2] * half).sin(), (euler[2] * half).cos());

    Vector4::new(
        cy * cp * sr - sy * sp * cr,
        cy * sp * cr + sy * cp * sr,
        sy * cp * cr - cy * sp * sr,
        cy * cp * cr + sy * sp * sr,
    )
}

/// Rotation matrix of a unit quaternion `[x, y, z, w]`.
///
/// The quaternion is not renormalized.
#[must_use]
pub fn rotation_from_quaternion<T: Real>(q: &Vector4<T>) -> Matrix3<T> {
    let (x, y, z, w) = (q[0], q[1], q[2], q[3]);
    let one = T::one();
    let two = T::from_f64(2.0);

    Matrix3::new(
        one - two * (y * y + z * z),
        two * (x * y - z * w),
        two * (x * z + y * w),
        two * (x * y + z * w),
        one - two * (x * x + z * z),
        two * (y * z - x * w),
        two * (x * z - y * w),
        two * (y * z + x * w),
        one - two * (x * x + y * y),
    )
}

/// Rotation by `angle` about a fixed unit `axis` (Rodrigues).
#[must_use]
pub fn axis_angle_rotation<T: Real>(axis: &Vector3<f64>, angle: T) -> Matrix3<T> {
    let k = skew(axis);
    let k2 = k * k;
    Matrix3::identity() + k.map(T::from_f64) * angle.sin() + k2.map(T::from_f64) * (T::one() - angle.cos())
}

/// Matrix mapping ZYX Euler rates `[ẏaw, ṗitch, ṙoll]` to the angular
/// velocity expressed in the rotated (local) frame.
#[must_use]
pub fn euler_rates_to_local_angular_velocity<T: Real>(euler: &Vector3<T>) -> Matrix3<T> {
    let (sp, cp) = (euler[1].sin(), euler[1].cos());
    let (sr, cr) = (euler[2].sin(), euler[2].cos());
    let (z, one) = (T::zero(), T::one());

    Matrix3::new(-sp, z, one, cp * sr, cr, z, cp * cr, -sr, z)
}

/// ZYX Euler rates producing the local angular velocity `omega`.
///
/// Inverse of [`euler_rates_to_local_angular_velocity`]; singular at
/// `pitch = ±π/2`.
#[must_use]
pub fn local_angular_velocity_to_euler_rates<T: Real>(euler: &Vector3<T>, omega: &Vector3<T>) -> Vector3<T> {
    let (sp, cp) = (euler[1].sin(), euler[1].cos());
    let (sr, cr) = (euler[2].sin(), euler[2].cos());

    let yaw_cp = sr * omega.y + cr * omega.z;
    let yaw_rate = yaw_cp / cp;
    let pitch_rate = cr * omega.y - sr * omega.z;
    let roll_rate = omega.x + sp * yaw_rate;

    Vector3::new(yaw_rate, pitch_rate, roll_rate)
}

/// ZYX Euler angles `[yaw, pitch, roll]` of a unit quaternion.
#[must_use]
pub fn euler_zyx_from_quaternion(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(yaw, pitch, roll)
}
