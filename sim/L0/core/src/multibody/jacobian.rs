//! Contact-frame Jacobians and configuration integration.
//!
//! Tangent-space columns follow the generalized velocity layout
//! `[v_B, ω_B, joint rates]`, with the base twist in base coordinates. All
//! results are in the world frame.

use fbm_types::{ModelError, check_dimension};
use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};

use super::{Data, Model};

fn contact_body(model: &Model, contact: usize) -> Result<(usize, Vector3<f64>), ModelError> {
    model.contacts.get(contact).map(|c| (c.body, c.pos)).ok_or(ModelError::IndexOutOfRange {
        what: "contact",
        index: contact,
        lower: 0,
        upper: model.contacts.len(),
    })
}

/// World position of a contact frame.
///
/// Requires [`forward_kinematics`](Data::forward_kinematics).
///
/// # Errors
///
/// Returns [`ModelError::IndexOutOfRange`] for an unknown contact.
pub fn contact_position(model: &Model, data: &Data<f64>, contact: usize) -> Result<Vector3<f64>, ModelError> {
    let (body, offset) = contact_body(model, contact)?;
    Ok(data.world_point(body, &offset))
}

/// Translational Jacobian (3×nv) of a contact frame's world position.
///
/// Walks the chain from the contact body to the base. A revolute joint
/// contributes `a × (r − anchor)`; the base contributes `R` for its linear
/// velocity and `R [e_k × r]` for its angular velocity.
///
/// # Errors
///
/// Returns [`ModelError::IndexOutOfRange`] for an unknown contact.
pub fn contact_position_jacobian(
    model: &Model,
    data: &Data<f64>,
    contact: usize,
) -> Result<DMatrix<f64>, ModelError> {
    let (body, offset) = contact_body(model, contact)?;
    let rot = data.base_rot;
    let r = data.body_pos[body] + data.body_rot[body] * offset;

    let mut jac = DMatrix::zeros(3, model.nv());
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot);
    for k in 0..3 {
        let col = rot * Vector3::ith(k, 1.0).cross(&r);
        jac.fixed_view_mut::<3, 1>(0, 3 + k).copy_from(&col);
    }

    let mut current = body;
    while current != 0 {
        let axis = data.body_rot[current] * model.jnt_axis[current];
        let anchor = data.body_pos[current];
        let col = rot * axis.cross(&(r - anchor));
        jac.fixed_view_mut::<3, 1>(0, 6 + current - 1).copy_from(&col);
        current = model.body_parent[current];
    }
    Ok(jac)
}

/// World velocity of a contact frame for generalized velocity `qvel`.
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`] if `qvel` is not `nv` long, or
/// [`ModelError::IndexOutOfRange`] for an unknown contact.
pub fn contact_velocity(
    model: &Model,
    data: &Data<f64>,
    contact: usize,
    qvel: &DVector<f64>,
) -> Result<Vector3<f64>, ModelError> {
    check_dimension("generalized velocity", model.nv(), qvel.len())?;
    let jac = contact_position_jacobian(model, data, contact)?;
    let v = jac * qvel;
    Ok(Vector3::new(v[0], v[1], v[2]))
}

/// Integrate a tangent displacement `dq` into a generalized position.
///
/// `q ⊕ dq = (p + R·dq_v, quat · exp(dq_ω), θ + dq_θ)`, so the base
/// displacement is in base coordinates. The result quaternion is unit length.
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`] if `qpos` is not `nq` long or
/// `dq` is not `nv` long.
pub fn integrate_pos(model: &Model, qpos: &DVector<f64>, dq: &DVector<f64>) -> Result<DVector<f64>, ModelError> {
    check_dimension("generalized position", model.nq(), qpos.len())?;
    check_dimension("tangent displacement", model.nv(), dq.len())?;

    let quat = UnitQuaternion::from_quaternion(Quaternion::new(qpos[6], qpos[3], qpos[4], qpos[5]));
    let dp = quat * Vector3::new(dq[0], dq[1], dq[2]);
    let rotated = quat * UnitQuaternion::from_scaled_axis(Vector3::new(dq[3], dq[4], dq[5]));

    let mut out = qpos.clone();
    out[0] += dp.x;
    out[1] += dp.y;
    out[2] += dp.z;
    out.fixed_rows_mut::<4>(3).copy_from(&rotated.coords);
    for j in 0..model.njnt() {
        out[7 + j] += dq[6 + j];
    }
    Ok(out)
}
