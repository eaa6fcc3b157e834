//! Jacobian lifting against independently differentiated quantities.
//!
//! Tangent-space Jacobians come from the analytic contact Jacobian or from
//! finite differences through `integrate_pos`; the lifted result is compared
//! with finite differences taken directly in state/input coordinates.

use approx::assert_relative_eq;
use fbm_core::multibody::{contact_position, contact_position_jacobian, integrate_pos};
use fbm_core::{FloatingBaseMapping, Model, max_relative_error};
use nalgebra::{DMatrix, DVector, Vector3};
use rand::Rng;

use super::fixtures::{random_point, rng};

const EPS: f64 = 1e-6;

fn foot_position(model: &Model, qpos: &DVector<f64>, contact: usize) -> Vector3<f64> {
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(model, qpos).unwrap();
    contact_position(model, &data, contact).unwrap()
}

fn foot_velocity(model: &Model, qpos: &DVector<f64>, qvel: &DVector<f64>, contact: usize) -> Vector3<f64> {
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(model, qpos).unwrap();
    let v = contact_position_jacobian(model, &data, contact).unwrap() * qvel;
    Vector3::new(v[0], v[1], v[2])
}

/// Central differences of `g` over every entry of `point`.
fn fd_columns(point: &DVector<f64>, mut g: impl FnMut(&DVector<f64>) -> Vector3<f64>) -> DMatrix<f64> {
    let mut jac = DMatrix::zeros(3, point.len());
    let mut p = point.clone();
    for i in 0..point.len() {
        p[i] = point[i] + EPS;
        let plus = g(&p);
        p[i] = point[i] - EPS;
        let minus = g(&p);
        p[i] = point[i];
        jac.fixed_view_mut::<3, 1>(0, i).copy_from(&((plus - minus) / (2.0 * EPS)));
    }
    jac
}

#[test]
fn contact_position_lifts_to_state_jacobian() {
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let mapping = FloatingBaseMapping::<f64>::new(info);
    let mut rng = rng(31);

    for contact in 0..info.num_contacts() {
        let (x, _) = random_point(&info, &mut rng);
        let qpos = mapping.to_generalized_position(&x).unwrap();
        let mut data = model.make_data::<f64>();
        data.forward_kinematics(&model, &qpos).unwrap();

        let jq = contact_position_jacobian(&model, &data, contact).unwrap();
        let jv = DMatrix::zeros(3, info.generalized_coordinates_num());
        let (dfdx, dfdu) = mapping.lift_jacobians(&x, &jq, &jv).unwrap();

        let fd = fd_columns(&x, |x| {
            foot_position(&model, &mapping.to_generalized_position(x).unwrap(), contact)
        });
        let (err, loc) = max_relative_error(&dfdx, &fd, 1e-2).unwrap();
        assert!(err < 1e-6, "contact {contact}: error {err:e} at {loc:?}");
        assert_eq!(dfdu.norm(), 0.0);
    }
}

#[test]
fn contact_velocity_lifts_to_state_and_input_jacobians() {
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let mapping = FloatingBaseMapping::<f64>::new(info);
    let (x, u) = random_point(&info, &mut rng(32));
    let contact = 3;

    let qpos = mapping.to_generalized_position(&x).unwrap();
    let qvel = mapping.to_generalized_velocity(&x, &u).unwrap();
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(&model, &qpos).unwrap();

    // Tangent-space Jacobians: jv analytic, jq by differences along q ⊕ δ.
    let jv = contact_position_jacobian(&model, &data, contact).unwrap();
    let zero = DVector::zeros(info.generalized_coordinates_num());
    let jq = fd_columns(&zero, |dq| {
        foot_velocity(&model, &integrate_pos(&model, &qpos, dq).unwrap(), &qvel, contact)
    });
    let (dfdx, dfdu) = mapping.lift_jacobians(&x, &jq, &jv).unwrap();

    let velocity = |x: &DVector<f64>, u: &DVector<f64>| {
        let q = mapping.to_generalized_position(x).unwrap();
        let v = mapping.to_generalized_velocity(x, u).unwrap();
        foot_velocity(&model, &q, &v, contact)
    };
    let fd_x = fd_columns(&x, |x| velocity(x, &u));
    let fd_u = fd_columns(&u, |u| velocity(&x, u));

    let (err_x, loc_x) = max_relative_error(&dfdx, &fd_x, 1e-2).unwrap();
    let (err_u, loc_u) = max_relative_error(&dfdu, &fd_u, 1e-2).unwrap();
    assert!(err_x < 1e-5, "dfdx error {err_x:e} at {loc_x:?}");
    assert!(err_u < 1e-6, "dfdu error {err_u:e} at {loc_u:?}");
}

#[test]
fn base_linear_velocity_block_only_feeds_its_columns() {
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let nv = info.generalized_coordinates_num();
    let mapping = FloatingBaseMapping::<f64>::new(info);
    let mut rng = rng(33);
    let (x, _) = random_point(&info, &mut rng);

    let mut jv = DMatrix::zeros(3, nv);
    for r in 0..3 {
        for c in 0..3 {
            jv[(r, c)] = rng.gen_range(-1.0..1.0);
        }
    }
    let (dfdx, dfdu) = mapping.lift_jacobians(&x, &DMatrix::zeros(3, nv), &jv).unwrap();

    assert_eq!(dfdx.columns(0, 3).into_owned(), jv.columns(0, 3).into_owned());
    assert_eq!(dfdx.columns(3, info.state_dim() - 3).norm(), 0.0);
    assert_eq!(dfdu.norm(), 0.0);
}

#[test]
fn joint_columns_leave_base_blocks_untouched() {
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let nv = info.generalized_coordinates_num();
    let nj = info.actuated_dof_num();
    let mapping = FloatingBaseMapping::<f64>::new(info);
    let mut rng = rng(34);
    let (x, _) = random_point(&info, &mut rng);

    let mut jq = DMatrix::zeros(2, nv);
    let mut jv = DMatrix::zeros(2, nv);
    for r in 0..2 {
        for c in 6..nv {
            jq[(r, c)] = rng.gen_range(-1.0..1.0);
            jv[(r, c)] = rng.gen_range(-1.0..1.0);
        }
    }
    let (dfdx, dfdu) = mapping.lift_jacobians(&x, &jq, &jv).unwrap();

    assert_eq!(dfdx.columns(0, 12).norm(), 0.0);
    assert_eq!(dfdx.columns(12, nj).into_owned(), jq.columns(6, nj).into_owned());
    let offset = info.joint_velocity_offset();
    assert_eq!(dfdu.columns(0, offset).norm(), 0.0);
    assert_eq!(dfdu.columns(offset, nj).into_owned(), jv.columns(6, nj).into_owned());
}

#[test]
fn orientation_block_matches_rotation_derivative() {
    // A pure angular-velocity quantity: ω expressed in the world frame,
    // d(R ω)/d(euler) through jq = -R [ω]× and jv = R on the angular columns.
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let nv = info.generalized_coordinates_num();
    let mapping = FloatingBaseMapping::<f64>::new(info);
    let (x, _) = random_point(&info, &mut rng(35));

    let world_omega = |x: &DVector<f64>| {
        let q = mapping.to_generalized_position(x).unwrap();
        let mut data = model.make_data::<f64>();
        data.forward_kinematics(&model, &q).unwrap();
        data.base_rot * Vector3::new(x[3], x[4], x[5])
    };

    let qpos = mapping.to_generalized_position(&x).unwrap();
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(&model, &qpos).unwrap();
    let omega = Vector3::new(x[3], x[4], x[5]);
    let rot = data.base_rot;

    let mut jq = DMatrix::zeros(3, nv);
    let mut jv = DMatrix::zeros(3, nv);
    for k in 0..3 {
        // R exp(δ) ω ≈ R (ω + δ × ω) → column k is R (e_k × ω)
        let col = rot * Vector3::ith(k, 1.0).cross(&omega);
        jq.fixed_view_mut::<3, 1>(0, 3 + k).copy_from(&col);
    }
    jv.fixed_view_mut::<3, 3>(0, 3).copy_from(&rot);

    let (dfdx, _) = mapping.lift_jacobians(&x, &jq, &jv).unwrap();
    let fd = fd_columns(&x, world_omega);
    assert_relative_eq!(dfdx, fd, epsilon = 1e-7);
}
