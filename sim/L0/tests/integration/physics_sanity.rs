//! Physical sanity of the flow map.

use approx::assert_relative_eq;
use fbm_core::{FloatingBaseMapping, Model, access, flow_map};
use nalgebra::{DVector, Vector3};

use super::fixtures::{build, random_point, rng};

fn direct(model: &Model, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
    let mut data = model.make_data::<f64>();
    let mapping = FloatingBaseMapping::new(model.model_info().unwrap());
    flow_map(model, &mut data, &mapping, x, u).unwrap()
}

#[test]
fn free_fall_accelerates_with_gravity_in_base_frame() {
    for model in [Model::quadruped(), Model::biped()] {
        let info = model.model_info().unwrap();
        let mut rng = rng(41);
        for _ in 0..4 {
            let (mut x, mut u) = random_point(&info, &mut rng);
            // At rest, no contact forces, joints locked.
            x.rows_mut(0, 6).fill(0.0);
            u.fill(0.0);

            let xdot = direct(&model, &x, &u);
            let euler = Vector3::new(x[9], x[10], x[11]);
            let rot = fbm_core::rotation::rotation_zyx(&euler);
            let expected = rot.transpose() * model.gravity;
            assert_relative_eq!(xdot.fixed_rows::<3>(0).into_owned(), expected, epsilon = 1e-9);
            assert_relative_eq!(xdot.fixed_rows::<3>(3).into_owned(), Vector3::zeros(), epsilon = 1e-9);
            assert_eq!(xdot.rows(6, info.state_dim() - 6).norm(), 0.0);
        }
    }
}

#[test]
fn symmetric_support_holds_the_quadruped() {
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let weight = model.total_mass() * 9.81;

    for yaw in [0.0, 0.7, -2.1] {
        let mut x = DVector::zeros(info.state_dim());
        x[8] = 0.6;
        x[9] = yaw;
        let mut u = DVector::zeros(info.input_dim());
        for foot in 0..info.num_contacts() {
            access::contact_force_mut(&info, &mut u, foot).unwrap()[2] = weight / 4.0;
        }

        let xdot = direct(&model, &x, &u);
        assert_relative_eq!(xdot.fixed_rows::<6>(0).norm(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn sole_wrenches_hold_the_biped() {
    // Both soles push with half the weight each; the sole torques cancel the
    // moment of those forces about the center of mass.
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(&model, &model.qpos0()).unwrap();
    data.composite_inertia(&model);
    let com = data.center_of_mass();
    let force = Vector3::new(0.0, 0.0, model.total_mass() * 9.81 / 2.0);

    let mut u = DVector::zeros(info.input_dim());
    for (index, sole) in model.contacts.iter().enumerate() {
        let r = data.body_pos[sole.body] + data.body_rot[sole.body] * sole.pos;
        let torque = -(r - com).cross(&force);
        access::contact_force_mut(&info, &mut u, index).unwrap().copy_from(&force);
        access::contact_torque_mut(&info, &mut u, index).unwrap().copy_from(&torque);
    }

    let x = DVector::zeros(info.state_dim());
    let xdot = direct(&model, &x, &u);
    assert_relative_eq!(xdot.fixed_rows::<6>(0).norm(), 0.0, epsilon = 1e-9);
}

#[test]
fn force_through_com_only_translates() {
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let mut data = model.make_data::<f64>();
    data.forward_kinematics(&model, &model.qpos0()).unwrap();
    data.composite_inertia(&model);
    let com = data.center_of_mass();

    // Horizontal push at a sole, with the sole torque moving its line of
    // action through the center of mass. Gravity off.
    let model = model.with_gravity(Vector3::zeros());
    let sole = &model.contacts[0];
    let r = data.body_pos[sole.body] + data.body_rot[sole.body] * sole.pos;
    let force = Vector3::new(30.0, -10.0, 0.0);
    let mut u = DVector::zeros(info.input_dim());
    access::contact_force_mut(&info, &mut u, 0).unwrap().copy_from(&force);
    access::contact_torque_mut(&info, &mut u, 0)
        .unwrap()
        .copy_from(&-(r - com).cross(&force));

    let xdot = direct(&model, &DVector::zeros(info.state_dim()), &u);
    assert_relative_eq!(
        xdot.fixed_rows::<3>(0).into_owned(),
        force / model.total_mass(),
        epsilon = 1e-9
    );
    assert_relative_eq!(xdot.fixed_rows::<3>(3).into_owned(), Vector3::zeros(), epsilon = 1e-9);
}

#[test]
fn compiled_value_equals_direct_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    for (name, model) in [("quadruped", Model::quadruped()), ("biped", Model::biped())] {
        let info = model.model_info().unwrap();
        let dynamics = build(&model, name, dir.path());
        let mut rng = rng(42);
        for _ in 0..5 {
            let (x, u) = random_point(&info, &mut rng);
            let compiled = dynamics.value(0.0, &x, &u).unwrap();
            assert_relative_eq!(compiled, direct(&model, &x, &u), epsilon = 1e-10, max_relative = 1e-10);
        }
    }
}
