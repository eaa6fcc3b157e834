//! Layout contracts between flat vectors and semantic quantities.

use fbm_core::{DynamicsBuildConfig, FloatingBaseDynamicsAd, Model, access};
use nalgebra::DVector;

#[test]
fn quadruped_views_cover_the_state() {
    let info = Model::quadruped().model_info().unwrap();
    let mut x = DVector::from_fn(info.state_dim(), |i, _| i as f64);

    assert_eq!(access::base_linear_velocity(&info, &x).unwrap()[0], 0.0);
    assert_eq!(access::base_angular_velocity(&info, &x).unwrap()[0], 3.0);
    assert_eq!(access::base_position(&info, &x).unwrap()[0], 6.0);
    assert_eq!(access::base_orientation_zyx(&info, &x).unwrap()[0], 9.0);
    assert_eq!(access::joint_angles(&info, &x).unwrap().len(), 12);
    assert_eq!(access::generalized_coordinates(&info, &x).unwrap().len(), 18);

    access::joint_angles_mut(&info, &mut x).unwrap()[11] = -1.0;
    assert_eq!(x[23], -1.0);
    let pose = access::base_pose(&info, &x).unwrap().into_owned();
    access::base_pose_mut(&info, &mut x).unwrap().copy_from(&pose);
    assert_eq!(x[6], 6.0);
}

#[test]
fn contact_indices_are_range_checked() {
    let point_info = Model::quadruped().model_info().unwrap();
    let u = DVector::<f64>::zeros(point_info.input_dim());
    assert!(access::contact_force(&point_info, &u, 3).is_ok());
    assert!(access::contact_force(&point_info, &u, 4).unwrap_err().is_index_out_of_range());
    // Point contacts carry no torque.
    assert!(access::contact_torque(&point_info, &u, 0).unwrap_err().is_index_out_of_range());

    let wrench_info = Model::biped().model_info().unwrap();
    let mut u = DVector::<f64>::zeros(wrench_info.input_dim());
    access::contact_torque_mut(&wrench_info, &mut u, 1).unwrap()[2] = 4.0;
    assert_eq!(u[11], 4.0);
    assert!(access::contact_torque(&wrench_info, &u, 2).unwrap_err().is_index_out_of_range());
}

#[test]
fn dynamics_rejects_wrong_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let config = DynamicsBuildConfig::new("lengths").folder(dir.path());
    let dynamics = FloatingBaseDynamicsAd::new(&model, info, &config).unwrap();

    let x = DVector::zeros(info.state_dim());
    let u = DVector::zeros(info.input_dim());
    assert!(dynamics.value(0.0, &DVector::zeros(23), &u).unwrap_err().is_dimension_mismatch());
    assert!(dynamics.value(0.0, &x, &DVector::zeros(25)).unwrap_err().is_dimension_mismatch());
    assert!(
        dynamics
            .linear_approximation(0.0, &DVector::zeros(25), &u)
            .unwrap_err()
            .is_dimension_mismatch()
    );
    assert_eq!(dynamics.value(0.0, &x, &u).unwrap().len(), 24);
}
