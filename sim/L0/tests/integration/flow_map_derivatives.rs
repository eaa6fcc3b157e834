//! Compiled Jacobians against central finite differences.

use fbm_core::{FdConfig, Model, fd_linear_approximation, max_relative_error, validate_against_fd};

use super::fixtures::{build, random_point, rng};

#[test]
fn quadruped_jacobians_match_finite_differences() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    assert_eq!(info.state_dim(), 24);
    assert_eq!(info.input_dim(), 24);
    let dynamics = build(&model, "quadruped_fd", dir.path());

    let mut rng = rng(11);
    for _ in 0..5 {
        let (x, u) = random_point(&info, &mut rng);
        let err = validate_against_fd(&dynamics, 0.0, &x, &u, &FdConfig::default()).unwrap();
        assert!(err < 1e-5, "max relative error {err:e}");
    }
}

#[test]
fn biped_jacobians_match_finite_differences() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let dynamics = build(&model, "biped_fd", dir.path());

    let mut rng = rng(12);
    for _ in 0..3 {
        let (x, u) = random_point(&info, &mut rng);
        let err = validate_against_fd(&dynamics, 0.5, &x, &u, &FdConfig::default()).unwrap();
        assert!(err < 1e-5, "max relative error {err:e}");
    }
}

#[test]
fn input_jacobian_structure() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let dynamics = build(&model, "quadruped_structure", dir.path());

    let (x, u) = random_point(&info, &mut rng(13));
    let lin = dynamics.linear_approximation(0.0, &x, &u).unwrap();

    // Joint velocities feed the joint-angle rows one to one.
    let offset = info.joint_velocity_offset();
    for k in 0..info.actuated_dof_num() {
        for row in 6..info.state_dim() {
            let expected = if row == 12 + k { 1.0 } else { 0.0 };
            assert_eq!(lin.dfdu[(row, offset + k)], expected, "row {row}, joint {k}");
        }
    }
    // Contact forces never move the kinematic rows directly.
    assert_eq!(lin.dfdu.view((6, 0), (info.state_dim() - 6, offset)).norm(), 0.0);
    // Contact forces do accelerate the base.
    assert!(lin.dfdu.view((0, 0), (6, offset)).norm() > 0.0);
}

#[test]
fn dynamics_ignore_time_and_base_position() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let dynamics = build(&model, "quadruped_invariance", dir.path());

    let (x, u) = random_point(&info, &mut rng(14));
    let at_zero = dynamics.linear_approximation(0.0, &x, &u).unwrap();
    let later = dynamics.linear_approximation(7.5, &x, &u).unwrap();
    assert_eq!(at_zero, later);

    let mut shifted = x.clone();
    shifted[6] += 3.0;
    shifted[8] -= 1.0;
    assert_eq!(dynamics.value(0.0, &shifted, &u).unwrap(), at_zero.f);
    assert_eq!(at_zero.dfdx.columns(6, 3).norm(), 0.0);
}

#[test]
fn fd_helper_agrees_with_exact_on_compiled_value() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let dynamics = build(&model, "biped_fd_helper", dir.path());

    let (x, u) = random_point(&info, &mut rng(15));
    let exact = dynamics.linear_approximation(0.0, &x, &u).unwrap();
    let config = FdConfig::default();
    let fd = fd_linear_approximation(|x, u| dynamics.value(0.0, x, u), &x, &u, &config).unwrap();
    assert_eq!(fd.f, exact.f);
    let (err, loc) = max_relative_error(&exact.dfdu, &fd.dfdu, config.floor).unwrap();
    assert!(err < 1e-5, "dfdu error {err:e} at {loc:?}");
}
