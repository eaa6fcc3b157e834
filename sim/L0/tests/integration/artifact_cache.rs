//! Artifact reuse, corruption and recovery.

use std::fs;

use fbm_core::{ContactKind, DynamicsBuildConfig, FloatingBaseDynamicsAd, Model};
use nalgebra::Vector3;

use super::fixtures::{random_point, rng};

#[test]
fn reload_is_bit_for_bit() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let config = DynamicsBuildConfig::new("quadruped").folder(dir.path());

    let built = FloatingBaseDynamicsAd::new(&model, info, &config).unwrap();
    assert!(!built.artifact_source().is_loaded());
    let path = built.artifact_source().path().to_path_buf();
    assert_eq!(path, dir.path().join("quadruped.fbad"));
    assert!(path.exists());

    let loaded = FloatingBaseDynamicsAd::new(&model, info, &config.clone().recompile(false)).unwrap();
    assert!(loaded.artifact_source().is_loaded());
    assert_eq!(loaded.artifact_source().path(), path);

    let mut rng = rng(21);
    for _ in 0..3 {
        let (x, u) = random_point(&info, &mut rng);
        assert_eq!(built.value(0.0, &x, &u).unwrap(), loaded.value(0.0, &x, &u).unwrap());
        assert_eq!(
            built.linear_approximation(0.0, &x, &u).unwrap(),
            loaded.linear_approximation(0.0, &x, &u).unwrap()
        );
    }
}

#[test]
fn missing_artifact_is_built_without_recompile() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("nested").join("cache");
    let model = Model::biped();
    let config = DynamicsBuildConfig::new("biped").folder(&folder).recompile(false);

    let dynamics = FloatingBaseDynamicsAd::new(&model, model.model_info().unwrap(), &config).unwrap();
    assert!(!dynamics.artifact_source().is_loaded());
    assert!(folder.join("biped.fbad").exists());
}

#[test]
fn corrupt_artifact_fails_then_recompile_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let config = DynamicsBuildConfig::new("corrupt").folder(dir.path());
    let original = FloatingBaseDynamicsAd::new(&model, info, &config).unwrap();
    let path = original.artifact_source().path().to_path_buf();

    // Truncated payload
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let reuse = config.clone().recompile(false);
    let err = FloatingBaseDynamicsAd::new(&model, info, &reuse).unwrap_err();
    assert!(err.is_artifact_load_error(), "{err}");

    // Garbage header
    fs::write(&path, b"not an artifact at all").unwrap();
    let err = FloatingBaseDynamicsAd::new(&model, info, &reuse).unwrap_err();
    assert!(err.is_artifact_load_error(), "{err}");

    let rebuilt = FloatingBaseDynamicsAd::new(&model, info, &config).unwrap();
    assert!(!rebuilt.artifact_source().is_loaded());
    let reloaded = FloatingBaseDynamicsAd::new(&model, info, &reuse).unwrap();
    assert!(reloaded.artifact_source().is_loaded());

    let (x, u) = random_point(&info, &mut rng(22));
    assert_eq!(original.value(0.0, &x, &u).unwrap(), reloaded.value(0.0, &x, &u).unwrap());
}

#[test]
fn artifact_of_another_robot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = DynamicsBuildConfig::new("robot").folder(dir.path());
    let quadruped = Model::quadruped();
    FloatingBaseDynamicsAd::new(&quadruped, quadruped.model_info().unwrap(), &config).unwrap();

    // Same counts, different geometry: only the signature tells them apart.
    let mut moved = Model::quadruped();
    moved.contacts[0].pos = Vector3::new(0.0, 0.0, -0.32);
    let err = FloatingBaseDynamicsAd::new(&moved, moved.model_info().unwrap(), &config.clone().recompile(false))
        .unwrap_err();
    assert!(err.is_artifact_load_error(), "{err}");

    let biped = Model::biped();
    let err = FloatingBaseDynamicsAd::new(&biped, biped.model_info().unwrap(), &config.clone().recompile(false))
        .unwrap_err();
    assert!(err.is_artifact_load_error(), "{err}");
}

#[test]
fn invalid_model_is_rejected_before_building() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::quadruped();
    model.add_contact("BASE_PAD", 0, Vector3::zeros(), ContactKind::Wrench).unwrap();
    model.body_mass[0] = -1.0;
    let config = DynamicsBuildConfig::new("invalid").folder(dir.path());

    let err = FloatingBaseDynamicsAd::new(&model, model.model_info().unwrap(), &config).unwrap_err();
    assert!(err.is_config_error());
    assert!(!dir.path().join("invalid.fbad").exists());
}
