//! Shared helpers: seeded sample points and dynamics construction.

use std::path::Path;

use fbm_core::{DynamicsBuildConfig, FloatingBaseDynamicsAd, Model, ModelInfo};
use nalgebra::DVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic generator for one test.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A random state/input pair away from the Euler singularity.
///
/// Velocities and angles are O(1), contact forces O(10) N, joint velocities
/// O(1) rad/s.
pub fn random_point(info: &ModelInfo, rng: &mut ChaCha8Rng) -> (DVector<f64>, DVector<f64>) {
    let mut x = DVector::from_fn(info.state_dim(), |_, _| rng.gen_range(-1.0..1.0));
    x[10] = rng.gen_range(-0.8..0.8);

    let joints = info.joint_velocity_offset();
    let u = DVector::from_fn(info.input_dim(), |i, _| {
        if i < joints {
            rng.gen_range(-40.0..40.0)
        } else {
            rng.gen_range(-2.0..2.0)
        }
    });
    (x, u)
}

/// Build (always recompiling) the dynamics of `model` in `folder`.
pub fn build(model: &Model, name: &str, folder: &Path) -> FloatingBaseDynamicsAd {
    let config = DynamicsBuildConfig::new(name).folder(folder);
    FloatingBaseDynamicsAd::new(model, model.model_info().unwrap(), &config).expect("dynamics should build")
}
