//! Sharing compiled dynamics across threads.

use std::sync::Arc;
use std::thread;

use fbm_core::{DynamicsBuildConfig, FloatingBaseDynamicsAd, Model};

use super::fixtures::{build, random_point, rng};

#[test]
fn parallel_evaluation_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::quadruped();
    let info = model.model_info().unwrap();
    let dynamics = Arc::new(build(&model, "shared", dir.path()));

    let mut rng = rng(51);
    let points: Vec<_> = (0..8).map(|_| random_point(&info, &mut rng)).collect();
    let sequential: Vec<_> = points
        .iter()
        .map(|(x, u)| dynamics.linear_approximation(0.0, x, u).unwrap())
        .collect();

    let handles: Vec<_> = points
        .into_iter()
        .map(|(x, u)| {
            let dynamics = Arc::clone(&dynamics);
            thread::spawn(move || dynamics.linear_approximation(0.0, &x, &u).unwrap())
        })
        .collect();
    for (handle, expected) in handles.into_iter().zip(&sequential) {
        assert_eq!(&handle.join().unwrap(), expected);
    }
}

#[test]
fn clones_share_the_compiled_function() {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::biped();
    let info = model.model_info().unwrap();
    let dynamics = build(&model, "cloned", dir.path());
    let copy = dynamics.clone();

    let (x, u) = random_point(&info, &mut rng(52));
    thread::scope(|s| {
        let a = s.spawn(|| dynamics.value(1.0, &x, &u).unwrap());
        let b = s.spawn(|| copy.value(1.0, &x, &u).unwrap());
        assert_eq!(a.join().unwrap(), b.join().unwrap());
    });
}

#[test]
fn independent_builds_on_separate_threads() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().to_path_buf();

    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|name| {
            let folder = folder.clone();
            thread::spawn(move || {
                let model = Model::quadruped();
                let config = DynamicsBuildConfig::new(name).folder(folder);
                FloatingBaseDynamicsAd::new(&model, model.model_info().unwrap(), &config).unwrap()
            })
        })
        .collect();
    let built: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let info = built[0].info();
    let (x, u) = random_point(info, &mut rng(53));
    assert_eq!(built[0].value(0.0, &x, &u).unwrap(), built[1].value(0.0, &x, &u).unwrap());
}
