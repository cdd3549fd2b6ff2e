use std::task::Poll;

use futures::executor::block_on;
use tour_ngin::{ModelCache, resources::LoadProgress};

use crate::common::test_utils::{
    MOCK_BODY, MOCK_CLIP, ScriptedLoader, model_url, poll_once, progress_recorder,
};

mod common;

#[test]
fn second_resolve_is_served_from_the_cache() {
    let loader = ScriptedLoader::new();
    let cache = ModelCache::new(loader.clone());
    let url = model_url("parrot");

    let (progress, first_events) = progress_recorder();
    let first = block_on(cache.resolve(&url, progress)).unwrap();
    assert_eq!(
        *first_events.borrow(),
        vec![LoadProgress::new(1, 2), LoadProgress::new(2, 2)]
    );
    assert!(cache.is_cached(&url));

    let (progress, second_events) = progress_recorder();
    let second = block_on(cache.resolve(&url, progress)).unwrap();

    assert_eq!(loader.calls(), 1);
    assert_eq!(cache.loads_issued(), 1);
    assert_eq!(*second_events.borrow(), vec![LoadProgress::complete()]);
    assert_eq!(second.scene.name(), first.scene.name());
    assert_eq!(second.animations.len(), 1);
    assert_eq!(second.animations[0].name, MOCK_CLIP);
}

#[test]
fn resolve_does_nothing_until_polled() {
    let loader = ScriptedLoader::new();
    let cache = ModelCache::new(loader.clone());
    let (progress, events) = progress_recorder();

    let pending = cache.resolve(&model_url("stork"), progress);
    assert_eq!(loader.calls(), 0);
    assert!(events.borrow().is_empty());

    block_on(pending).unwrap();
    assert_eq!(loader.calls(), 1);
}

#[test]
fn clones_do_not_share_materials_with_the_template() {
    let cache = ModelCache::new(ScriptedLoader::new());
    let url = model_url("horse");
    let (progress, _) = progress_recorder();

    let mut first = block_on(cache.resolve(&url, progress.clone())).unwrap();
    first.scene.traverse_mut(&mut |node| {
        if let Some(mesh) = node.mesh_mut() {
            mesh.materials.iter_mut().for_each(|material| material.apply_fade(0.0));
        }
    });

    let second = block_on(cache.resolve(&url, progress)).unwrap();
    let body = second.scene.find(MOCK_BODY).unwrap();
    let materials = &body.mesh().unwrap().materials;
    assert_eq!(materials[0].opacity, 0.5);
    assert_eq!(materials[1].opacity, 1.0);
    assert!(materials.iter().all(|material| material.original().is_none()));
}

#[test]
fn failures_are_reported_once_and_never_cached() {
    let loader = ScriptedLoader::new();
    let cache = ModelCache::new(loader.clone());
    let url = model_url("flamingo");
    loader.fail_url(&url);

    let (progress, _) = progress_recorder();
    let error = block_on(cache.resolve(&url, progress.clone())).unwrap_err();
    assert_eq!(error.url(), url);
    assert!(error.to_string().contains("scripted failure"));
    assert!(!cache.is_cached(&url));
    assert_eq!(cache.in_flight(), 0);

    loader.heal_url(&url);
    assert!(block_on(cache.resolve(&url, progress)).is_ok());
    assert_eq!(loader.calls_for(&url), 2);
    assert!(cache.is_cached(&url));
}

#[test]
fn concurrent_requests_share_one_load() {
    let loader = ScriptedLoader::deferred();
    let cache = ModelCache::new(loader.clone());
    let url = model_url("parrot");

    let (first_progress, first_events) = progress_recorder();
    let (second_progress, second_events) = progress_recorder();
    let mut first = cache.resolve(&url, first_progress);
    let mut second = cache.resolve(&url, second_progress);

    assert!(poll_once(&mut first).is_pending());
    assert!(poll_once(&mut second).is_pending());
    assert_eq!(loader.calls(), 1);
    assert_eq!(cache.in_flight(), 1);

    loader.complete(&url);
    assert_eq!(first_events.borrow().len(), 2);
    assert_eq!(*first_events.borrow(), *second_events.borrow());

    let Poll::Ready(Ok(mut first)) = poll_once(&mut first) else {
        panic!("first request did not resolve");
    };
    let Poll::Ready(Ok(second)) = poll_once(&mut second) else {
        panic!("second request did not resolve");
    };
    assert_eq!(cache.in_flight(), 0);
    assert_eq!(cache.len(), 1);

    first.scene.traverse_mut(&mut |node| {
        if let Some(mesh) = node.mesh_mut() {
            mesh.materials.clear();
        }
    });
    let body = second.scene.find(MOCK_BODY).unwrap();
    assert_eq!(body.mesh().unwrap().materials.len(), 2);
}

#[test]
fn concurrent_requests_share_one_failure() {
    let loader = ScriptedLoader::deferred();
    let cache = ModelCache::new(loader.clone());
    let url = model_url("stork");
    let (progress, _) = progress_recorder();

    let mut first = cache.resolve(&url, progress.clone());
    let mut second = cache.resolve(&url, progress.clone());
    assert!(poll_once(&mut first).is_pending());
    assert!(poll_once(&mut second).is_pending());

    loader.fail(&url);
    assert!(matches!(poll_once(&mut first), Poll::Ready(Err(_))));
    assert!(matches!(poll_once(&mut second), Poll::Ready(Err(_))));
    assert_eq!(loader.calls(), 1);
    assert_eq!(cache.in_flight(), 0);

    let mut retry = cache.resolve(&url, progress);
    assert!(poll_once(&mut retry).is_pending());
    assert_eq!(loader.calls(), 2);
}

#[test]
fn dropped_requests_stop_receiving_progress() {
    let loader = ScriptedLoader::deferred();
    let cache = ModelCache::new(loader.clone());
    let url = model_url("horse");

    let (first_progress, first_events) = progress_recorder();
    let (second_progress, second_events) = progress_recorder();
    let mut first = cache.resolve(&url, first_progress);
    let mut second = cache.resolve(&url, second_progress);
    assert!(poll_once(&mut first).is_pending());
    assert!(poll_once(&mut second).is_pending());
    assert_eq!(cache.listeners(&url), 2);

    drop(first);
    assert_eq!(cache.listeners(&url), 1);

    loader.complete(&url);
    assert!(first_events.borrow().is_empty());
    assert_eq!(
        *second_events.borrow(),
        vec![LoadProgress::new(1, 2), LoadProgress::new(2, 2)]
    );
    assert!(matches!(poll_once(&mut second), Poll::Ready(Ok(_))));
    assert_eq!(cache.listeners(&url), 0);
    assert_eq!(loader.calls(), 1);
}
