use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tour_ngin::{
    ModelCache,
    clock::Clock,
    config::{CameraView, Diorama},
    controller::{SwitchRejection, TransitionController, TransitionState},
    data_structures::scene_group::{GroupId, SceneGroup},
    resources::LoadProgress,
    scene::Scene,
    site::Site,
};

use crate::common::test_utils::{
    MOCK_BODY, MOCK_CLIP, ManualClock, ScriptedLoader, controller, model_url,
    progress_recorder, settle, site_config,
};

mod common;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SceneEvent {
    Added(GroupId),
    Removed(GroupId),
}

#[derive(Debug, Default)]
struct RecordingScene {
    events: Rc<RefCell<Vec<SceneEvent>>>,
    content: Vec<GroupId>,
}

impl Scene for RecordingScene {
    fn add(&mut self, group: &SceneGroup) {
        self.events.borrow_mut().push(SceneEvent::Added(group.id()));
        self.content.push(group.id());
    }

    fn remove(&mut self, group: &SceneGroup) {
        self.events.borrow_mut().push(SceneEvent::Removed(group.id()));
        self.content.retain(|&id| id != group.id());
    }

    fn contains(&self, id: GroupId) -> bool {
        self.content.contains(&id)
    }
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn out_of_range_index_is_rejected_without_side_effects() {
    let loader = ScriptedLoader::new();
    let mut controller = controller(&["a", "b", "c"], loader.clone());
    let clock = ManualClock::new();

    assert_eq!(
        controller.try_switch_site(3, &clock, None, false),
        Err(SwitchRejection::InvalidIndex {
            index: 3,
            site_count: 3
        })
    );
    assert!(controller.switch_site(usize::MAX, &clock, None, true).is_none());

    assert_eq!(controller.state(), TransitionState::Idle);
    assert_eq!(controller.current_index(), None);
    assert!(controller.scene().is_empty());
    assert_eq!(loader.calls(), 0);
}

#[test]
fn out_of_range_index_is_rejected_during_a_transition() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();

    assert!(matches!(
        controller.try_switch_site(2, &clock, None, true),
        Err(SwitchRejection::InvalidIndex { .. })
    ));
    assert!(controller.is_transitioning());
    assert_eq!(controller.current_index(), Some(0));
}

#[test]
fn first_switch_fades_in_without_outgoing_group() {
    let mut controller = controller(&["a", "b", "c"], ScriptedLoader::new());
    let clock = ManualClock::new();

    let switch = controller.switch_site(0, &clock, None, false).unwrap();
    assert_eq!(switch.index, 0);
    assert_eq!(switch.name, "Site A");
    assert_eq!(switch.description, "The a diorama.");

    assert!(controller.is_transitioning());
    assert!(controller.outgoing_group().is_none());
    assert!(controller.current_group().is_none());
    let incoming = controller.incoming_group().unwrap();
    assert_eq!(incoming.opacity(), Some(0.0));
    assert!(controller.scene().contains(incoming.id()));
}

#[test]
fn switching_from_idle_moves_current_to_outgoing() {
    let mut controller = controller(&["a", "b", "c"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    let previous = controller.current_group().unwrap().id();
    assert!(controller.current_group().unwrap().mixer().unwrap().is_playing());

    controller.switch_site(1, &clock, None, false).unwrap();

    assert!(controller.is_transitioning());
    assert!(controller.current_group().is_none());
    let outgoing = controller.outgoing_group().unwrap();
    assert_eq!(outgoing.id(), previous);
    assert!(!outgoing.mixer().unwrap().is_playing());
    assert_eq!(controller.current_index(), Some(1));
}

#[test]
fn same_site_is_a_no_op_unless_forced() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    let shown = controller.current_group().unwrap().id();

    assert_eq!(
        controller.try_switch_site(0, &clock, None, false),
        Err(SwitchRejection::AlreadyCurrent { index: 0 })
    );
    assert_eq!(controller.state(), TransitionState::Idle);
    assert_eq!(controller.current_group().unwrap().id(), shown);

    assert!(controller.switch_site(0, &clock, None, true).is_some());
    assert!(controller.is_transitioning());
    assert_eq!(controller.outgoing_group().unwrap().id(), shown);
}

#[test]
fn switch_during_transition_is_rejected() {
    let mut controller = controller(&["a", "b", "c"], ScriptedLoader::new());
    let clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    let incoming = controller.incoming_group().unwrap().id();

    assert_eq!(
        controller.try_switch_site(1, &clock, None, false),
        Err(SwitchRejection::AlreadyTransitioning { requested: 1 })
    );
    assert!(controller.is_transitioning());
    assert_eq!(controller.current_index(), Some(0));
    assert_eq!(controller.incoming_group().unwrap().id(), incoming);
}

#[test]
fn repeated_switch_before_update_issues_a_single_load() {
    let loader = ScriptedLoader::new();
    let mut controller = controller(&["a", "b", "c"], loader.clone());
    let mut clock = ManualClock::new();

    assert!(controller.switch_site(0, &clock, None, false).is_some());
    assert!(controller.switch_site(0, &clock, None, false).is_none());
    assert!(controller.is_transitioning());

    settle(&mut controller, &mut clock, 0.1);
    assert_eq!(loader.calls(), 1);
    assert_eq!(controller.current_index(), Some(0));
}

#[test]
fn progress_is_monotonic_and_completion_happens_once() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let clock = ManualClock::new();
    let completions = Rc::new(Cell::new(0));
    let counter = Rc::clone(&completions);
    controller.on_transition_complete(move || counter.set(counter.get() + 1));

    controller.switch_site(0, &clock, None, false).unwrap();
    let mut last = -1.0;
    for elapsed in [0.0, 0.1, 0.3, 0.6, 0.9] {
        controller.update(0.0, elapsed);
        let opacity = controller.incoming_group().unwrap().opacity().unwrap();
        assert!(opacity > last);
        last = opacity;
        assert_eq!(completions.get(), 0);
    }

    controller.update(0.0, 1.0);
    assert_eq!(completions.get(), 1);
    assert!(!controller.is_transitioning());
    assert!(controller.incoming_group().is_none());
    assert_eq!(controller.current_group().unwrap().opacity(), Some(1.0));

    for elapsed in [1.1, 2.0, 5.0] {
        controller.update(0.1, elapsed);
    }
    assert_eq!(completions.get(), 1);
}

#[test]
fn crossfade_scales_each_material_by_its_authored_opacity() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);

    clock.set(10.0);
    controller.switch_site(1, &clock, None, false).unwrap();
    controller.update(0.0, 10.25);

    assert_close(controller.outgoing_group().unwrap().opacity().unwrap(), 0.75);
    assert_close(controller.incoming_group().unwrap().opacity().unwrap(), 0.25);

    let mut incoming = Vec::new();
    controller
        .incoming_group()
        .unwrap()
        .for_each_material(|material| incoming.push((material.name.clone(), material.opacity, material.transparent)));
    assert_eq!(incoming.len(), 2);
    assert_eq!(incoming[0].0, "glass");
    assert_close(incoming[0].1, 0.125);
    assert_close(incoming[1].1, 0.25);
    assert!(incoming.iter().all(|(_, _, transparent)| *transparent));

    controller.update(0.0, 11.0);
    let mut settled = Vec::new();
    controller
        .current_group()
        .unwrap()
        .for_each_material(|material| settled.push((material.opacity, material.transparent)));
    assert_eq!(settled, vec![(0.5, true), (1.0, false)]);
}

#[test]
fn completed_switch_shows_target_content_and_removes_previous() {
    let mut controller = controller(&["a", "b", "c"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    let previous = controller.current_group().unwrap().id();

    let switch = controller.switch_site(1, &clock, None, false).unwrap();
    assert_eq!(switch.description, "The b diorama.");
    settle(&mut controller, &mut clock, 0.1);

    let current = controller.current_group().unwrap();
    assert_eq!(current.name(), "b");
    assert!(current.root().find(&format!("model:{}", model_url("b"))).is_some());
    assert!(controller.outgoing_group().is_none());
    assert!(controller.scene().contains(current.id()));
    assert!(!controller.scene().contains(previous));
    assert_eq!(controller.scene().len(), 1);
}

#[test]
fn outgoing_group_leaves_the_scene_only_when_the_fade_completes() {
    let loader = ScriptedLoader::new();
    let sites = ["a", "b"]
        .iter()
        .map(|id| Site::from_config(site_config(id, Diorama::Empty)))
        .collect();
    let scene = RecordingScene::default();
    let events = Rc::clone(&scene.events);
    let mut controller = TransitionController::new(sites, ModelCache::new(loader), scene);
    let clock = ManualClock::new();

    controller.switch_site(0, &clock, None, false).unwrap();
    let a = controller.incoming_group().unwrap().id();
    controller.update(0.0, 1.0);
    controller.switch_site(1, &clock, None, false).unwrap();
    let b = controller.incoming_group().unwrap().id();

    controller.update(0.0, 0.5);
    assert_eq!(*events.borrow(), vec![SceneEvent::Added(a), SceneEvent::Added(b)]);

    controller.update(0.0, 1.0);
    assert_eq!(
        *events.borrow(),
        vec![
            SceneEvent::Added(a),
            SceneEvent::Added(b),
            SceneEvent::Removed(a)
        ]
    );
}

#[test]
fn forced_switch_restarts_the_running_crossfade() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    let completions = Rc::new(Cell::new(0));
    let counter = Rc::clone(&completions);
    controller.on_transition_complete(move || counter.set(counter.get() + 1));

    controller.switch_site(0, &clock, None, false).unwrap();
    controller.update(0.0, 0.5);
    let abandoned = controller.incoming_group().unwrap().id();

    clock.set(0.6);
    assert!(controller.switch_site(0, &clock, None, true).is_some());
    assert_eq!(
        controller.state(),
        TransitionState::Transitioning {
            start: 0.6,
            duration: 1.0
        }
    );
    let restarted = controller.incoming_group().unwrap();
    assert_ne!(restarted.id(), abandoned);
    assert_eq!(restarted.opacity(), Some(0.0));
    assert!(!controller.scene().contains(abandoned));
    assert_eq!(controller.scene().len(), 1);

    settle(&mut controller, &mut clock, 0.1);
    assert_eq!(completions.get(), 1);
}

#[test]
fn accepted_switch_carries_the_site_camera_view() {
    let mut beach = site_config("beach", Diorama::Beach);
    beach.camera = CameraView {
        position: [0.0, 1.5, 4.0],
        target: [0.0, -0.5, 0.0],
    };
    let sites = vec![
        Site::from_config(site_config("meadow", Diorama::Meadow)),
        Site::from_config(beach.clone()),
    ];
    let mut controller =
        TransitionController::new(sites, ModelCache::new(ScriptedLoader::new()), RecordingScene::default());
    let clock = ManualClock::new();

    let first = controller.switch_site(0, &clock, None, false).unwrap();
    assert_eq!(first.camera, CameraView::default());
    controller.update(0.0, 1.0);

    let second = controller.switch_site(1, &clock, None, false).unwrap();
    assert_eq!(second.camera, beach.camera);
    assert_eq!(second.name, "Site BEACH");
}

#[test]
fn forced_switch_continues_the_outgoing_fade_from_its_current_opacity() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);

    let start = clock.elapsed_time();
    controller.switch_site(1, &clock, None, false).unwrap();
    controller.update(0.0, start + 0.4);
    assert_close(controller.outgoing_group().unwrap().opacity().unwrap(), 0.6);

    clock.set(start + 0.4);
    controller.switch_site(1, &clock, None, true).unwrap();
    controller.update(0.0, start + 0.4);
    assert_close(controller.outgoing_group().unwrap().opacity().unwrap(), 0.6);
    assert_close(controller.incoming_group().unwrap().opacity().unwrap(), 0.0);

    controller.update(0.0, start + 0.9);
    assert_close(controller.outgoing_group().unwrap().opacity().unwrap(), 0.3);

    controller.update(0.0, start + 1.5);
    assert!(controller.outgoing_group().is_none());
    assert_eq!(controller.current_group().unwrap().opacity(), Some(1.0));
}

#[test]
fn abandoned_switch_stops_receiving_load_progress() {
    let loader = ScriptedLoader::deferred();
    let mut controller = controller(&["a", "b"], loader.clone());
    let clock = ManualClock::new();
    let (abandoned_progress, abandoned_events) = progress_recorder();
    let (retry_progress, retry_events) = progress_recorder();

    controller.switch_site(0, &clock, Some(abandoned_progress), false).unwrap();
    controller.update(0.0, 0.1);
    controller.switch_site(0, &clock, Some(retry_progress), true).unwrap();
    controller.update(0.0, 0.2);
    assert_eq!(controller.cache().listeners(&model_url("a")), 1);

    loader.complete(&model_url("a"));
    assert!(abandoned_events.borrow().is_empty());
    assert_eq!(
        *retry_events.borrow(),
        vec![LoadProgress::new(1, 2), LoadProgress::new(2, 2)]
    );
    assert_eq!(loader.calls_for(&model_url("a")), 1);

    controller.update(0.0, 0.3);
    let incoming = controller.incoming_group().unwrap();
    assert!(incoming.root().find("a-model").is_some());
}

#[test]
fn failed_load_shows_placeholder_and_can_be_retried() {
    let loader = ScriptedLoader::new();
    loader.fail_url(&model_url("a"));
    let mut controller = controller(&["a", "b"], loader.clone());
    let mut clock = ManualClock::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    controller.on_load_error(move |error| sink.borrow_mut().push(error.url().to_string()));

    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);

    assert_eq!(*errors.borrow(), vec![model_url("a")]);
    let current = controller.current_group().unwrap();
    let placeholder = current.root().find("placeholder").unwrap();
    assert!(placeholder.mesh().unwrap().materials[0].wireframe);
    assert!(current.root().find("a-model").is_none());
    assert!(!controller.cache().is_cached(&model_url("a")));

    loader.heal_url(&model_url("a"));
    assert!(controller.switch_site(0, &clock, None, true).is_some());
    settle(&mut controller, &mut clock, 0.1);

    assert_eq!(errors.borrow().len(), 1);
    assert_eq!(loader.calls_for(&model_url("a")), 2);
    let current = controller.current_group().unwrap();
    assert!(current.root().find("a-model").is_some());
    assert!(current.root().find("placeholder").is_none());
}

#[test]
fn animation_advances_only_while_idle() {
    let mut controller = controller(&["a", "b"], ScriptedLoader::new());
    let mut clock = ManualClock::new();
    controller.switch_site(0, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    assert_eq!(
        controller.current_group().unwrap().mixer().unwrap().clip_time(MOCK_CLIP),
        Some(0.0)
    );

    clock.advance(0.25);
    controller.update(0.25, clock.elapsed_time());
    let current = controller.current_group().unwrap();
    assert_eq!(current.mixer().unwrap().clip_time(MOCK_CLIP), Some(0.25));
    let body = current.root().find(MOCK_BODY).unwrap();
    assert_close(body.local_transform().position.y, 0.5);
}

#[test]
fn progress_is_forwarded_and_revisits_report_completion_once() {
    let loader = ScriptedLoader::new();
    let mut controller = controller(&["a", "b"], loader.clone());
    let mut clock = ManualClock::new();

    let (progress, events) = progress_recorder();
    controller.switch_site(0, &clock, Some(progress), false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    assert_eq!(
        *events.borrow(),
        vec![LoadProgress::new(1, 2), LoadProgress::new(2, 2)]
    );

    controller.switch_site(1, &clock, None, false).unwrap();
    settle(&mut controller, &mut clock, 0.1);

    let (progress, events) = progress_recorder();
    controller.switch_site(0, &clock, Some(progress), false).unwrap();
    settle(&mut controller, &mut clock, 0.1);
    assert_eq!(*events.borrow(), vec![LoadProgress::complete()]);
    assert_eq!(loader.calls(), 2);
}
