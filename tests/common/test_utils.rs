use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    future::Future,
    rc::Rc,
    task::{Context, Poll},
};

use futures::{
    FutureExt,
    channel::oneshot,
    future::LocalBoxFuture,
    task::noop_waker_ref,
};
use tour_ngin::{
    clock::Clock,
    config::{Diorama, SiteConfig},
    controller::TransitionController,
    data_structures::{
        animation::{AnimationChannel, AnimationClip, Keyframes},
        geometry::Geometry,
        material::Material,
        scene_graph::{ContainerNode, Mesh, MeshNode},
    },
    resources::{AssetLoader, LoadProgress, LoadedAsset, ProgressCallback},
    site::Site,
    ModelCache,
    scene::SceneRegistry,
};

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    now: f32,
    last: f32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f32) {
        self.now += seconds;
    }

    pub fn set(&mut self, now: f32) {
        self.now = now;
    }
}

impl Clock for ManualClock {
    fn elapsed_time(&self) -> f32 {
        self.now
    }

    fn delta(&mut self) -> f32 {
        let delta = self.now - self.last;
        self.last = self.now;
        delta
    }
}

/// Name of the node every mock model animates.
pub(crate) const MOCK_BODY: &str = "Body";
pub(crate) const MOCK_CLIP: &str = "Idle";

/**
 * A model with one half-transparent and one opaque material on a node called
 * [`MOCK_BODY`] and a one second translation clip targeting it.
 */
pub(crate) fn mock_asset(url: &str) -> LoadedAsset {
    let mut mesh = Mesh::new(
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::standard("glass", 0x88ccff).with_opacity(0.5),
    );
    mesh.materials.push(Material::standard("skin", 0xffffff));
    let scene = ContainerNode::new(format!("model:{}", url))
        .with_child(Box::new(MeshNode::new(MOCK_BODY, mesh)));
    let clip = AnimationClip::new(
        MOCK_CLIP,
        vec![AnimationChannel {
            target: MOCK_BODY.to_string(),
            timestamps: vec![0.0, 1.0],
            keyframes: Keyframes::Translation(vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(0.0, 2.0, 0.0),
            ]),
        }],
    );
    LoadedAsset {
        scene: Box::new(scene),
        animations: vec![clip],
    }
}

type Deferred = (String, ProgressCallback, oneshot::Sender<anyhow::Result<LoadedAsset>>);

/**
 * Loader that serves [`mock_asset`]s and counts every load it is asked for.
 *
 * URLs in the failing set error out. In deferred mode loads stay pending
 * until [`ScriptedLoader::complete`] or [`ScriptedLoader::fail`] is called.
 */
#[derive(Default)]
pub(crate) struct ScriptedLoader {
    calls: RefCell<Vec<String>>,
    failing: RefCell<HashSet<String>>,
    deferred: Cell<bool>,
    pending: RefCell<Vec<Deferred>>,
}

impl ScriptedLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn deferred() -> Rc<Self> {
        let loader = Self::default();
        loader.deferred.set(true);
        Rc::new(loader)
    }

    pub fn fail_url(&self, url: &str) {
        self.failing.borrow_mut().insert(url.to_string());
    }

    pub fn heal_url(&self, url: &str) {
        self.failing.borrow_mut().remove(url);
    }

    pub fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|call| *call == url).count()
    }

    /// Finishes the oldest deferred load of `url`, reporting two progress steps first.
    pub fn complete(&self, url: &str) {
        let (url, progress, sender) = self.take_pending(url);
        progress(LoadProgress::new(1, 2));
        progress(LoadProgress::new(2, 2));
        let _ = sender.send(Ok(mock_asset(&url)));
    }

    pub fn fail(&self, url: &str) {
        let (url, _, sender) = self.take_pending(url);
        let _ = sender.send(Err(anyhow::anyhow!("scripted failure for {}", url)));
    }

    fn take_pending(&self, url: &str) -> Deferred {
        let mut pending = self.pending.borrow_mut();
        let position = pending
            .iter()
            .position(|(pending_url, _, _)| pending_url == url)
            .expect("no deferred load for this url");
        pending.remove(position)
    }
}

impl AssetLoader for ScriptedLoader {
    fn load(
        &self,
        url: &str,
        progress: ProgressCallback,
    ) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>> {
        self.calls.borrow_mut().push(url.to_string());
        let url = url.to_string();
        if self.failing.borrow().contains(&url) {
            return async move { Err(anyhow::anyhow!("scripted failure for {}", url)) }.boxed_local();
        }
        if self.deferred.get() {
            let (sender, receiver) = oneshot::channel();
            self.pending.borrow_mut().push((url, progress, sender));
            return async move {
                match receiver.await {
                    Ok(result) => result,
                    Err(canceled) => Err(canceled.into()),
                }
            }
            .boxed_local();
        }
        async move {
            progress(LoadProgress::new(1, 2));
            progress(LoadProgress::new(2, 2));
            Ok(mock_asset(&url))
        }
        .boxed_local()
    }
}

/// Records every progress event it receives.
pub(crate) fn progress_recorder() -> (ProgressCallback, Rc<RefCell<Vec<LoadProgress>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let callback: ProgressCallback =
        Rc::new(move |progress: LoadProgress| sink.borrow_mut().push(progress));
    (callback, events)
}

pub(crate) fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    future.poll_unpin(&mut Context::from_waker(noop_waker_ref()))
}

pub(crate) fn model_url(id: &str) -> String {
    format!("models/{}.glb", id)
}

pub(crate) fn site_config(id: &str, diorama: Diorama) -> SiteConfig {
    SiteConfig {
        id: id.to_string(),
        name: format!("Site {}", id.to_uppercase()),
        model_url: model_url(id),
        description: format!("The {} diorama.", id),
        diorama,
        model_scale: 1.0,
        camera: Default::default(),
    }
}

/// A controller over one empty diorama per id, loading through `loader`.
pub(crate) fn controller(ids: &[&str], loader: Rc<ScriptedLoader>) -> TransitionController {
    let sites = ids
        .iter()
        .map(|id| Site::from_config(site_config(id, Diorama::Empty)))
        .collect();
    TransitionController::new(sites, ModelCache::new(loader), SceneRegistry::new())
}

/// Runs frames of `step` seconds until the running transition completes.
pub(crate) fn settle(controller: &mut TransitionController, clock: &mut ManualClock, step: f32) {
    for _ in 0..1000 {
        if !controller.is_transitioning() {
            return;
        }
        clock.advance(step);
        let delta = clock.delta();
        controller.update(delta, clock.elapsed_time());
    }
    panic!("transition did not settle");
}
