//! Site switching and the crossfade between site groups.
//!
//! The controller owns up to three [`SceneGroup`]s at a time:
//!
//! - `current`: the site shown while idle,
//! - `incoming`: the site fading in during a transition,
//! - `outgoing`: the site fading out during a transition.
//!
//! A switch moves `current` to `outgoing`, builds the target site into
//! `incoming` at opacity 0 and starts the clock. Every [`TransitionController::update`]
//! then blends both groups until the duration has passed, at which point the
//! outgoing group is removed and disposed and the incoming one is promoted.
//!
//! ```text
//! Idle --switch(valid)--------------> Transitioning --progress >= 1--> Idle
//! Idle --switch(invalid index)------> Idle
//! Idle --switch(current, !force)----> Idle
//! Transitioning --switch(!force)----> Transitioning
//! Transitioning --switch(force)-----> Transitioning (crossfade re-targeted)
//! ```

use std::{error::Error, fmt, rc::Rc};

use crate::{
    cache::{LoadError, ModelCache},
    clock::Clock,
    config::{CameraView, TourConfig},
    data_structures::scene_group::SceneGroup,
    resources::{AssetLoader, ProgressCallback, ignore_progress},
    scene::{Scene, SceneRegistry},
    site::Site,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionState {
    Idle,
    Transitioning { start: f32, duration: f32 },
}

/// What the caller needs to update its UI and camera after an accepted switch.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteSwitch {
    pub index: usize,
    pub name: String,
    pub description: String,
    /// Where the camera should move to while the crossfade runs.
    pub camera: CameraView,
}

/// Why a switch request was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchRejection {
    InvalidIndex { index: usize, site_count: usize },
    AlreadyTransitioning { requested: usize },
    AlreadyCurrent { index: usize },
}

impl fmt::Display for SwitchRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { index, site_count } => {
                write!(f, "site index {} is out of range (0..{})", index, site_count)
            }
            Self::AlreadyTransitioning { requested } => {
                write!(f, "switch to site {} ignored, a transition is in progress", requested)
            }
            Self::AlreadyCurrent { index } => write!(f, "site {} is already shown", index),
        }
    }
}

impl Error for SwitchRejection {}

pub struct TransitionController<S: Scene = SceneRegistry> {
    sites: Vec<Site>,
    cache: ModelCache,
    scene: S,
    duration: f32,
    state: TransitionState,
    current_index: Option<usize>,
    current: Option<SceneGroup>,
    incoming: Option<SceneGroup>,
    outgoing: Option<SceneGroup>,
    /// Opacity the outgoing group fades down from; below 1 after a forced restart.
    outgoing_from: f32,
    on_complete: Option<Box<dyn FnMut()>>,
    on_load_error: Option<Box<dyn FnMut(&LoadError)>>,
}

impl TransitionController<SceneRegistry> {
    /// Controller over the configured catalog, loading models through `loader`.
    pub fn from_config(config: &TourConfig, loader: Rc<dyn AssetLoader>) -> Self {
        let sites = config.sites.iter().cloned().map(Site::from_config).collect();
        Self::new(sites, ModelCache::new(loader), SceneRegistry::new())
            .with_duration(config.transition_duration)
    }
}

impl<S: Scene> TransitionController<S> {
    pub fn new(sites: Vec<Site>, cache: ModelCache, scene: S) -> Self {
        Self {
            sites,
            cache,
            scene,
            duration: crate::config::DEFAULT_TRANSITION_DURATION,
            state: TransitionState::Idle,
            current_index: None,
            current: None,
            incoming: None,
            outgoing: None,
            outgoing_from: 1.0,
            on_complete: None,
            on_load_error: None,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    /// Called once each time a crossfade finishes.
    pub fn on_transition_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Called when a site model fails to load and its placeholder is attached.
    pub fn on_load_error(&mut self, callback: impl FnMut(&LoadError) + 'static) {
        self.on_load_error = Some(Box::new(callback));
    }

    /**
     * Starts a crossfade to site `index`.
     *
     * Out-of-range indices are always rejected. Without `force`, requests
     * during a running transition and requests for the site already shown are
     * rejected too. `force` restarts the crossfade to the requested site, which
     * is how a failed load is retried.
     */
    pub fn try_switch_site(
        &mut self,
        index: usize,
        clock: &dyn Clock,
        on_progress: Option<ProgressCallback>,
        force: bool,
    ) -> Result<SiteSwitch, SwitchRejection> {
        if index >= self.sites.len() {
            return Err(SwitchRejection::InvalidIndex {
                index,
                site_count: self.sites.len(),
            });
        }
        if self.is_transitioning() && !force {
            return Err(SwitchRejection::AlreadyTransitioning { requested: index });
        }
        if !self.is_transitioning() && self.current_index == Some(index) && !force {
            return Err(SwitchRejection::AlreadyCurrent { index });
        }

        // A forced restart abandons the group that was fading in.
        if let Some(mut abandoned) = self.incoming.take() {
            self.scene.remove(&abandoned);
            abandoned.dispose();
        }
        if let Some(mut current) = self.current.take() {
            if let Some(mixer) = current.mixer_mut() {
                mixer.stop_all();
            }
            if let Some(mut stale) = self.outgoing.replace(current) {
                self.scene.remove(&stale);
                stale.dispose();
            }
            self.outgoing_from = 1.0;
        } else if let Some(outgoing) = self.outgoing.as_ref() {
            // Re-targeted crossfade: keep fading from where the group is now.
            self.outgoing_from = outgoing.opacity().unwrap_or(1.0);
        }

        let site = &self.sites[index];
        let mut incoming = site.build(&self.cache, on_progress.unwrap_or_else(ignore_progress));
        incoming.set_opacity(0.0);
        self.scene.add(&incoming);
        log::info!(
            "switching to site {} ({}) via {}",
            index,
            site.name,
            incoming.id()
        );
        let switch = SiteSwitch {
            index,
            name: site.name.clone(),
            description: site.description.clone(),
            camera: site.camera,
        };

        self.incoming = Some(incoming);
        self.current_index = Some(index);
        self.state = TransitionState::Transitioning {
            start: clock.elapsed_time(),
            duration: self.duration,
        };
        Ok(switch)
    }

    /// Like [`Self::try_switch_site`], but rejections are logged and turned into `None`.
    pub fn switch_site(
        &mut self,
        index: usize,
        clock: &dyn Clock,
        on_progress: Option<ProgressCallback>,
        force: bool,
    ) -> Option<SiteSwitch> {
        match self.try_switch_site(index, clock, on_progress, force) {
            Ok(switch) => Some(switch),
            Err(rejection) => {
                log::warn!("{}", rejection);
                None
            }
        }
    }

    /// Advances loads, animation and the crossfade by one tick.
    pub fn update(&mut self, delta: f32, elapsed: f32) {
        self.poll_loads();
        match self.state {
            TransitionState::Idle => {
                if let Some(current) = self.current.as_mut() {
                    current.animate(delta);
                }
            }
            TransitionState::Transitioning { start, duration } => {
                let progress = if duration > 0.0 {
                    ((elapsed - start) / duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                if let Some(outgoing) = self.outgoing.as_mut() {
                    outgoing.set_opacity(self.outgoing_from * (1.0 - progress));
                }
                if let Some(incoming) = self.incoming.as_mut() {
                    incoming.set_opacity(progress);
                }
                if progress >= 1.0 {
                    self.complete_transition();
                }
            }
        }
    }

    fn poll_loads(&mut self) {
        let mut failures = Vec::new();
        for group in [self.incoming.as_mut(), self.current.as_mut()]
            .into_iter()
            .flatten()
        {
            match group.poll_pending() {
                Some(Ok(())) => log::debug!("model attached to {}", group.id()),
                Some(Err(error)) => {
                    log::warn!("{} shows a placeholder: {}", group.id(), error);
                    failures.push(error);
                }
                None => {}
            }
        }
        if let Some(callback) = self.on_load_error.as_mut() {
            failures.iter().for_each(|error| callback(error));
        }
    }

    fn complete_transition(&mut self) {
        if let Some(mut outgoing) = self.outgoing.take() {
            self.scene.remove(&outgoing);
            outgoing.dispose();
        }
        self.current = self.incoming.take();
        self.state = TransitionState::Idle;
        log::info!("transition to site {:?} complete", self.current_index);
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Index of the site shown or being faded in; `None` before the first switch.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_site(&self) -> Option<&Site> {
        self.current_index.and_then(|index| self.sites.get(index))
    }

    pub fn current_group(&self) -> Option<&SceneGroup> {
        self.current.as_ref()
    }

    pub fn incoming_group(&self) -> Option<&SceneGroup> {
        self.incoming.as_ref()
    }

    pub fn outgoing_group(&self) -> Option<&SceneGroup> {
        self.outgoing.as_ref()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn transition_duration(&self) -> f32 {
        self.duration
    }
}

impl<S: Scene + fmt::Debug> fmt::Debug for TransitionController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionController")
            .field("sites", &self.sites.len())
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("current", &self.current)
            .field("incoming", &self.incoming)
            .field("outgoing", &self.outgoing)
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}
