//! Per-URL model cache.
//!
//! The first request for a URL issues one load through the [`AssetLoader`];
//! every request for the same URL while that load is in flight joins it.
//! A request that is dropped before the load finishes stops receiving its
//! progress. A successful result is kept as a template for the lifetime of the
//! cache and each caller receives its own deep clone. Failures are never
//! stored, so the next request after an error starts a fresh load.
//!
//! Entries are never evicted. The site catalog is small and fixed, so the
//! cache holds at most one template per site model.

use std::{
    cell::RefCell,
    collections::HashMap,
    error::Error,
    fmt,
    rc::Rc,
};

use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared},
};

use crate::{
    data_structures::{animation::AnimationClip, scene_graph::SceneNode},
    resources::{AssetLoader, LoadProgress, LoadedAsset, ProgressCallback},
};

/// A model load that failed. Cheap to clone so every joined request can receive it.
#[derive(Clone, Debug)]
pub struct LoadError {
    url: String,
    source: Rc<anyhow::Error>,
}

impl LoadError {
    pub fn new(url: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            url: url.into(),
            source: Rc::new(source),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {:#}", self.url, self.source)
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&**self.source)
    }
}

/// A clone of a cached model, owned by the caller.
#[derive(Debug)]
pub struct ResolvedModel {
    pub scene: Box<dyn SceneNode>,
    pub animations: Vec<AnimationClip>,
}

impl ResolvedModel {
    fn from_template(template: &LoadedAsset) -> Self {
        Self {
            scene: template.scene.box_clone(),
            animations: template.animations.clone(),
        }
    }
}

pub type ResolveFuture = LocalBoxFuture<'static, Result<ResolvedModel, LoadError>>;

type SharedLoad = Shared<LocalBoxFuture<'static, Result<Rc<LoadedAsset>, LoadError>>>;

type Listeners = Rc<RefCell<Vec<(u64, ProgressCallback)>>>;

struct InFlight {
    id: u64,
    load: SharedLoad,
    listeners: Listeners,
}

/// A request's seat in the progress fan-out of an in-flight load. Leaves on drop.
struct ProgressListener {
    id: u64,
    listeners: Listeners,
}

impl ProgressListener {
    fn join(listeners: &Listeners, id: u64, on_progress: ProgressCallback) -> Self {
        listeners.borrow_mut().push((id, on_progress));
        Self {
            id,
            listeners: Rc::clone(listeners),
        }
    }
}

impl Drop for ProgressListener {
    fn drop(&mut self) {
        self.listeners
            .borrow_mut()
            .retain(|(listener, _)| *listener != self.id);
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Rc<LoadedAsset>>,
    in_flight: HashMap<String, InFlight>,
    loads_issued: u64,
    requests: u64,
}

#[derive(Clone)]
pub struct ModelCache {
    loader: Rc<dyn AssetLoader>,
    state: Rc<RefCell<CacheState>>,
}

impl ModelCache {
    pub fn new(loader: Rc<dyn AssetLoader>) -> Self {
        Self {
            loader,
            state: Rc::new(RefCell::new(CacheState::default())),
        }
    }

    /**
     * Resolves `url` to a fresh clone of its model.
     *
     * Nothing happens until the returned future is polled. A cache hit then
     * reports a single 100% progress event and yields immediately; a miss
     * forwards the loader's progress to `on_progress` and yields once the
     * shared load completes.
     */
    pub fn resolve(&self, url: &str, on_progress: ProgressCallback) -> ResolveFuture {
        let url = url.to_owned();
        let cached = self.state.borrow().entries.get(&url).cloned();
        if let Some(template) = cached {
            log::debug!("cache hit for {}", url);
            return async move {
                on_progress(LoadProgress::complete());
                Ok(ResolvedModel::from_template(&template))
            }
            .boxed_local();
        }

        let cache = self.clone();
        async move {
            let (id, load, _listener) = cache.join_or_start(&url, on_progress);
            let result = load.await;
            let mut state = cache.state.borrow_mut();
            if state.in_flight.get(&url).is_some_and(|in_flight| in_flight.id == id) {
                state.in_flight.remove(&url);
            }
            let template = result?;
            state
                .entries
                .entry(url)
                .or_insert_with(|| Rc::clone(&template));
            Ok(ResolvedModel::from_template(&template))
        }
        .boxed_local()
    }

    fn join_or_start(
        &self,
        url: &str,
        on_progress: ProgressCallback,
    ) -> (u64, SharedLoad, Option<ProgressListener>) {
        let (id, request) = {
            let mut state = self.state.borrow_mut();
            let cached = state.entries.get(url).cloned();
            if let Some(template) = cached {
                drop(state);
                // Stored by a joined request between `resolve` and the first poll.
                on_progress(LoadProgress::complete());
                let ready = futures::future::ready(Ok::<_, LoadError>(template)).boxed_local();
                return (0, ready.shared(), None);
            }
            state.requests += 1;
            let request = state.requests;
            if let Some(in_flight) = state.in_flight.get(url) {
                log::debug!("joining in-flight load of {}", url);
                let listener = ProgressListener::join(&in_flight.listeners, request, on_progress);
                return (in_flight.id, in_flight.load.clone(), Some(listener));
            }
            state.loads_issued += 1;
            (state.loads_issued, request)
        };

        log::debug!("cache miss for {}, loading", url);
        let listeners: Listeners = Rc::new(RefCell::new(Vec::new()));
        let listener = ProgressListener::join(&listeners, request, on_progress);
        let fan_out: ProgressCallback = {
            let listeners = Rc::clone(&listeners);
            Rc::new(move |progress: LoadProgress| {
                let current: Vec<ProgressCallback> = listeners
                    .borrow()
                    .iter()
                    .map(|(_, callback)| Rc::clone(callback))
                    .collect();
                current.iter().for_each(|callback| callback(progress));
            })
        };
        let failed_url = url.to_owned();
        let load = self
            .loader
            .load(url, fan_out)
            .map(move |result| {
                result.map(Rc::new).map_err(|source| {
                    let error = LoadError::new(failed_url, source);
                    log::error!("{}", error);
                    error
                })
            })
            .boxed_local()
            .shared();
        self.state.borrow_mut().in_flight.insert(
            url.to_owned(),
            InFlight {
                id,
                load: load.clone(),
                listeners,
            },
        );
        (id, load, Some(listener))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.state.borrow().entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight.len()
    }

    /// Number of requests still listening to the in-flight load of `url`.
    pub fn listeners(&self, url: &str) -> usize {
        self.state
            .borrow()
            .in_flight
            .get(url)
            .map_or(0, |in_flight| in_flight.listeners.borrow().len())
    }

    /// Number of loads handed to the loader so far.
    pub fn loads_issued(&self) -> u64 {
        self.state.borrow().loads_issued
    }
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ModelCache")
            .field("entries", &state.entries.keys().collect::<Vec<_>>())
            .field("in_flight", &state.in_flight.keys().collect::<Vec<_>>())
            .field("loads_issued", &state.loads_issued)
            .finish()
    }
}
