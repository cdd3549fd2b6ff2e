//! Site content as a single owned, fadeable unit.
//!
//! A [`SceneGroup`] wraps the root of one site's subtree together with the
//! state a crossfade needs: the last opacity factor applied, an optional
//! [`AnimationMixer`] and the model load that may still be in flight.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};

use futures::{FutureExt, future::LocalBoxFuture, task::noop_waker_ref};

use crate::{
    cache::LoadError,
    data_structures::{
        animation::{AnimationClip, AnimationMixer},
        material::Material,
        scene_graph::{ContainerNode, SceneNode},
    },
};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// What a finished model load contributes to its group.
pub enum ModelAttachment {
    Loaded {
        model: Box<dyn SceneNode>,
        animations: Vec<AnimationClip>,
    },
    /// Stand-in visual for a model that failed to load.
    Placeholder {
        node: Box<dyn SceneNode>,
        error: LoadError,
    },
}

pub type PendingModel = LocalBoxFuture<'static, ModelAttachment>;

/// Resources released by one [`SceneGroup::dispose`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

pub struct SceneGroup {
    id: GroupId,
    root: Box<dyn SceneNode>,
    mixer: Option<AnimationMixer>,
    opacity: Option<f32>,
    pending: Option<PendingModel>,
    disposed: bool,
}

impl SceneGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_root(Box::new(ContainerNode::new(name)))
    }

    pub fn from_root(root: Box<dyn SceneNode>) -> Self {
        Self {
            id: GroupId(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed)),
            root,
            mixer: None,
            opacity: None,
            pending: None,
            disposed: false,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn root(&self) -> &dyn SceneNode {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> &mut dyn SceneNode {
        self.root.as_mut()
    }

    /// Adds `node` below the root. If a fade is already running the node joins it at the current factor.
    pub fn add(&mut self, mut node: Box<dyn SceneNode>) {
        if let Some(factor) = self.opacity {
            fade_subtree(node.as_mut(), factor);
        }
        self.root.add_child(node);
    }

    /// Last fade factor applied, `None` if the group was never faded.
    pub fn opacity(&self) -> Option<f32> {
        self.opacity
    }

    /// Fades every material in the group. See [`crate::data_structures::material::Material::apply_fade`].
    pub fn set_opacity(&mut self, factor: f32) {
        self.opacity = Some(factor);
        fade_subtree(self.root.as_mut(), factor);
    }

    pub fn for_each_material(&self, mut visit: impl FnMut(&Material)) {
        self.root.traverse(&mut |node| {
            if let Some(mesh) = node.mesh() {
                mesh.materials.iter().for_each(&mut visit);
            }
        });
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn mixer_mut(&mut self) -> Option<&mut AnimationMixer> {
        self.mixer.as_mut()
    }

    pub fn set_mixer(&mut self, mixer: AnimationMixer) {
        self.mixer = Some(mixer);
    }

    /// Advances the animation driver, if any, by `delta`.
    pub fn animate(&mut self, delta: f32) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.update(delta, self.root.as_mut());
        }
    }

    pub fn set_pending(&mut self, pending: PendingModel) {
        self.pending = Some(pending);
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending.is_some()
    }

    /**
     * Polls the in-flight model load once without blocking.
     *
     * Returns `None` while nothing finished in this call, `Some(Ok(()))` when
     * the model was attached and `Some(Err(_))` when a placeholder took its place.
     */
    pub fn poll_pending(&mut self) -> Option<Result<(), LoadError>> {
        let pending = self.pending.as_mut()?;
        let mut cx = Context::from_waker(noop_waker_ref());
        let Poll::Ready(attachment) = pending.poll_unpin(&mut cx) else {
            return None;
        };
        self.pending = None;
        match attachment {
            ModelAttachment::Loaded { model, animations } => {
                self.add(model);
                if !animations.is_empty() {
                    self.mixer = Some(AnimationMixer::new(animations));
                }
                Some(Ok(()))
            }
            ModelAttachment::Placeholder { node, error } => {
                self.add(node);
                Some(Err(error))
            }
        }
    }

    /**
     * Releases geometry, materials and textures of the whole subtree and
     * detaches the animation driver. Already released resources are skipped.
     */
    pub fn dispose(&mut self) -> DisposeReport {
        if let Some(mut mixer) = self.mixer.take() {
            mixer.stop_all();
            mixer.uncache_root();
        }
        self.pending = None;
        let mut report = DisposeReport::default();
        self.root.traverse_mut(&mut |node| {
            let Some(mesh) = node.mesh_mut() else {
                return;
            };
            if let Some(geometry) = mesh.geometry.as_mut() {
                if geometry.dispose() {
                    report.geometries += 1;
                }
            }
            for material in mesh.materials.iter_mut() {
                if !material.is_disposed() {
                    report.textures += material.dispose();
                    report.materials += 1;
                }
            }
        });
        if !self.disposed {
            log::debug!("disposed {} ({}): {:?}", self.id, self.name(), report);
        }
        self.disposed = true;
        report
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl fmt::Debug for SceneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGroup")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("opacity", &self.opacity)
            .field("pending", &self.pending.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn fade_subtree(root: &mut dyn SceneNode, factor: f32) {
    root.traverse_mut(&mut |node| {
        if let Some(mesh) = node.mesh_mut() {
            mesh.materials
                .iter_mut()
                .for_each(|material| material.apply_fade(factor));
        }
    });
}
