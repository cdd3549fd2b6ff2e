use std::{
    fmt,
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    rc::Rc,
};

use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    data_structures::{
        animation::AnimationClip,
        material::Material,
        scene_graph::{ContainerNode, SceneNode},
    },
    resources::texture::{load_binary, sibling_path},
};

/**
 * This module contains all logic for loading models from external files.
 */
pub mod mesh;
pub mod texture;

/// Progress of one asset load, counted in files (the model plus its external buffers).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl LoadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// The event reported when an asset is served without loading anything.
    pub fn complete() -> Self {
        Self::new(1, 1)
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.loaded.min(self.total) * 100) / self.total) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.loaded >= self.total
    }
}

pub type ProgressCallback = Rc<dyn Fn(LoadProgress)>;

/// A progress callback that ignores every event.
pub fn ignore_progress() -> ProgressCallback {
    Rc::new(|_: LoadProgress| {})
}

/// The raw result of loading a model file.
#[derive(Clone)]
pub struct LoadedAsset {
    pub scene: Box<dyn SceneNode>,
    pub animations: Vec<AnimationClip>,
}

impl fmt::Debug for LoadedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedAsset")
            .field("scene", &self.scene.name())
            .field("nodes", &self.scene.node_count())
            .field("animations", &self.animations.len())
            .finish()
    }
}

pub trait AssetLoader {
    /// Loads the model at `url`, reporting progress as files arrive.
    fn load(
        &self,
        url: &str,
        progress: ProgressCallback,
    ) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>>;
}

/// Loads `.gltf`/`.glb` files from a directory natively or from the page origin on wasm.
#[derive(Clone, Debug)]
pub struct GltfLoader {
    asset_root: PathBuf,
}

impl GltfLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }
}

impl AssetLoader for GltfLoader {
    fn load(
        &self,
        url: &str,
        progress: ProgressCallback,
    ) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>> {
        let asset_root = self.asset_root.clone();
        let url = url.to_owned();
        async move { load_model_gltf(&asset_root, &url, progress.as_ref()).await }.boxed_local()
    }
}

pub async fn load_model_gltf(
    asset_root: &Path,
    file_name: &str,
    progress: &dyn Fn(LoadProgress),
) -> anyhow::Result<LoadedAsset> {
    let gltf_bytes = load_binary(asset_root, file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    let external = gltf
        .buffers()
        .filter(|buffer| matches!(buffer.source(), gltf::buffer::Source::Uri(_)))
        .count() as u64;
    let total = 1 + external;
    let mut loaded = 1;
    progress(LoadProgress::new(loaded, total));

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("{} references a binary chunk it does not contain", file_name)
                })?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(asset_root, &sibling_path(file_name, uri)).await?;
                buffer_data.push(bin);
                loaded += 1;
                progress(LoadProgress::new(loaded, total));
            }
        }
    }

    let materials: Vec<Material> = gltf
        .materials()
        .map(|material| mesh::to_material(material, file_name))
        .collect();
    let default_material = Material::standard(format!("{}#default", file_name), 0xffffff);

    let animations = gltf
        .animations()
        .map(|animation| mesh::to_animation_clip(animation, &buffer_data))
        .collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow::anyhow!("{} contains no scene", file_name))?;
    let mut models: Vec<Box<dyn SceneNode>> = scene
        .nodes()
        .map(|node| mesh::to_scene_node(node, &buffer_data, &materials, &default_material))
        .collect();

    let root_node = if models.len() == 1 {
        models.remove(0)
    } else {
        let mut root_node = ContainerNode::new(file_name);
        root_node.children = models;
        Box::new(root_node)
    };
    log::debug!(
        "loaded {}: {} nodes, {} materials",
        file_name,
        root_node.node_count(),
        materials.len()
    );

    Ok(LoadedAsset {
        scene: root_node,
        animations,
    })
}
