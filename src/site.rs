//! Sites: immutable descriptors and the factories that build their dioramas.

use std::fmt;

use futures::FutureExt;

use crate::{
    cache::ModelCache,
    config::{CameraView, Diorama, SiteConfig},
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::Material,
        scene_graph::{ContainerNode, Mesh, MeshNode, SceneNode},
        scene_group::{ModelAttachment, PendingModel, SceneGroup},
    },
    resources::ProgressCallback,
};

/// Builds the content of a site. Called once per switch to that site.
pub type SiteFactory = Box<dyn Fn(&Site, &ModelCache, ProgressCallback) -> SceneGroup>;

pub struct Site {
    pub id: String,
    pub name: String,
    pub model_url: String,
    pub description: String,
    pub diorama: Diorama,
    pub model_scale: f32,
    pub camera: CameraView,
    factory: SiteFactory,
}

impl Site {
    /// A site built with the standard diorama factory.
    pub fn from_config(config: SiteConfig) -> Self {
        Self::with_factory(config, Box::new(build_diorama))
    }

    pub fn with_factory(config: SiteConfig, factory: SiteFactory) -> Self {
        Self {
            id: config.id,
            name: config.name,
            model_url: config.model_url,
            description: config.description,
            diorama: config.diorama,
            model_scale: config.model_scale,
            camera: config.camera,
            factory,
        }
    }

    pub fn build(&self, cache: &ModelCache, on_progress: ProgressCallback) -> SceneGroup {
        (self.factory)(self, cache, on_progress)
    }
}

// Dummy impl, the factory is opaque
impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model_url", &self.model_url)
            .field("diorama", &self.diorama)
            .finish_non_exhaustive()
    }
}

const FOREST_GREEN: u32 = 0x228b22;
const SANDY_BROWN: u32 = 0xf4a460;
const LIGHT_GREEN: u32 = 0x90ee90;
const SADDLE_BROWN: u32 = 0x8b4513;
const STEEL_BLUE: u32 = 0x4682b4;
const PLACEHOLDER_RED: u32 = 0xff0000;

const GROUND_SIZE: f32 = 20.0;
const GROUND_LEVEL: f32 = -1.0;

/**
 * The standard factory: ground and props for the site's diorama, plus the
 * model requested through `cache`.
 *
 * The returned group has the model load pending; the transition controller
 * attaches the model (or a placeholder) once the load settles.
 */
pub fn build_diorama(site: &Site, cache: &ModelCache, on_progress: ProgressCallback) -> SceneGroup {
    let mut group = SceneGroup::new(site.id.as_str());
    for prop in diorama_props(site.diorama) {
        group.add(prop);
    }
    group.set_pending(load_model(site, cache, on_progress));
    group
}

/// Requests the site model and turns the outcome into something attachable.
pub fn load_model(site: &Site, cache: &ModelCache, on_progress: ProgressCallback) -> PendingModel {
    let resolve = cache.resolve(&site.model_url, on_progress);
    let scale = site.model_scale;
    let name = format!("{}-model", site.id);
    async move {
        match resolve.await {
            Ok(resolved) => {
                let mut model = resolved.scene;
                model.traverse_mut(&mut |node| {
                    if let Some(mesh) = node.mesh_mut() {
                        mesh.cast_shadow = true;
                    }
                });
                let mount = ContainerNode::new(name)
                    .with_transform(Instance::at(0.0, GROUND_LEVEL, 0.0).with_uniform_scale(scale))
                    .with_child(model);
                ModelAttachment::Loaded {
                    model: Box::new(mount),
                    animations: resolved.animations,
                }
            }
            Err(error) => ModelAttachment::Placeholder {
                node: placeholder(scale),
                error,
            },
        }
    }
    .boxed_local()
}

/// Red wireframe unit box shown in place of a model that failed to load.
pub fn placeholder(scale: f32) -> Box<dyn SceneNode> {
    let mesh = Mesh::new(
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::standard("placeholder", PLACEHOLDER_RED).with_wireframe(),
    );
    Box::new(MeshNode::new("placeholder", mesh).with_transform(Instance::default().with_uniform_scale(scale)))
}

fn ground(color: u32) -> Box<dyn SceneNode> {
    let mut mesh = Mesh::new(
        Geometry::plane(GROUND_SIZE),
        Material::standard("ground", color).with_surface(0.8, 0.2),
    );
    mesh.receive_shadow = true;
    Box::new(MeshNode::new("ground", mesh).with_transform(Instance::at(0.0, GROUND_LEVEL, 0.0)))
}

fn props(name: &str, count: u32, geometry: Geometry, color: u32, position: impl Fn(u32) -> Instance) -> Vec<Box<dyn SceneNode>> {
    (0..count)
        .map(|i| {
            let mut mesh = Mesh::new(geometry.clone(), Material::standard(name, color));
            mesh.cast_shadow = true;
            Box::new(MeshNode::new(format!("{}-{}", name, i), mesh).with_transform(position(i)))
                as Box<dyn SceneNode>
        })
        .collect()
}

fn diorama_props(diorama: Diorama) -> Vec<Box<dyn SceneNode>> {
    match diorama {
        Diorama::Jungle => {
            let mut nodes = vec![ground(FOREST_GREEN)];
            // Trunks on a golden-angle spiral so they spread without overlapping.
            nodes.extend(props(
                "tree",
                5,
                Geometry::cylinder(0.1, 0.2, 2.0, 8),
                SADDLE_BROWN,
                |i| {
                    let angle = i as f32 * 2.399_963;
                    let radius = 2.0 + i as f32 * 0.6;
                    Instance::at(radius * angle.cos(), 0.0, radius * angle.sin())
                },
            ));
            nodes
        }
        Diorama::Wetland => {
            let pond = Mesh::new(
                Geometry::disc(5.0, 32),
                Material::standard("pond", STEEL_BLUE).with_opacity(0.7),
            );
            vec![
                ground(FOREST_GREEN),
                Box::new(MeshNode::new("pond", pond).with_transform(Instance::at(0.0, -0.9, 0.0))),
            ]
        }
        Diorama::Meadow => {
            let mut nodes = vec![ground(LIGHT_GREEN)];
            nodes.extend(props(
                "fence-post",
                10,
                Geometry::cuboid(0.1, 0.5, 0.1),
                SADDLE_BROWN,
                |i| Instance::at(-5.0 + i as f32, -0.75, -5.0),
            ));
            nodes
        }
        Diorama::Beach => vec![ground(SANDY_BROWN)],
        Diorama::Empty => Vec::new(),
    }
}

