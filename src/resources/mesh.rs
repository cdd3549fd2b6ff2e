//! Conversion of GLTF documents into scene nodes, materials and clips.

use crate::{
    data_structures::{
        animation::{AnimationChannel, AnimationClip, Keyframes},
        geometry::Geometry,
        instance::Instance,
        material::{Material, TextureSlot},
        scene_graph::{ContainerNode, Mesh, MeshNode, SceneNode},
    },
    resources::texture::texture_ref,
};

/// Name used for a node in the scene graph; animation channels target nodes by it.
pub fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

pub fn to_material(material: gltf::Material, file_name: &str) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let name = material
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}#material{}", file_name, material.index().unwrap_or(0)));
    let mut converted = Material::standard(name, 0xffffff)
        .with_surface(pbr.roughness_factor(), pbr.metallic_factor());
    converted.color = [r, g, b];
    converted.opacity = a;
    converted.transparent = matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend);

    if let Some(info) = pbr.base_color_texture() {
        converted.textures.push(texture_ref(TextureSlot::BaseColor, file_name, info.texture()));
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        converted.textures.push(texture_ref(
            TextureSlot::MetallicRoughness,
            file_name,
            info.texture(),
        ));
    }
    if let Some(normal) = material.normal_texture() {
        converted.textures.push(texture_ref(TextureSlot::Normal, file_name, normal.texture()));
    }
    if let Some(occlusion) = material.occlusion_texture() {
        converted.textures.push(texture_ref(
            TextureSlot::Occlusion,
            file_name,
            occlusion.texture(),
        ));
    }
    if let Some(info) = material.emissive_texture() {
        converted.textures.push(texture_ref(TextureSlot::Emissive, file_name, info.texture()));
    }
    converted
}

fn to_geometry(primitive: &gltf::Primitive, name: &str, buffers: &[Vec<u8>]) -> Option<Geometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_default();
    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    Some(Geometry::new(name, positions, normals, indices))
}

/**
 * Converts `node` and its descendants.
 *
 * A node whose mesh has a single primitive becomes a [`MeshNode`]; a mesh
 * with several primitives becomes a container with one mesh child each.
 * `materials` is indexed by GLTF material index; primitives without one get
 * `default_material`.
 */
pub fn to_scene_node(
    node: gltf::Node,
    buffers: &[Vec<u8>],
    materials: &[Material],
    default_material: &Material,
) -> Box<dyn SceneNode> {
    let name = node_name(&node);
    let transform = Instance::from_decomposed(node.transform().decomposed());

    let mut meshes: Vec<Mesh> = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let material = primitive
                .material()
                .index()
                .and_then(|idx| materials.get(idx))
                .unwrap_or(default_material)
                .clone();
            let geometry_name = mesh.name().unwrap_or(&name).to_string();
            let geometry = to_geometry(&primitive, &geometry_name, buffers);
            if geometry.is_none() {
                log::warn!("primitive {} of mesh {} has no positions", primitive.index(), geometry_name);
            }
            meshes.push(Mesh {
                geometry,
                materials: vec![material],
                cast_shadow: false,
                receive_shadow: false,
            });
        }
    }

    let mut scene_node: Box<dyn SceneNode> = if meshes.len() == 1 {
        let mesh = meshes.remove(0);
        Box::new(MeshNode::new(name, mesh).with_transform(transform))
    } else {
        let mut container = ContainerNode::new(name.clone()).with_transform(transform);
        for (idx, mesh) in meshes.into_iter().enumerate() {
            container
                .children
                .push(Box::new(MeshNode::new(format!("{}#{}", name, idx), mesh)));
        }
        Box::new(container)
    };
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, materials, default_material));
    }
    scene_node
}

pub fn to_animation_clip(animation: gltf::Animation, buffers: &[Vec<u8>]) -> AnimationClip {
    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));
    let mut channels = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let timestamps: Vec<f32> = reader
            .read_inputs()
            .map(|times| times.collect())
            .unwrap_or_default();
        let keyframes = match reader.read_outputs() {
            Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                Keyframes::Translation(translations.map(Into::into).collect())
            }
            Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
            }
            Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                Keyframes::Scale(scales.map(Into::into).collect())
            }
            // TODO: morph target weights need per-mesh weight storage first
            Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
            None => {
                log::warn!("no keyframes found in channel {} of {}", channel.index(), name);
                Keyframes::Other
            }
        };
        if timestamps.is_empty() {
            log::warn!("no timestamps found in channel {} of {}", channel.index(), name);
        }
        channels.push(AnimationChannel {
            target: node_name(&channel.target().node()),
            timestamps,
            keyframes,
        });
    }
    AnimationClip::new(name, channels)
}
