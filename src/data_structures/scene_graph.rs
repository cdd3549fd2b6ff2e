//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait and the two node kinds a site diorama is
//! made of: [`ContainerNode`] for pure grouping and [`MeshNode`] for anything
//! that carries geometry and materials. Visitors walk the graph depth-first
//! via `traverse` / `traverse_mut`, which is how fades and disposal reach
//! every material in a subtree.

use std::fmt::Debug;

use crate::data_structures::{geometry::Geometry, instance::Instance, material::Material};

/// Geometry plus the materials used to shade it.
///
/// Both are optional in practice: loaders may produce meshes without
/// geometry or without materials, and consumers skip whatever is absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub geometry: Option<Geometry>,
    pub materials: Vec<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry: Some(geometry),
            materials: vec![material],
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

pub trait SceneNode: Debug {
    fn name(&self) -> &str;

    fn local_transform(&self) -> &Instance;

    fn local_transform_mut(&mut self) -> &mut Instance;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.get_children_mut().push(child);
    }

    fn mesh(&self) -> Option<&Mesh> {
        None
    }

    fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        None
    }

    /**
     * Deep copy of this node and its whole subtree.
     *
     * Clones never share geometry or materials with their source, so fading
     * or disposing a clone leaves the source untouched.
     */
    fn box_clone(&self) -> Box<dyn SceneNode>;
}

impl Clone for Box<dyn SceneNode> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl<'a> dyn SceneNode + 'a {
    /// Visits this node and then every descendant, depth-first.
    pub fn traverse(&self, visit: &mut dyn FnMut(&dyn SceneNode)) {
        visit(self);
        for child in self.get_children() {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut dyn SceneNode)) {
        visit(self);
        for child in self.get_children_mut().iter_mut() {
            child.traverse_mut(visit);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |_| count += 1);
        count
    }

    pub fn find(&self, name: &str) -> Option<&dyn SceneNode> {
        if self.name() == name {
            return Some(self);
        }
        self.get_children()
            .iter()
            .find_map(|child| child.find(name))
    }
}

#[derive(Clone, Debug)]
pub struct ContainerNode {
    name: String,
    transform: Instance,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Instance::default(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Box<dyn SceneNode>) -> Self {
        self.children.push(child);
        self
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_transform(&self) -> &Instance {
        &self.transform
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.transform
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn box_clone(&self) -> Box<dyn SceneNode> {
        Box::new(self.clone())
    }
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    name: String,
    transform: Instance,
    pub mesh: Mesh,
    children: Vec<Box<dyn SceneNode>>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            transform: Instance::default(),
            mesh,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }
}

impl SceneNode for MeshNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_transform(&self) -> &Instance {
        &self.transform
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.transform
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }

    fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        Some(&mut self.mesh)
    }

    fn box_clone(&self) -> Box<dyn SceneNode> {
        Box::new(self.clone())
    }
}
