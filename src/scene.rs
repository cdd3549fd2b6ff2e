//! The scene content list shared with the renderer.
//!
//! Groups stay owned by the transition controller; the scene only records
//! which of them are currently part of the rendered content and in what order.

use crate::data_structures::scene_group::{GroupId, SceneGroup};

pub trait Scene {
    fn add(&mut self, group: &SceneGroup);

    fn remove(&mut self, group: &SceneGroup);

    fn contains(&self, id: GroupId) -> bool;
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    content: Vec<GroupId>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group ids in the order they were added.
    pub fn content(&self) -> &[GroupId] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Scene for SceneRegistry {
    fn add(&mut self, group: &SceneGroup) {
        if self.contains(group.id()) {
            log::warn!("{} is already part of the scene", group.id());
            return;
        }
        self.content.push(group.id());
    }

    fn remove(&mut self, group: &SceneGroup) {
        self.content.retain(|&id| id != group.id());
    }

    fn contains(&self, id: GroupId) -> bool {
        self.content.contains(&id)
    }
}
