//! Tour data structures: scene graphs, materials, animation and site groups.
//!
//! This module contains the core data types for site content:
//!
//! - `instance` holds per-node transformation data
//! - `geometry` contains triangle data and the primitive shapes dioramas use
//! - `material` contains materials and their opacity bookkeeping
//! - `scene_graph` enables hierarchical scene organization
//! - `animation` contains keyframe clips and the mixer playing them
//! - `scene_group` wraps one site's subtree as a fadeable, disposable unit

pub mod animation;
pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod scene_group;
