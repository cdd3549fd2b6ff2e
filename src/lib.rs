//! tour-ngin
//!
//! The headless core of a cross-platform 3D virtual tour. A tour is a fixed
//! catalog of sites; each site is a small diorama built around a GLTF model.
//! Switching sites crossfades the old diorama out and the new one in, while
//! models are loaded once per URL and cloned for every later visit.
//!
//! High-level modules
//! - `cache`: per-URL model cache with request coalescing
//! - `clock`: time sources for transitions and animation
//! - `config`: tour and site configuration (serde/JSON)
//! - `controller`: the site transition state machine
//! - `data_structures`: scene graph, materials, geometry, animation and site groups
//! - `navigation`: UI-facing navigation and loading state
//! - `resources`: GLTF loading
//! - `scene`: the rendered content list
//! - `site`: site descriptors and diorama factories
//! - `tour`: command routing for an interactive tour
//! - `web`: browser bindings (wasm32 only)
//!

pub mod cache;
pub mod clock;
pub mod config;
pub mod controller;
pub mod data_structures;
pub mod navigation;
pub mod resources;
pub mod scene;
pub mod site;
pub mod tour;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use cache::{LoadError, ModelCache};
pub use clock::{Clock, SystemClock};
pub use config::{SiteConfig, TourConfig};
pub use controller::{SiteSwitch, SwitchRejection, TransitionController, TransitionState};
pub use tour::{Tour, TourCommand};

/// Installs the platform logger: `env_logger` natively, the browser console on wasm.
pub fn init_logging() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::try_init()?;

    #[cfg(target_arch = "wasm32")]
    console_log::init_with_level(log::Level::Info)?;

    Ok(())
}
