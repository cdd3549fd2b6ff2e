//! Tour configuration: transition timing, asset location and the site catalog.
//!
//! The catalog is plain JSON so it can ship next to the models, e.g.
//!
//! ```json
//! {
//!   "transition_duration": 1.0,
//!   "asset_root": ".",
//!   "sites": [
//!     { "id": "parrot", "name": "Parrot's Perch", "model_url": "models/Parrot.glb",
//!       "description": "...", "diorama": "jungle", "model_scale": 0.5 }
//!   ]
//! }
//! ```

use std::{collections::HashSet, path::{Path, PathBuf}};

use anyhow::{Context, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::resources::texture::load_string;

pub const DEFAULT_TRANSITION_DURATION: f32 = 1.0;

/// The themed props a site is built from besides its model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Diorama {
    /// Forest ground with a ring of tree trunks.
    Jungle,
    /// Forest ground with a translucent pond.
    Wetland,
    /// Light green ground behind a fence.
    Meadow,
    /// Sand.
    Beach,
    #[default]
    Empty,
}

/// Where the camera should move to when a site becomes active.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct CameraView {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: [0.0, 2.0, 5.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SiteConfig {
    pub id: String,
    pub name: String,
    pub model_url: String,
    pub description: String,
    #[serde(default)]
    pub diorama: Diorama,
    #[serde(default = "default_model_scale")]
    pub model_scale: f32,
    #[serde(default)]
    pub camera: CameraView,
}

fn default_model_scale() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TourConfig {
    pub transition_duration: f32,
    /// Directory model URLs are relative to. A relative root is taken from the
    /// directory the catalog was read from, see [`TourConfig::resolve_asset_root`].
    pub asset_root: PathBuf,
    pub sites: Vec<SiteConfig>,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            transition_duration: DEFAULT_TRANSITION_DURATION,
            asset_root: PathBuf::from("."),
            sites: default_sites(),
        }
    }
}

impl TourConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing tour configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading {}", path.display()))
    }

    /// Reads `file_name` below `asset_root`, from disk natively or from the page origin on wasm.
    pub async fn load(asset_root: &Path, file_name: &str) -> anyhow::Result<Self> {
        let json = load_string(asset_root, file_name).await?;
        Self::from_json_str(&json).with_context(|| format!("loading {}", file_name))
    }

    /// The directory to load models from when the catalog was read from `catalog_dir`.
    pub fn resolve_asset_root(&self, catalog_dir: &Path) -> PathBuf {
        match self.asset_root.as_path() {
            root if root.is_absolute() => root.to_path_buf(),
            root if root.as_os_str().is_empty() || root == Path::new(".") => {
                catalog_dir.to_path_buf()
            }
            root => catalog_dir.join(root),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.transition_duration.is_finite() && self.transition_duration > 0.0,
            "transition_duration must be positive, got {}",
            self.transition_duration
        );
        ensure!(!self.sites.is_empty(), "the site catalog is empty");
        let mut ids = HashSet::new();
        for site in &self.sites {
            if !ids.insert(site.id.as_str()) {
                bail!("duplicate site id '{}'", site.id);
            }
            ensure!(!site.model_url.is_empty(), "site '{}' has no model_url", site.id);
            ensure!(
                site.model_scale > 0.0,
                "site '{}' has a non-positive model_scale",
                site.id
            );
        }
        Ok(())
    }
}

fn site(
    id: &str,
    name: &str,
    model_url: &str,
    description: &str,
    diorama: Diorama,
    model_scale: f32,
) -> SiteConfig {
    SiteConfig {
        id: id.to_string(),
        name: name.to_string(),
        model_url: model_url.to_string(),
        description: description.to_string(),
        diorama,
        model_scale,
        camera: CameraView::default(),
    }
}

/// The four animal dioramas the tour ships with.
pub fn default_sites() -> Vec<SiteConfig> {
    vec![
        site(
            "parrot",
            "Parrot's Perch",
            "models/Parrot.glb",
            "A colorful parrot rests in a lush, jungle-like clearing. The vibrant foliage and ancient trees create a serene, natural atmosphere.",
            Diorama::Jungle,
            0.5,
        ),
        site(
            "stork",
            "Stork's Sanctuary",
            "models/Stork.glb",
            "A white stork wades gracefully through the wetland sanctuary. Its long legs move slowly through the water as it hunts.",
            Diorama::Wetland,
            1.0,
        ),
        site(
            "horse",
            "Horse's Meadow",
            "models/Horse.glb",
            "A majestic horse stands in a wide, open meadow. A rustic fence lines the field, adding to the pastoral charm.",
            Diorama::Meadow,
            0.5,
        ),
        site(
            "flamingo",
            "Flamingo Beach",
            "models/Flamingo.glb",
            "A graceful flamingo wades in the shallow waters of a sandy beach. The sun glistens on its vibrant pink feathers.",
            Diorama::Beach,
            0.5,
        ),
    ]
}
