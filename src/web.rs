//! Browser bindings.
//!
//! The page owns the render loop: it creates a [`WebTour`], forwards clicks and
//! key presses to it and calls [`WebTour::frame`] from `requestAnimationFrame`.
//! Model loads are polled by those frames, so nothing is spawned here.

use std::{path::PathBuf, rc::Rc};

use wasm_bindgen::prelude::*;

use crate::{
    SystemClock, Tour, TourCommand, TourConfig, controller::SiteSwitch,
    navigation::LoadingState, resources::GltfLoader,
};

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    crate::init_logging().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

#[wasm_bindgen]
pub struct WebTour {
    tour: Tour<SystemClock>,
    last_switch: Option<SiteSwitch>,
}

#[wasm_bindgen]
impl WebTour {
    /// Reads `sites.json` from `catalog_dir` on the page origin. Falls back to
    /// the built-in catalog when it cannot be read.
    pub async fn load(catalog_dir: String) -> WebTour {
        let catalog_dir = PathBuf::from(catalog_dir);
        let config = match TourConfig::load(&catalog_dir, "sites.json").await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}, falling back to the built-in catalog", e);
                TourConfig::default()
            }
        };
        let loader = Rc::new(GltfLoader::new(config.resolve_asset_root(&catalog_dir)));
        WebTour {
            tour: Tour::from_config(&config, loader, SystemClock::new()),
            last_switch: None,
        }
    }

    /// Fades in the first site.
    pub fn begin(&mut self) -> bool {
        let switch = self.tour.start();
        self.accept(switch)
    }

    pub fn next(&mut self) -> bool {
        self.command(TourCommand::Next)
    }

    pub fn previous(&mut self) -> bool {
        self.command(TourCommand::Previous)
    }

    pub fn select(&mut self, index: usize) -> bool {
        self.command(TourCommand::Select(index))
    }

    pub fn key(&mut self, key: char) -> bool {
        self.command(TourCommand::Key(key))
    }

    pub fn retry(&mut self) -> bool {
        self.command(TourCommand::Retry)
    }

    pub fn dismiss_error(&mut self) {
        self.tour.handle(TourCommand::DismissError);
    }

    pub fn frame(&mut self) {
        self.tour.frame();
    }

    pub fn active_index(&self) -> Option<usize> {
        self.tour.navigator().active()
    }

    pub fn is_transitioning(&self) -> bool {
        self.tour.navigator().is_transitioning()
    }

    pub fn loading_percent(&self) -> Option<u8> {
        match self.tour.navigator().loading() {
            LoadingState::Loading { percent } => Some(*percent),
            _ => None,
        }
    }

    pub fn failed_url(&self) -> Option<String> {
        match self.tour.navigator().loading() {
            LoadingState::Failed { url } => Some(url.clone()),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<String> {
        self.tour.navigator().description().map(str::to_string)
    }

    pub fn site_name(&self) -> Option<String> {
        self.last_switch.as_ref().map(|switch| switch.name.clone())
    }

    /// Camera of the last accepted switch as `[px, py, pz, tx, ty, tz]`.
    pub fn camera(&self) -> Option<Vec<f32>> {
        self.last_switch.as_ref().map(|switch| {
            let mut view = switch.camera.position.to_vec();
            view.extend_from_slice(&switch.camera.target);
            view
        })
    }
}

impl WebTour {
    fn command(&mut self, command: TourCommand) -> bool {
        let switch = self.tour.handle(command);
        self.accept(switch)
    }

    fn accept(&mut self, switch: Option<SiteSwitch>) -> bool {
        let accepted = switch.is_some();
        if accepted {
            self.last_switch = switch;
        }
        accepted
    }
}
