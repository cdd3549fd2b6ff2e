//! Headless tour: visits every site of the catalog once and reports each
//! transition. Takes the directory holding `sites.json` as its optional first
//! argument.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use std::{path::PathBuf, rc::Rc, time::Duration};

    use tour_ngin::{
        SystemClock, Tour, TourCommand, TourConfig, navigation::LoadingState,
        resources::GltfLoader,
    };

    if let Err(e) = tour_ngin::init_logging() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let catalog_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("OUT_DIR")).join("assets"));
    let config = TourConfig::load(&catalog_dir, "sites.json")
        .await
        .unwrap_or_else(|e| {
            log::warn!("{:#}, falling back to the built-in catalog", e);
            TourConfig::default()
        });

    let asset_root = config.resolve_asset_root(&catalog_dir);
    log::info!("loading models from {}", asset_root.display());
    let loader = Rc::new(GltfLoader::new(asset_root));
    let mut tour = Tour::from_config(&config, loader, SystemClock::new());
    let mut frames = tokio::time::interval(Duration::from_millis(16));

    let mut switch = tour.start();
    let mut visited = 0;
    while let Some(accepted) = switch.take() {
        println!("[{}] {}", accepted.index + 1, accepted.name);
        println!("    {}", accepted.description);
        println!(
            "    camera at {:?} looking at {:?}",
            accepted.camera.position, accepted.camera.target
        );
        loop {
            frames.tick().await;
            tour.frame();
            if !tour.navigator().is_transitioning() {
                break;
            }
        }
        if let LoadingState::Failed { url } = tour.navigator().loading() {
            println!("    (placeholder shown, {} failed to load)", url);
        }
        visited += 1;
        if visited < config.sites.len() {
            tour.handle(TourCommand::DismissError);
            switch = tour.handle(TourCommand::Next);
        }
    }

    println!(
        "visited {} sites, {} models cached",
        visited,
        tour.controller().cache().len()
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
