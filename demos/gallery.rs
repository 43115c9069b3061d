//! Runs the gallery offscreen for a few frames.
//!
//! With a directory argument, the village catalog is loaded from `<dir>/obj/`.
//! Without one, two small built-in models are used.

use model_gallery::prelude::*;
use std::rc::Rc;

const PYRAMID_OBJ: &str = "\
mtllib pyramid.mtl
v -1 0 -1
v 1 0 -1
v 1 0 1
v -1 0 1
v 0 2 0
usemtl stone
f 1 2 3 4
usemtl roof
f 1 5 2
f 2 5 3
f 3 5 4
f 4 5 1
";

const PYRAMID_MTL: &str = "\
newmtl stone
Kd 0.6 0.6 0.55
Ka 0.2 0.2 0.2
newmtl roof
Kd 0.7 0.2 0.1
Ns 50
";

const PRISM_OBJ: &str = "\
v 0 0 0 1 0 0
v 2 0 0 0 1 0
v 1 0 2 0 0 1
v 0 1 0 1 1 0
v 2 1 0 0 1 1
v 1 1 2 1 0 1
f 1 2 3
f 4 6 5
f 1 4 5 2
f 2 5 6 3
f 3 6 4 1
";

async fn run<F: AssetFetcher>(catalog: Catalog, fetcher: F) {
    let config = ViewerConfig {
        shading: ShadingParams::default().with_toon(0.4),
        ..ViewerConfig::default()
    };
    let scheduler = Rc::new(ManualScheduler::new());
    let factory = WgpuBackendFactory::new(&config);
    let mut gallery = InstanceRegistry::new(catalog, config, fetcher, factory, scheduler.clone());

    let running = gallery.start().await;
    log::info!("{} thumbnails running", running);

    for index in 0..gallery.catalog().len() {
        match gallery.select(index).await {
            Ok(entry) => log::info!("selected entry {}", entry),
            Err(e) => log::error!("{}", e),
        }
        gallery.apply_slider(SliderInput::Rotation(30.0));
        gallery.apply_slider(SliderInput::ScaleX(1.5));

        for frame in 0..10 {
            let _ = scheduler.run_frame_at(index as f64 * 1000.0 + frame as f64 * 16.0);
        }
    }

    if !gallery.selected().is_empty() {
        if let Err(e) = gallery.reactivate(0) {
            log::error!("{}", e);
        }
    }

    gallery.shutdown();
}

fn main() {
    env_logger::init();

    match std::env::args().nth(1) {
        Some(dir) => pollster::block_on(run(Catalog::village(), FileFetcher::new(dir))),
        None => {
            let fetcher = MemoryFetcher::new()
                .with("pyramid.obj", PYRAMID_OBJ)
                .with("pyramid.mtl", PYRAMID_MTL)
                .with("prism.obj", PRISM_OBJ);
            let catalog = Catalog::new(vec![
                CatalogEntry::new("pyramid.obj", "Pyramid"),
                CatalogEntry::new("prism.obj", "Prism"),
            ]);
            pollster::block_on(run(catalog, fetcher))
        }
    }
}
