/*!
# Model gallery

A thumbnail gallery and a main viewport for Wavefront OBJ models and their MTL
materials, drawn with [wgpu](https://wgpu.rs).

Every entry of a [`Catalog`](config::Catalog) gets a small canvas where its model
spins forever. Selecting an entry shows it in the main viewport, where sliders
translate, rotate and scale it, and appends it to a list of selected models from
which earlier transforms can be brought back.

## Features

* OBJ and MTL parsing, with materials fetched next to the model.
* Automatic framing: each model is centered and the camera backs off until its
  bounding box fits.
* One directional light plus one light at the camera, with optional toon shading.
* A single GPU device shared by every canvas of the page.
* Viewers that are disposed for good: a disposed viewer never draws again, even if
  a frame was already queued.

Natively, canvases are offscreen textures and frames are pumped by the host:

```no_run
use model_gallery::prelude::*;
use std::rc::Rc;

let config = ViewerConfig::default();
let scheduler = Rc::new(ManualScheduler::new());
let mut gallery = InstanceRegistry::new(
    Catalog::village(),
    config.clone(),
    FileFetcher::new("assets"),
    WgpuBackendFactory::new(&config),
    scheduler.clone(),
);

pollster::block_on(async {
    let _ = gallery.start().await;
    let _ = gallery.select(2).await;
});
gallery.apply_slider(SliderInput::Rotation(45.0));
let _ = scheduler.run_frame();
```

In a browser, [`web::start_gallery`] wires the same registry to `fetch` and
`requestAnimationFrame`.
*/

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub use glamx;

#[cfg(not(target_arch = "wasm32"))]
#[doc(hidden)]
pub use pollster;
#[cfg(target_arch = "wasm32")]
#[doc(hidden)]
pub use wasm_bindgen_futures;

pub mod color;
pub mod config;
pub mod error;
pub mod extents;
pub mod gpu;
pub mod loader;
pub mod model;
pub mod registry;
pub mod scheduler;
pub mod transform;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Everything needed to build and drive a gallery.
pub mod prelude {
    pub use crate::color::*;
    pub use crate::config::*;
    pub use crate::error::ViewerError;
    pub use crate::extents::*;
    pub use crate::gpu::{BackendFactory, RenderBackend, WgpuBackendFactory};
    pub use crate::loader::*;
    pub use crate::model::*;
    pub use crate::registry::*;
    pub use crate::scheduler::*;
    pub use crate::transform::*;
    pub use crate::viewer::*;
    #[cfg(target_arch = "wasm32")]
    pub use crate::web::*;
    pub use glamx::{Mat4, Vec2, Vec3};
}
