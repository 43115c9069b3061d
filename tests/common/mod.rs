#![allow(dead_code)]

use model_gallery::error::{Result, ViewerError};
use model_gallery::gpu::{BackendFactory, FrameUniforms, PartDraw, RenderBackend};
use model_gallery::loader::MemoryFetcher;
use model_gallery::model::Geometry;
use model_gallery::prelude::*;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// What a backend has been asked to do.
#[derive(Default)]
pub struct Counters {
    pub bound: Cell<usize>,
    pub released: Cell<usize>,
    pub draws: Cell<usize>,
    pub clears: Cell<usize>,
    pub last_worlds: RefCell<Vec<Mat4>>,
    pub last_frame: Cell<Option<FrameUniforms>>,
    /// Replaces the default 300×150 display size of the canvas.
    pub display_size: Cell<Option<(u32, u32)>>,
}

pub struct RecordingPart {
    pub vertex_count: usize,
}

pub struct RecordingBackend {
    canvas: String,
    size: (u32, u32),
    counters: Rc<Counters>,
}

impl RenderBackend for RecordingBackend {
    type Part = RecordingPart;

    fn canvas(&self) -> &str {
        &self.canvas
    }

    fn display_size(&self) -> (u32, u32) {
        self.counters.display_size.get().unwrap_or((300, 150))
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn bind_geometry(&mut self, geometry: &Geometry) -> Result<RecordingPart> {
        self.counters.bound.set(self.counters.bound.get() + 1);
        Ok(RecordingPart {
            vertex_count: geometry.vertex_count(),
        })
    }

    fn draw(&mut self, frame: &FrameUniforms, parts: &[PartDraw<'_, RecordingPart>]) {
        self.counters.draws.set(self.counters.draws.get() + 1);
        self.counters.last_frame.set(Some(*frame));
        *self.counters.last_worlds.borrow_mut() =
            parts.iter().map(|d| d.uniforms.world_matrix()).collect();
    }

    fn clear(&mut self) {
        self.counters.clears.set(self.counters.clears.get() + 1);
    }

    fn release(&mut self, _: RecordingPart) {
        self.counters.released.set(self.counters.released.get() + 1);
    }
}

/// Creates recording backends and remembers every one of them.
#[derive(Default)]
pub struct RecordingFactory {
    created: RefCell<Vec<(String, Rc<Counters>)>>,
    missing: HashSet<String>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `canvas` behave as a canvas without a rendering context.
    pub fn without_canvas(mut self, canvas: &str) -> Self {
        let _ = self.missing.insert(canvas.to_string());
        self
    }

    /// Counters of every backend created for `canvas`, oldest first.
    pub fn history(&self, canvas: &str) -> Vec<Rc<Counters>> {
        self.created
            .borrow()
            .iter()
            .filter(|(c, _)| c == canvas)
            .map(|(_, counters)| counters.clone())
            .collect()
    }

    /// Counters of the latest backend created for `canvas`.
    pub fn latest(&self, canvas: &str) -> Rc<Counters> {
        self.history(canvas)
            .pop()
            .unwrap_or_else(|| panic!("no backend for canvas `{}`", canvas))
    }
}

impl BackendFactory for RecordingFactory {
    type Backend = RecordingBackend;

    async fn create(&self, canvas: &str) -> Result<RecordingBackend> {
        if self.missing.contains(canvas) {
            return Err(ViewerError::GlContextUnavailable {
                canvas: canvas.to_string(),
            });
        }

        let counters = Rc::new(Counters::default());
        self.created
            .borrow_mut()
            .push((canvas.to_string(), counters.clone()));
        Ok(RecordingBackend {
            canvas: canvas.to_string(),
            size: (1, 1),
            counters,
        })
    }
}

/// A box spanning `[1, 3] × [-1, 1] × [-1, 1]`, with two materials.
pub const BOX_OBJ: &str = "\
mtllib box.mtl
o Box
v 1 -1 -1
v 3 -1 -1
v 3 1 -1
v 1 1 -1
v 1 -1 1
v 3 -1 1
v 3 1 1
v 1 1 1
usemtl red
f 1 2 3 4
f 5 6 7 8
usemtl blue
f 1 2 6 5
f 4 3 7 8
";

pub const BOX_MTL: &str = "\
newmtl red
Kd 1 0 0
newmtl blue
Kd 0 0 1
d 0.5
";

/// A single triangle without material.
pub const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

/// Serves the box as `models/box.obj` and the triangle as `models/triangle.obj`.
pub fn fixture_fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with("models/box.obj", BOX_OBJ)
        .with("models/box.mtl", BOX_MTL)
        .with("models/triangle.obj", TRIANGLE_OBJ)
}

pub fn fixture_catalog() -> Catalog {
    Catalog::new(vec![
        CatalogEntry::new("models/box.obj", "Box"),
        CatalogEntry::new("models/triangle.obj", "Triangle"),
    ])
}

pub fn assert_mat_close(a: Mat4, b: Mat4) {
    assert!(a.abs_diff_eq(b, 1.0e-5), "{:?} != {:?}", a, b);
}
