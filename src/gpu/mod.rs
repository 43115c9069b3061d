//! GPU binding of models and the drawing of frames.
//!
//! Viewers never talk to wgpu directly: they go through [`RenderBackend`], which the
//! wgpu implementation ([`WgpuBackend`]) and test doubles both provide.

pub use self::context::GpuContext;
pub use self::uniforms::{FrameUniforms, PartUniforms};
pub use self::wgpu_backend::{WgpuBackend, WgpuBackendFactory, WgpuPart};

use crate::error::Result;
use crate::model::Geometry;
use std::future::Future;

mod context;
mod uniforms;
mod wgpu_backend;

/// A part to draw along with its per-draw uniforms.
pub struct PartDraw<'a, P> {
    /// GPU resources of the part.
    pub part: &'a P,
    /// World matrix and material of the part for this frame.
    pub uniforms: PartUniforms,
}

/// A drawing surface bound to one canvas.
pub trait RenderBackend {
    /// GPU-resident copy of one geometry.
    type Part;

    /// Identifier of the canvas this backend draws to.
    fn canvas(&self) -> &str;

    /// The size the canvas is displayed at, in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Size of the drawing buffer, in pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the drawing buffer. Does nothing if the size is unchanged.
    fn resize(&mut self, width: u32, height: u32);

    /// Uploads the vertex data of `geometry`.
    fn bind_geometry(&mut self, geometry: &Geometry) -> Result<Self::Part>;

    /// Clears the target, then draws every part with depth testing.
    fn draw(&mut self, frame: &FrameUniforms, parts: &[PartDraw<'_, Self::Part>]);

    /// Clears the target to the clear color.
    fn clear(&mut self);

    /// Releases the GPU resources of a part.
    fn release(&mut self, part: Self::Part);
}

/// Creates backends for canvases.
pub trait BackendFactory {
    /// The backend produced.
    type Backend: RenderBackend;

    /// A backend drawing to the canvas `canvas`.
    ///
    /// Fails with [`GlContextUnavailable`](crate::error::ViewerError::GlContextUnavailable)
    /// if the canvas is missing or has no rendering context.
    fn create(&self, canvas: &str) -> impl Future<Output = Result<Self::Backend>>;
}
