//! Viewer instances: one model bound to one canvas, redrawn every frame.

pub use self::frame_loop::FrameLoop;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::extents::{CameraFraming, Extents};
use crate::gpu::{BackendFactory, FrameUniforms, PartDraw, PartUniforms, RenderBackend};
use crate::loader::{self, AssetFetcher};
use crate::model::{Material, Model};
use crate::scheduler::FrameScheduler;
use crate::transform::SharedTransform;
use glamx::Mat4;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub mod frame;
mod frame_loop;

/// What a viewer is used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewerRole {
    /// A catalog thumbnail: spins, ignores the user transform.
    Thumbnail,
    /// The main viewport: spins and follows the user transform.
    Main,
}

/// Lifecycle of a viewer. Moves forward only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewerState {
    /// Loaded and bound, frame loop not started.
    Idle,
    /// Drawing at every frame.
    Running,
    /// GPU resources released. Never draws again.
    Disposed,
}

struct Part<P> {
    gpu: P,
    material: Material,
}

/// A loaded model bound to a canvas.
pub struct ViewerInstance<B: RenderBackend> {
    backend: B,
    role: ViewerRole,
    source_path: String,
    parts: Vec<Part<B::Part>>,
    extents: Extents,
    framing: CameraFraming,
    offset: glamx::Vec3,
    transform: SharedTransform,
    config: Rc<ViewerConfig>,
    state: ViewerState,
    frames_drawn: u64,
}

impl<B: RenderBackend> ViewerInstance<B> {
    /// Binds every geometry of `model` on `backend` and frames the model.
    ///
    /// Fails with [`ViewerError::DegenerateExtents`] if the model has no vertex, in
    /// which case nothing stays bound.
    pub fn new(
        mut backend: B,
        model: &Model,
        role: ViewerRole,
        transform: SharedTransform,
        config: Rc<ViewerConfig>,
    ) -> Result<Self> {
        let extents = Extents::from_geometries(&model.geometries);
        let offset = extents.centering_offset();
        let framing = CameraFraming::from_extents(&extents.translated(offset), &model.source_path)?;

        let mut parts = Vec::with_capacity(model.geometries.len());
        for geometry in &model.geometries {
            match backend.bind_geometry(geometry) {
                Ok(gpu) => parts.push(Part {
                    gpu,
                    material: model.material_for(geometry),
                }),
                Err(e) => {
                    for part in parts.drain(..) {
                        backend.release(part.gpu);
                    }
                    return Err(e);
                }
            }
        }

        log::debug!(
            "Bound {} parts of `{}` on canvas `{}`",
            parts.len(),
            model.source_path,
            backend.canvas()
        );

        Ok(ViewerInstance {
            backend,
            role,
            source_path: model.source_path.clone(),
            parts,
            extents,
            framing,
            offset,
            transform,
            config,
            state: ViewerState::Idle,
            frames_drawn: 0,
        })
    }

    /// Creates a backend for `canvas`, loads the model at `path` and binds it.
    ///
    /// The rendering context is obtained first: a canvas without one fails with
    /// [`ViewerError::GlContextUnavailable`] before anything is fetched.
    pub async fn load<F, BF>(
        fetcher: &F,
        factory: &BF,
        path: &str,
        canvas: &str,
        role: ViewerRole,
        transform: SharedTransform,
        config: Rc<ViewerConfig>,
    ) -> Result<Self>
    where
        F: AssetFetcher + ?Sized,
        BF: BackendFactory<Backend = B>,
    {
        let backend = factory.create(canvas).await?;
        let model = loader::load_model(fetcher, path).await?;
        Self::new(backend, &model, role, transform, config)
    }

    /// Draws one frame at `time_ms`. Returns `false`, without drawing, once disposed.
    pub fn render_frame(&mut self, time_ms: f64) -> bool {
        if self.state == ViewerState::Disposed {
            return false;
        }

        let (width, height) = self.backend.display_size();
        self.backend.resize(width, height);
        let (width, height) = self.backend.size();
        let aspect = width as f32 / height.max(1) as f32;

        let view = frame::view_matrix(&self.framing);
        let projection = frame::projection_matrix(&self.framing, self.config.fov, aspect);
        let frame_uniforms = FrameUniforms::new(
            view,
            projection,
            self.config.light_direction,
            self.framing.position,
        );

        let spin = frame::spin(time_ms, self.config.spin_speed);
        let shared_world = frame::world_matrix(spin, self.offset, Mat4::IDENTITY);
        // Read once so every part of this frame sees the same state.
        let user_state = self.transform.get();
        let units_per_pixel = frame::world_units_per_pixel(&self.framing, self.config.fov, height);

        let draws: Vec<_> = self
            .parts
            .iter()
            .map(|part| {
                // Thumbnails share one matrix; the main viewport builds one per part.
                let world = match self.role {
                    ViewerRole::Thumbnail => shared_world,
                    ViewerRole::Main => {
                        let user = frame::user_matrix(
                            &user_state,
                            self.config.default_transform.translation,
                            units_per_pixel,
                        );
                        Mat4::IDENTITY * frame::world_matrix(spin, self.offset, user)
                    }
                };
                PartDraw {
                    part: &part.gpu,
                    uniforms: PartUniforms::new(world, &part.material, &self.config.shading),
                }
            })
            .collect();
        self.backend.draw(&frame_uniforms, &draws);
        self.frames_drawn += 1;

        true
    }

    /// Clears the canvas. The next frame draws the model again.
    pub fn clear(&mut self) {
        if self.state != ViewerState::Disposed {
            self.backend.clear();
        }
    }

    /// Makes the main viewport follow another transform record.
    pub fn bind_transform(&mut self, transform: SharedTransform) {
        self.transform = transform;
    }

    fn mark_running(&mut self) -> bool {
        if self.state == ViewerState::Idle {
            self.state = ViewerState::Running;
            true
        } else {
            false
        }
    }

    fn dispose(&mut self) {
        if self.state == ViewerState::Disposed {
            return;
        }

        for part in self.parts.drain(..) {
            self.backend.release(part.gpu);
        }
        self.state = ViewerState::Disposed;
        log::debug!(
            "Disposed viewer of `{}` on canvas `{}`",
            self.source_path,
            self.backend.canvas()
        );
    }

    /// The current lifecycle state.
    #[inline]
    pub fn state(&self) -> ViewerState {
        self.state
    }

    /// What this viewer is used for.
    #[inline]
    pub fn role(&self) -> ViewerRole {
        self.role
    }

    /// Identifier of the canvas drawn to.
    pub fn canvas(&self) -> &str {
        self.backend.canvas()
    }

    /// Path of the model shown.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Bounds of the model before centering.
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Camera placement computed at load time.
    pub fn framing(&self) -> &CameraFraming {
        &self.framing
    }

    /// Translation moving the model's center to the origin.
    pub fn centering_offset(&self) -> glamx::Vec3 {
        self.offset
    }

    /// The transform record the main viewport follows.
    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }

    /// Number of geometries bound.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Number of frames drawn so far.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// The backend drawn with.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// A viewer instance together with its frame loop.
///
/// Dropping the viewer disposes it.
pub struct Viewer<B: RenderBackend + 'static, S: FrameScheduler + 'static> {
    instance: Rc<RefCell<ViewerInstance<B>>>,
    frame_loop: Option<FrameLoop<S>>,
}

impl<B: RenderBackend + 'static, S: FrameScheduler + 'static> Viewer<B, S> {
    /// Wraps an idle instance.
    pub fn new(instance: ViewerInstance<B>) -> Self {
        Viewer {
            instance: Rc::new(RefCell::new(instance)),
            frame_loop: None,
        }
    }

    /// Starts drawing at every frame of `scheduler`. Only an idle viewer starts.
    pub fn start(&mut self, scheduler: &Rc<S>) {
        if !self.instance.borrow_mut().mark_running() {
            log::debug!("Ignoring start of a viewer that is not idle");
            return;
        }

        let instance = self.instance.clone();
        self.frame_loop = Some(FrameLoop::start(scheduler.clone(), move |time| {
            instance.borrow_mut().render_frame(time)
        }));
    }

    /// Draws a frame right away, outside of the frame loop.
    pub fn render_now(&self, time_ms: f64) -> bool {
        self.instance.borrow_mut().render_frame(time_ms)
    }

    /// Cancels the frame loop, then releases the GPU resources. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.cancel();
        }
        self.instance.borrow_mut().dispose();
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ViewerState {
        self.instance.borrow().state()
    }

    /// Borrows the instance.
    pub fn instance(&self) -> Ref<'_, ViewerInstance<B>> {
        self.instance.borrow()
    }

    /// Mutably borrows the instance.
    pub fn instance_mut(&self) -> RefMut<'_, ViewerInstance<B>> {
        self.instance.borrow_mut()
    }

    /// Fails with [`ViewerError::Disposed`] once the viewer was disposed.
    pub fn ensure_alive(&self) -> Result<()> {
        match self.state() {
            ViewerState::Disposed => Err(ViewerError::Disposed),
            _ => Ok(()),
        }
    }
}

impl<B: RenderBackend + 'static, S: FrameScheduler + 'static> Drop for Viewer<B, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
