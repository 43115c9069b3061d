//! The wgpu device shared by every viewer of a page.
//!
//! A browser caps the number of live GPU contexts, so all the canvases of the
//! gallery draw through one device and each viewer only owns its surface.

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CONTEXT_SINGLETON: RefCell<Option<GpuContext>> = const { RefCell::new(None) };
}

/// Handles to the shared wgpu instance, adapter, device and queue.
#[derive(Clone)]
pub struct GpuContext {
    /// The wgpu instance used for creating surfaces.
    pub instance: Arc<wgpu::Instance>,
    /// The adapter the device was requested from.
    pub adapter: Arc<wgpu::Adapter>,
    /// The device creating every GPU resource.
    pub device: Arc<wgpu::Device>,
    /// The queue commands are submitted to.
    pub queue: Arc<wgpu::Queue>,
    /// Color format of every render target.
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// A clone of the shared context, if one was created already.
    pub fn get() -> Option<GpuContext> {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().clone())
    }

    /// Creates a new instance with every backend enabled.
    pub fn new_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    /// Requests an adapter and a device from `instance` and installs them as the
    /// shared context.
    ///
    /// On the web, WebGL needs the adapter to be compatible with an existing
    /// surface, hence `compatible_surface`.
    pub async fn request(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<GpuContext, String> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| e.to_string())?;

        #[cfg(target_arch = "wasm32")]
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        #[cfg(not(target_arch = "wasm32"))]
        let limits = wgpu::Limits::default();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("model gallery device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| e.to_string())?;

        // Colors are authored in display space, so an sRGB target would wash them out.
        let surface_format = compatible_surface
            .and_then(|surface| {
                let caps = surface.get_capabilities(&adapter);
                caps.formats
                    .iter()
                    .find(|f| !f.is_srgb())
                    .or_else(|| caps.formats.first())
                    .copied()
            })
            .unwrap_or(wgpu::TextureFormat::Rgba8Unorm);

        log::info!(
            "Using GPU adapter `{}` ({:?}), target format {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format
        );

        let ctxt = GpuContext {
            instance: Arc::new(instance),
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface_format,
        };
        CONTEXT_SINGLETON.with(|cell| *cell.borrow_mut() = Some(ctxt.clone()));
        Ok(ctxt)
    }

    /// Drops the shared context. The next viewer creates a new one.
    pub fn reset() {
        CONTEXT_SINGLETON.with(|cell| {
            if let Some(ctxt) = cell.borrow_mut().take() {
                ctxt.device.destroy();
            }
        });
    }

    /// Format of the depth buffers.
    #[inline]
    pub fn depth_format() -> wgpu::TextureFormat {
        wgpu::TextureFormat::Depth32Float
    }

    /// Creates a buffer initialized with `contents`.
    pub fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents,
                usage,
            })
    }

    /// Creates a depth texture of the given size and returns it with its view.
    pub fn create_depth_texture(&self, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("viewer_depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::depth_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}
