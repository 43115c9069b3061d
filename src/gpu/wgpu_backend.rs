//! The wgpu implementation of [`RenderBackend`].

use super::{BackendFactory, FrameUniforms, GpuContext, PartDraw, PartUniforms, RenderBackend};
use crate::color::{self, Color};
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::model::{ColorSource, Geometry};

/// A geometry uploaded to the GPU, with its own uniform buffer.
pub struct WgpuPart {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    colors: wgpu::Buffer,
    vertex_count: u32,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl WgpuPart {
    /// Number of vertices drawn for this part.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

enum RenderTarget {
    #[cfg(target_arch = "wasm32")]
    Canvas {
        element: web_sys::HtmlCanvasElement,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

// A texture being drawn to, presented once the frame is submitted.
struct TargetFrame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
}

impl TargetFrame {
    fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

/// Draws to a web canvas or, natively, to an offscreen texture.
pub struct WgpuBackend {
    canvas: String,
    ctxt: GpuContext,
    target: RenderTarget,
    size: (u32, u32),
    depth: (wgpu::Texture, wgpu::TextureView),
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    part_layout: wgpu::BindGroupLayout,
    clear_color: Color,
}

impl WgpuBackend {
    fn new(
        canvas: &str,
        ctxt: GpuContext,
        target: RenderTarget,
        size: (u32, u32),
        clear_color: Color,
    ) -> WgpuBackend {
        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame_layout = ctxt
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("viewer_frame_bind_group_layout"),
                entries: &[uniform_entry],
            });
        let part_layout = ctxt
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("viewer_part_bind_group_layout"),
                entries: &[uniform_entry],
            });

        let frame_buffer = ctxt.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("viewer_frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = ctxt.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("viewer_frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline = create_pipeline(&ctxt, &frame_layout, &part_layout);
        let depth = ctxt.create_depth_texture(size.0, size.1);

        WgpuBackend {
            canvas: canvas.to_string(),
            ctxt,
            target,
            size,
            depth,
            pipeline,
            frame_buffer,
            frame_bind_group,
            part_layout,
            clear_color,
        }
    }

    /// The offscreen texture drawn to, if this backend has no canvas.
    pub fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.target {
            RenderTarget::Offscreen { texture } => Some(texture),
            #[cfg(target_arch = "wasm32")]
            RenderTarget::Canvas { .. } => None,
        }
    }

    fn acquire(&self) -> Option<TargetFrame> {
        match &self.target {
            #[cfg(target_arch = "wasm32")]
            RenderTarget::Canvas { surface, .. } => match surface.get_current_texture() {
                Ok(texture) => {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    Some(TargetFrame {
                        surface_texture: Some(texture),
                        view,
                    })
                }
                Err(e) => {
                    log::warn!("Cannot acquire a frame for canvas `{}`: {}", self.canvas, e);
                    None
                }
            },
            RenderTarget::Offscreen { texture } => Some(TargetFrame {
                surface_texture: None,
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            }),
        }
    }

    fn render(&self, parts: &[PartDraw<'_, WgpuPart>]) {
        let Some(frame) = self.acquire() else {
            return;
        };

        let mut encoder = self
            .ctxt
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewer_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("viewer_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color::to_wgpu(self.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.1,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !parts.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
            }

            for draw in parts.iter().filter(|d| d.part.vertex_count > 0) {
                let part = draw.part;
                pass.set_bind_group(1, &part.bind_group, &[]);
                pass.set_vertex_buffer(0, part.positions.slice(..));
                pass.set_vertex_buffer(1, part.normals.slice(..));
                pass.set_vertex_buffer(2, part.colors.slice(..));
                pass.draw(0..part.vertex_count, 0..1);
            }
        }

        let _ = self.ctxt.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}

impl RenderBackend for WgpuBackend {
    type Part = WgpuPart;

    fn canvas(&self) -> &str {
        &self.canvas
    }

    fn display_size(&self) -> (u32, u32) {
        match &self.target {
            #[cfg(target_arch = "wasm32")]
            RenderTarget::Canvas { element, .. } => (
                element.client_width().max(1) as u32,
                element.client_height().max(1) as u32,
            ),
            RenderTarget::Offscreen { .. } => self.size,
        }
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.size == (width, height) {
            return;
        }

        match &mut self.target {
            #[cfg(target_arch = "wasm32")]
            RenderTarget::Canvas {
                element,
                surface,
                config,
            } => {
                element.set_width(width);
                element.set_height(height);
                config.width = width;
                config.height = height;
                surface.configure(&self.ctxt.device, config);
            }
            RenderTarget::Offscreen { texture } => {
                *texture = create_offscreen_texture(&self.ctxt, width, height);
            }
        }

        self.depth = self.ctxt.create_depth_texture(width, height);
        self.size = (width, height);
    }

    fn bind_geometry(&mut self, geometry: &Geometry) -> Result<WgpuPart> {
        let vertex_count = geometry.vertex_count();
        let colors = vertex_colors(&geometry.colors, vertex_count);
        let usage = wgpu::BufferUsages::VERTEX;

        let positions = self.ctxt.create_buffer_init(
            Some("part_positions"),
            bytemuck::cast_slice(&geometry.positions),
            usage,
        );
        let normals = self.ctxt.create_buffer_init(
            Some("part_normals"),
            bytemuck::cast_slice(&geometry.normals),
            usage,
        );
        let colors =
            self.ctxt
                .create_buffer_init(Some("part_colors"), bytemuck::cast_slice(&colors), usage);

        let uniforms = self.ctxt.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("part_uniforms"),
            size: std::mem::size_of::<PartUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self
            .ctxt
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("part_bind_group"),
                layout: &self.part_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                }],
            });

        Ok(WgpuPart {
            positions,
            normals,
            colors,
            vertex_count: vertex_count as u32,
            uniforms,
            bind_group,
        })
    }

    fn draw(&mut self, frame: &FrameUniforms, parts: &[PartDraw<'_, WgpuPart>]) {
        let queue = &self.ctxt.queue;
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));
        for draw in parts {
            queue.write_buffer(&draw.part.uniforms, 0, bytemuck::bytes_of(&draw.uniforms));
        }

        self.render(parts);
    }

    fn clear(&mut self) {
        self.render(&[]);
    }

    fn release(&mut self, part: WgpuPart) {
        part.positions.destroy();
        part.normals.destroy();
        part.colors.destroy();
        part.uniforms.destroy();
    }
}

/// Expands a geometry's colors into one RGBA quadruple per vertex.
fn vertex_colors(colors: &ColorSource, vertex_count: usize) -> Vec<f32> {
    match colors {
        ColorSource::PerVertex(rgb) => rgb
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 1.0])
            .collect(),
        ColorSource::Constant(c) => std::iter::repeat_n(color::to_array(*c), vertex_count)
            .flatten()
            .collect(),
    }
}

fn create_offscreen_texture(ctxt: &GpuContext, width: u32, height: u32) -> wgpu::Texture {
    ctxt.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer_offscreen_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctxt.surface_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn create_pipeline(
    ctxt: &GpuContext,
    frame_layout: &wgpu::BindGroupLayout,
    part_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = ctxt
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("viewer_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("viewer.wgsl").into()),
        });

    let layout = ctxt
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("viewer_pipeline_layout"),
            bind_group_layouts: &[frame_layout, part_layout],
            push_constant_ranges: &[],
        });

    // Positions, normals and colors live in separate buffers.
    let vertex_buffer_layouts = [
        wgpu::VertexBufferLayout {
            array_stride: 3 * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        },
        wgpu::VertexBufferLayout {
            array_stride: 3 * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            }],
        },
        wgpu::VertexBufferLayout {
            array_stride: 4 * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 0,
                shader_location: 2,
            }],
        },
    ];

    ctxt.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("viewer_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffer_layouts,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctxt.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Negative scales flip the winding, so nothing is culled.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: GpuContext::depth_format(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
}

/// Creates [`WgpuBackend`]s, all sharing the thread's [`GpuContext`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WgpuBackendFactory {
    clear_color: Color,
    offscreen_size: (u32, u32),
}

impl WgpuBackendFactory {
    /// A factory using the clear color and offscreen size of `config`.
    pub fn new(config: &ViewerConfig) -> Self {
        WgpuBackendFactory {
            clear_color: config.clear_color,
            offscreen_size: config.offscreen_size,
        }
    }

    fn unavailable(canvas: &str, reason: impl std::fmt::Display) -> ViewerError {
        log::warn!("No rendering context for canvas `{}`: {}", canvas, reason);
        ViewerError::GlContextUnavailable {
            canvas: canvas.to_string(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn create_offscreen(&self, canvas: &str) -> Result<WgpuBackend> {
        let ctxt = match GpuContext::get() {
            Some(ctxt) => ctxt,
            None => GpuContext::request(GpuContext::new_instance(), None)
                .await
                .map_err(|reason| Self::unavailable(canvas, reason))?,
        };

        let (width, height) = (self.offscreen_size.0.max(1), self.offscreen_size.1.max(1));
        let texture = create_offscreen_texture(&ctxt, width, height);

        Ok(WgpuBackend::new(
            canvas,
            ctxt,
            RenderTarget::Offscreen { texture },
            (width, height),
            self.clear_color,
        ))
    }

    #[cfg(target_arch = "wasm32")]
    async fn create_on_canvas(&self, canvas: &str) -> Result<WgpuBackend> {
        let element = crate::web::canvas_element(canvas)
            .ok_or_else(|| Self::unavailable(canvas, "no such canvas element"))?;

        let surface_for = |instance: &wgpu::Instance| {
            instance
                .create_surface(wgpu::SurfaceTarget::Canvas(element.clone()))
                .map_err(|e| Self::unavailable(canvas, e))
        };

        let (ctxt, surface) = match GpuContext::get() {
            Some(ctxt) => {
                let surface = surface_for(&ctxt.instance)?;
                (ctxt, surface)
            }
            None => {
                let instance = GpuContext::new_instance();
                let surface = surface_for(&instance)?;
                let ctxt = GpuContext::request(instance, Some(&surface))
                    .await
                    .map_err(|reason| Self::unavailable(canvas, reason))?;
                (ctxt, surface)
            }
        };

        let caps = surface.get_capabilities(&ctxt.adapter);
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .find(|m| **m == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first())
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let (width, height) = (element.width().max(1), element.height().max(1));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: ctxt.surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctxt.device, &config);

        Ok(WgpuBackend::new(
            canvas,
            ctxt,
            RenderTarget::Canvas {
                element,
                surface,
                config,
            },
            (width, height),
            self.clear_color,
        ))
    }
}

impl BackendFactory for WgpuBackendFactory {
    type Backend = WgpuBackend;

    async fn create(&self, canvas: &str) -> Result<WgpuBackend> {
        #[cfg(target_arch = "wasm32")]
        return self.create_on_canvas(canvas).await;

        #[cfg(not(target_arch = "wasm32"))]
        return self.create_offscreen(canvas).await;
    }
}
