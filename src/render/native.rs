use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use glam::{Mat4, Vec3};
use log::{debug, info};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::geometry::{Vertex, CUBE_VERTICES, GROUND_VERTICES};
use super::shaders::{LAMP_SHADER, LIT_SHADER};
use super::texture::{material_sampler, GpuTexture, MaterialImages};
use super::uniforms::{LampFrameUniform, LitFrameUniform, ObjectUniform, UniformStaging};
use super::{FrameTarget, MeshKind, ProgramKind};
use crate::binding::bind_material_units;
use crate::shading::ShadingProgram;

/// Per-draw slots allocated up front; the buffer grows when a frame needs more.
const INITIAL_DRAW_CAPACITY: usize = 64;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.06,
    b: 0.08,
    a: 1.0,
};

/// wgpu renderer for the sculpture scene.
///
/// Parameter writes and draw calls are staged on the CPU through
/// [`UniformStaging`]; [`Renderer::finish_frame`] uploads the staged blocks
/// and replays the draw list in a single render pass.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    lit: ProgramPipeline,
    lamp: ProgramPipeline,
    objects: ObjectSlots,
    material_bind_group: wgpu::BindGroup,
    ground: MeshBuffers,
    cube: MeshBuffers,
    staging: UniformStaging,
}

impl Renderer {
    /// Initializes the GPU renderer for `window`, loading the material maps
    /// from `texture_dir`.
    pub async fn new(window: Arc<Window>, texture_dir: &Path) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using GPU adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sculpture-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Gamma is applied by the lit shader, so the swap chain must not
        // encode to sRGB a second time.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| matches!(mode, wgpu::PresentMode::Mailbox))
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        debug!("surface configured as {surface_format:?}");

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ObjectUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material-bind-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let lit = ProgramPipeline::new::<LitFrameUniform>(
            &device,
            ProgramKind::Lit,
            LIT_SHADER,
            &object_layout,
            Some(&material_layout),
            surface_format,
        );
        let lamp = ProgramPipeline::new::<LampFrameUniform>(
            &device,
            ProgramKind::Lamp,
            LAMP_SHADER,
            &object_layout,
            None,
            surface_format,
        );

        let objects = ObjectSlots::new(&device, object_layout, INITIAL_DRAW_CAPACITY);

        let images = MaterialImages::load(texture_dir);
        let diffuse = GpuTexture::upload(&device, &queue, &images.diffuse, "diffuse-map");
        let specular = GpuTexture::upload(&device, &queue, &images.specular, "specular-map");
        let sampler = material_sampler(&device);
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material-bind-group"),
            layout: &material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let ground = MeshBuffers::new(&device, &GROUND_VERTICES, "ground");
        let cube = MeshBuffers::new(&device, &CUBE_VERTICES, "cube");

        let mut staging = UniformStaging::new();
        bind_material_units(&mut staging);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            lit,
            lamp,
            objects,
            material_bind_group,
            ground,
            cube,
            staging,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect(&self) -> f32 {
        if self.size.height == 0 {
            1.0
        } else {
            self.size.width as f32 / self.size.height as f32
        }
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Starts a new draw list. Parameter values persist from the last frame.
    pub fn begin_frame(&mut self) {
        self.staging.begin_frame();
    }

    /// Uploads the staged parameters and submits every draw recorded since
    /// [`Renderer::begin_frame`].
    pub fn finish_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let draws = self.staging.draws();
        self.objects.ensure_capacity(&self.device, draws.len());
        self.queue
            .write_buffer(&self.lit.frame_buffer, 0, bytes_of(self.staging.lit()));
        self.queue
            .write_buffer(&self.lamp.frame_buffer, 0, bytes_of(self.staging.lamp()));
        if !draws.is_empty() {
            let packed = self.objects.pack(draws.iter().map(|draw| &draw.object));
            self.queue.write_buffer(&self.objects.buffer, 0, &packed);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sculpture-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut bound: Option<ProgramKind> = None;
            for (slot, draw) in draws.iter().enumerate() {
                if bound != Some(draw.program) {
                    let program = match draw.program {
                        ProgramKind::Lit => &self.lit,
                        ProgramKind::Lamp => &self.lamp,
                    };
                    pass.set_pipeline(&program.pipeline);
                    pass.set_bind_group(0, &program.frame_bind_group, &[]);
                    if draw.program == ProgramKind::Lit {
                        pass.set_bind_group(2, &self.material_bind_group, &[]);
                    }
                    bound = Some(draw.program);
                }
                let mesh = match draw.mesh {
                    MeshKind::Ground => &self.ground,
                    MeshKind::Cube => &self.cube,
                };
                pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(slot)]);
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl ShadingProgram for Renderer {
    fn set_bool(&mut self, name: &str, value: bool) {
        self.staging.set_bool(name, value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.staging.set_int(name, value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.staging.set_float(name, value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.staging.set_vec3(name, value);
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.staging.set_mat4(name, value);
    }
}

impl FrameTarget for Renderer {
    fn use_program(&mut self, program: ProgramKind) {
        self.staging.use_program(program);
    }

    fn draw(&mut self, mesh: MeshKind) {
        self.staging.draw(mesh);
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Pipeline plus the frame-level uniform block of one program.
struct ProgramPipeline {
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
}

impl ProgramPipeline {
    fn new<U: bytemuck::Pod>(
        device: &wgpu::Device,
        kind: ProgramKind,
        source: &str,
        object_layout: &wgpu::BindGroupLayout,
        material_layout: Option<&wgpu::BindGroupLayout>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let frame_size = std::mem::size_of::<U>() as u64;
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{kind}-frame-layout")),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(frame_size),
                },
                count: None,
            }],
        });
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{kind}-frame-uniform")),
            size: frame_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{kind}-frame-bind-group")),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let mut layouts = vec![&frame_layout, object_layout];
        layouts.extend(material_layout);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{kind}-pipeline-layout")),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{kind}-shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{kind}-pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_buffer,
            frame_bind_group,
        }
    }
}

/// Dynamic-offset uniform buffer holding one [`ObjectUniform`] per draw.
struct ObjectSlots {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl ObjectSlots {
    fn new(device: &wgpu::Device, layout: wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = slot_stride(std::mem::size_of::<ObjectUniform>() as u64, alignment);
        let (buffer, bind_group) = Self::allocate(device, &layout, stride, capacity);
        Self {
            layout,
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object-uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, draws: usize) {
        if draws <= self.capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        debug!("growing object uniform buffer to {capacity} slots");
        let (buffer, bind_group) = Self::allocate(device, &self.layout, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }

    fn offset(&self, slot: usize) -> u32 {
        (self.stride * slot as u64) as u32
    }

    fn pack<'a>(&self, objects: impl ExactSizeIterator<Item = &'a ObjectUniform>) -> Vec<u8> {
        let stride = self.stride as usize;
        let mut bytes = vec![0u8; stride * objects.len()];
        for (slot, object) in objects.enumerate() {
            let start = slot * stride;
            let data = bytes_of(object);
            bytes[start..start + data.len()].copy_from_slice(data);
        }
        bytes
    }
}

/// Rounds `size` up to the next multiple of `alignment`.
fn slot_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    vertex_count: u32,
}

impl MeshBuffers {
    fn new(device: &wgpu::Device, vertices: &[Vertex], label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex,
            vertex_count: vertices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_stride_respects_alignment() {
        assert_eq!(slot_stride(128, 256), 256);
        assert_eq!(slot_stride(256, 256), 256);
        assert_eq!(slot_stride(300, 256), 512);
        assert_eq!(slot_stride(128, 0), 128);
    }

    #[test]
    fn object_block_fits_one_default_slot() {
        let size = std::mem::size_of::<ObjectUniform>() as u64;
        assert_eq!(slot_stride(size, 256), 256);
    }
}
