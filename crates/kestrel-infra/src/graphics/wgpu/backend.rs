// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The wgpu fulfillment of the [`GraphicsBackend`] contract.
//!
//! One resource map per native resource kind; the engine addresses
//! everything through [`NativeId`]s. Rendering is immediate-mode: each
//! clear and each draw records and submits its own small pass against the
//! currently bound target.

use std::borrow::Cow;
use std::collections::HashMap;
use std::iter;

use kestrel_core::gpu::api::{
    BufferKind, BufferUsage, GraphicsApi, PipelineDescriptor, ProgramDescriptor, ShaderStage,
    TextureDescriptor, TextureSampleFormat,
};
use kestrel_core::gpu::error::{GpuError, PipelineError, RenderTargetError, ShaderError};
use kestrel_core::gpu::handle::{NativeId, Release, ResourceMap};
use kestrel_core::gpu::traits::{DrawCall, GraphicsBackend, UniformBlockBinding};
use kestrel_core::math::Color;

use super::context::{WgpuContext, DEPTH_FORMAT};
use super::conversions::{pixel_format, IntoWgpu};

/// Fragment-stage uniform blocks live in the same bind group as
/// vertex-stage blocks; their binding indices start here. Shaders declare
/// `@group(0) @binding(8 + n)` for fragment blocks.
pub const FRAGMENT_BLOCK_BINDING_BASE: u32 = 8;

struct NativeShaderModule {
    module: wgpu::ShaderModule,
    blocks: Vec<UniformBlockBinding>,
}

impl Release for NativeShaderModule {
    fn release(&mut self) {}
}

struct NativePipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
}

impl Release for NativePipeline {
    fn release(&mut self) {}
}

struct NativeBuffer {
    buffer: wgpu::Buffer,
}

impl Release for NativeBuffer {
    fn release(&mut self) {
        self.buffer.destroy();
    }
}

struct NativeSampler {
    #[allow(dead_code)]
    sampler: wgpu::Sampler,
}

impl Release for NativeSampler {
    fn release(&mut self) {}
}

struct NativeTexture {
    texture: wgpu::Texture,
    #[allow(dead_code)]
    view: wgpu::TextureView,
    sampler: NativeId,
}

impl Release for NativeTexture {
    fn release(&mut self) {
        self.texture.destroy();
    }
}

struct DepthAttachment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct NativeRenderTarget {
    color_views: Vec<wgpu::TextureView>,
    depth: Option<DepthAttachment>,
}

impl Release for NativeRenderTarget {
    fn release(&mut self) {
        if let Some(depth) = &self.depth {
            depth.texture.destroy();
        }
    }
}

struct BoundPipeline {
    pipeline: NativeId,
    bind_group: Option<wgpu::BindGroup>,
}

struct Frame {
    surface: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// The wgpu graphics backend.
pub struct WgpuBackend {
    api: GraphicsApi,
    context: WgpuContext,

    vertex_modules: ResourceMap<NativeId, NativeShaderModule>,
    fragment_modules: ResourceMap<NativeId, NativeShaderModule>,
    pipelines: ResourceMap<NativeId, NativePipeline>,
    buffers: ResourceMap<NativeId, NativeBuffer>,
    textures: ResourceMap<NativeId, NativeTexture>,
    samplers: ResourceMap<NativeId, NativeSampler>,
    render_targets: ResourceMap<NativeId, NativeRenderTarget>,

    clear_color: wgpu::Color,
    bound: Option<BoundPipeline>,
    current_target: Option<NativeId>,
    bound_texture_slots: HashMap<u32, NativeId>,
    frame: Option<Frame>,
    clear_pending: bool,
    viewport: Option<(u32, u32)>,
}

impl WgpuBackend {
    /// Wraps an initialized context.
    pub fn new(api: GraphicsApi, context: WgpuContext) -> Self {
        log::info!(
            "wgpu backend ready on \"{}\" for {api:?}",
            context.adapter_name
        );
        Self {
            api,
            context,
            vertex_modules: ResourceMap::new(),
            fragment_modules: ResourceMap::new(),
            pipelines: ResourceMap::new(),
            buffers: ResourceMap::new(),
            textures: ResourceMap::new(),
            samplers: ResourceMap::new(),
            render_targets: ResourceMap::new(),
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.6,
                a: 1.0,
            },
            bound: None,
            current_target: None,
            bound_texture_slots: HashMap::new(),
            frame: None,
            clear_pending: false,
            viewport: None,
        }
    }

    /// Views of the currently bound target: `(color views, depth view)`.
    /// `None` when the backbuffer is bound but no frame is acquired.
    fn target_views(&self) -> Option<(Vec<&wgpu::TextureView>, Option<&wgpu::TextureView>)> {
        match self.current_target {
            Some(target) => self.render_targets.get(target).map(|rt| {
                (
                    rt.color_views.iter().collect(),
                    rt.depth.as_ref().map(|d| &d.view),
                )
            }),
            None => self
                .frame
                .as_ref()
                .map(|frame| (vec![&frame.view], Some(&self.context.depth_view))),
        }
    }

    fn submit_clear_pass(
        &self,
        views: &[&wgpu::TextureView],
        depth_view: Option<&wgpu::TextureView>,
        color: bool,
        depth: bool,
    ) {
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if color {
                            wgpu::LoadOp::Clear(self.clear_color)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_stencil_attachment =
            depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: if depth {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("clear"),
                });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.context.queue.submit(iter::once(encoder.finish()));
    }

    fn mip_level_count(width: u32, height: u32) -> u32 {
        32 - width.max(height).leading_zeros()
    }

    /// Expands three-channel pixel data to four channels (wgpu has no RGB
    /// formats), filling alpha with the format's "one" value.
    fn expand_rgb(data: &[u8], format: TextureSampleFormat) -> Vec<u8> {
        let channel_bytes = match format {
            TextureSampleFormat::Byte => 1,
            TextureSampleFormat::Float | TextureSampleFormat::Int => 4,
        };
        let alpha: &[u8] = match format {
            TextureSampleFormat::Byte => &[0xFF],
            TextureSampleFormat::Float => &1.0f32.to_le_bytes(),
            TextureSampleFormat::Int => &1i32.to_le_bytes(),
        };

        let mut out = Vec::with_capacity(data.len() / 3 * 4);
        for pixel in data.chunks_exact(3 * channel_bytes) {
            out.extend_from_slice(pixel);
            out.extend_from_slice(alpha);
        }
        out
    }

    /// Box-filters one mip level down to the next (8-bit channels).
    fn downsample(data: &[u8], width: u32, height: u32, channels: u32) -> Vec<u8> {
        let next_width = (width / 2).max(1);
        let next_height = (height / 2).max(1);
        let channels = channels as usize;

        let texel = |x: u32, y: u32, c: usize| -> u32 {
            let x = x.min(width - 1);
            let y = y.min(height - 1);
            data[(y * width + x) as usize * channels + c] as u32
        };

        let mut out = vec![0u8; (next_width * next_height) as usize * channels];
        for y in 0..next_height {
            for x in 0..next_width {
                for c in 0..channels {
                    let sum = texel(x * 2, y * 2, c)
                        + texel(x * 2 + 1, y * 2, c)
                        + texel(x * 2, y * 2 + 1, c)
                        + texel(x * 2 + 1, y * 2 + 1, c);
                    out[(y * next_width + x) as usize * channels + c] = (sum / 4) as u8;
                }
            }
        }
        out
    }

    fn allocate_native_buffer(&self, kind: BufferKind, size: usize) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        // Queue writes require 4-byte aligned sizes; round the native
        // allocation up so byte-exact shadows of any length fit.
        let padded = wgpu::util::align_to(size as u64, wgpu::COPY_BUFFER_ALIGNMENT);
        self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: padded,
            usage,
            mapped_at_creation: false,
        })
    }

    fn write_pixels(
        &self,
        texture: &wgpu::Texture,
        data: &[u8],
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        mip_level: u32,
    ) {
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_pixel),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl GraphicsBackend for WgpuBackend {
    fn api(&self) -> GraphicsApi {
        self.api
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        // Drop an in-flight frame; it was acquired at the old extent.
        self.frame = None;
        self.context.resize(width, height);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    fn begin_frame(&mut self) -> Result<(), GpuError> {
        if self.frame.is_some() {
            return Ok(());
        }

        let surface_texture = match self.context.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("swap chain lost, reconfiguring");
                self.context
                    .surface
                    .configure(&self.context.device, &self.context.surface_config);
                self.context
                    .surface
                    .get_current_texture()
                    .map_err(|e| GpuError::Backend(format!("swap chain unrecoverable: {e}")))?
            }
            Err(e) => {
                return Err(GpuError::Backend(format!(
                    "failed to acquire swap-chain image: {e}"
                )))
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame {
            surface: surface_texture,
            view,
        });

        // The clear deferred by the previous present happens against the
        // freshly acquired image, never against the presented one.
        if self.clear_pending {
            self.clear_pending = false;
            if let Some(frame) = &self.frame {
                self.submit_clear_pass(&[&frame.view], Some(&self.context.depth_view), true, true);
            }
        }
        Ok(())
    }

    fn present(&mut self) {
        match self.frame.take() {
            Some(frame) => {
                frame.surface.present();
                self.clear_pending = true;
            }
            None => log::warn!("present called without an acquired frame"),
        }
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color.into_wgpu();
    }

    fn clear(&mut self, color: bool, depth: bool) {
        let Some((views, depth_view)) = self.target_views() else {
            log::warn!("clear: no frame acquired for the backbuffer");
            return;
        };
        self.submit_clear_pass(&views, depth_view, color, depth);
    }

    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        color_textures: &[NativeId],
        with_depth: bool,
    ) -> Result<NativeId, GpuError> {
        let mut color_views = Vec::with_capacity(color_textures.len());
        for id in color_textures {
            let Some(texture) = self.textures.get(*id) else {
                return Err(RenderTargetError::Creation {
                    details: format!("color texture {id:?} not found"),
                }
                .into());
            };
            color_views.push(
                texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
            );
        }

        let depth = with_depth.then(|| {
            let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("render_target_depth"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            DepthAttachment { texture, view }
        });

        Ok(self
            .render_targets
            .add(NativeRenderTarget { color_views, depth }))
    }

    fn destroy_render_target(&mut self, target: NativeId) {
        self.render_targets.remove(target);
    }

    fn bind_render_target(&mut self, target: Option<NativeId>) {
        if let Some(id) = target {
            if !self.render_targets.contains(id) {
                log::error!("bind_render_target: unknown target {id:?}");
                return;
            }
        } else {
            // Back on the swap chain, render to its full extent again.
            self.viewport = None;
        }
        self.current_target = target;
    }

    fn compile_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(NativeId, Vec<UniformBlockBinding>), GpuError> {
        let source = std::str::from_utf8(&descriptor.source).map_err(|e| {
            ShaderError::Compilation {
                label: descriptor.label.clone(),
                details: format!("source is not valid UTF-8: {e}"),
            }
        })?;

        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&descriptor.label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });
        if let Some(error) = pollster::block_on(self.context.device.pop_error_scope()) {
            return Err(ShaderError::Compilation {
                label: descriptor.label.clone(),
                details: error.to_string(),
            }
            .into());
        }

        let base = match descriptor.stage {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => FRAGMENT_BLOCK_BINDING_BASE,
        };
        let blocks: Vec<UniformBlockBinding> = descriptor
            .uniform_blocks
            .iter()
            .enumerate()
            .map(|(i, block)| UniformBlockBinding {
                name: block.name.clone(),
                size: block.size,
                binding: base + i as u32,
            })
            .collect();

        let entry = NativeShaderModule {
            module,
            blocks: blocks.clone(),
        };
        let native = match descriptor.stage {
            ShaderStage::Vertex => self.vertex_modules.add(entry),
            ShaderStage::Fragment => self.fragment_modules.add(entry),
        };
        log::debug!("compiled {:?} module '{}'", descriptor.stage, descriptor.label);
        Ok((native, blocks))
    }

    fn destroy_program(&mut self, stage: ShaderStage, program: NativeId) {
        match stage {
            ShaderStage::Vertex => self.vertex_modules.remove(program),
            ShaderStage::Fragment => self.fragment_modules.remove(program),
        };
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
        vertex: NativeId,
        fragment: NativeId,
    ) -> Result<NativeId, GpuError> {
        let Some(vertex_module) = self.vertex_modules.get(vertex) else {
            return Err(PipelineError::Creation {
                label: descriptor.label.clone(),
                details: "vertex shader module not found (destroyed or never created)".to_string(),
            }
            .into());
        };
        let Some(fragment_module) = self.fragment_modules.get(fragment) else {
            return Err(PipelineError::Creation {
                label: descriptor.label.clone(),
                details: "fragment shader module not found".to_string(),
            }
            .into());
        };

        let device = &self.context.device;

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = vertex_module
            .blocks
            .iter()
            .chain(fragment_module.blocks.iter())
            .map(|block| wgpu::BindGroupLayoutEntry {
                binding: block.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let bind_group_layout = (!layout_entries.is_empty()).then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{}_uniforms", descriptor.label)),
                entries: &layout_entries,
            })
        });
        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}_layout", descriptor.label)),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let attributes: Vec<wgpu::VertexAttribute> = descriptor
            .layout
            .offsets()
            .enumerate()
            .map(|(location, (offset, attribute))| wgpu::VertexAttribute {
                format: attribute.format.into_wgpu(),
                offset: offset as u64,
                shader_location: location as u32,
            })
            .collect();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: descriptor.layout.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&descriptor.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module.module,
                entry_point: None,
                buffers: &vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module.module,
                entry_point: None,
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.context.surface_config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: descriptor.topology.into_wgpu(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
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
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(PipelineError::Creation {
                label: descriptor.label.clone(),
                details: error.to_string(),
            }
            .into());
        }

        Ok(self.pipelines.add(NativePipeline {
            pipeline,
            bind_group_layout,
        }))
    }

    fn destroy_pipeline(&mut self, pipeline: NativeId) {
        if self.bound.as_ref().map(|b| b.pipeline) == Some(pipeline) {
            self.bound = None;
        }
        self.pipelines.remove(pipeline);
    }

    fn bind_pipeline(&mut self, pipeline: NativeId, uniforms: &[(u32, NativeId)]) {
        let Some(entry) = self.pipelines.get(pipeline) else {
            log::error!("bind_pipeline: unknown pipeline {pipeline:?}");
            return;
        };

        let bind_group = entry.bind_group_layout.as_ref().map(|layout| {
            let entries: Vec<wgpu::BindGroupEntry> = uniforms
                .iter()
                .filter_map(|(binding, buffer)| {
                    self.buffers.get(*buffer).map(|native| wgpu::BindGroupEntry {
                        binding: *binding,
                        resource: native.buffer.as_entire_binding(),
                    })
                })
                .collect();
            self.context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("pipeline_uniforms"),
                    layout,
                    entries: &entries,
                })
        });

        self.bound = Some(BoundPipeline {
            pipeline,
            bind_group,
        });
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        _usage: BufferUsage,
        size: usize,
    ) -> Result<NativeId, GpuError> {
        let buffer = self.allocate_native_buffer(kind, size);
        Ok(self.buffers.add(NativeBuffer { buffer }))
    }

    fn reallocate_buffer(
        &mut self,
        buffer: NativeId,
        kind: BufferKind,
        _usage: BufferUsage,
        size: usize,
    ) -> Result<(), GpuError> {
        if !self.buffers.contains(buffer) {
            return Err(GpuError::Backend(format!(
                "reallocate_buffer: unknown native buffer {buffer:?}"
            )));
        }
        let replacement = self.allocate_native_buffer(kind, size);
        // In-place slot replacement keeps the native id stable.
        self.buffers.set(
            buffer,
            NativeBuffer {
                buffer: replacement,
            },
        );
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: NativeId, data: &[u8]) {
        let Some(entry) = self.buffers.get(buffer) else {
            log::error!("upload_buffer: unknown native buffer {buffer:?}");
            return;
        };
        if data.len() % wgpu::COPY_BUFFER_ALIGNMENT as usize == 0 {
            self.context.queue.write_buffer(&entry.buffer, 0, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(data.len().next_multiple_of(4), 0);
            self.context.queue.write_buffer(&entry.buffer, 0, &padded);
        }
    }

    fn destroy_buffer(&mut self, buffer: NativeId) {
        self.buffers.remove(buffer);
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<NativeId, GpuError> {
        let (format, expand) = pixel_format(descriptor.channels, descriptor.format);
        // Attachments use the swap-chain format so pipelines match every
        // target they can be drawn into.
        let format = if descriptor.render_attachment {
            self.context.surface_config.format
        } else {
            format
        };

        let can_mip = descriptor.generate_mipmaps
            && descriptor.format == TextureSampleFormat::Byte
            && !descriptor.render_attachment;
        if descriptor.generate_mipmaps && !can_mip {
            log::warn!(
                "texture '{}': mipmap generation only supported for 8-bit sampled textures",
                descriptor.label
            );
        }
        let mip_level_count = if can_mip {
            Self::mip_level_count(descriptor.width, descriptor.height)
        } else {
            1
        };

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if descriptor.render_attachment {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&descriptor.label),
            size: wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        if let Some(pixels) = pixels {
            let data = if expand {
                Cow::Owned(Self::expand_rgb(pixels, descriptor.format))
            } else {
                Cow::Borrowed(pixels)
            };
            let channels = if expand {
                4
            } else {
                descriptor.channels.count()
            };
            let channel_bytes = match descriptor.format {
                TextureSampleFormat::Byte => 1,
                TextureSampleFormat::Float | TextureSampleFormat::Int => 4,
            };
            let bytes_per_pixel = channels * channel_bytes;

            self.write_pixels(
                &texture,
                &data,
                descriptor.width,
                descriptor.height,
                bytes_per_pixel,
                0,
            );

            if mip_level_count > 1 {
                let mut level_data = data.into_owned();
                let mut width = descriptor.width;
                let mut height = descriptor.height;
                for level in 1..mip_level_count {
                    level_data = Self::downsample(&level_data, width, height, channels);
                    width = (width / 2).max(1);
                    height = (height / 2).max(1);
                    self.write_pixels(&texture, &level_data, width, height, bytes_per_pixel, level);
                }
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = descriptor.filtering.into_wgpu();
        let sampler = self.context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{}_sampler", descriptor.label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: if mip_level_count > 1 {
                wgpu::MipmapFilterMode::Linear
            } else {
                wgpu::MipmapFilterMode::Nearest
            },
            ..Default::default()
        });
        let sampler = self.samplers.add(NativeSampler { sampler });

        Ok(self.textures.add(NativeTexture {
            texture,
            view,
            sampler,
        }))
    }

    fn destroy_texture(&mut self, texture: NativeId) {
        if let Some(entry) = self.textures.remove(texture) {
            self.samplers.remove(entry.sampler);
        }
        self.bound_texture_slots.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, texture: NativeId, slot: u32) {
        if !self.textures.contains(texture) {
            log::error!("bind_texture: unknown texture {texture:?}");
            return;
        }
        self.bound_texture_slots.insert(slot, texture);
    }

    fn draw(&mut self, call: &DrawCall) {
        let Some((views, depth_view)) = self.target_views() else {
            log::error!("draw: no frame acquired for the backbuffer");
            return;
        };
        let Some(pipeline_entry) = self.pipelines.get(call.pipeline) else {
            log::error!("draw: unknown pipeline {:?}", call.pipeline);
            return;
        };
        let Some(vertex_buffer) = self.buffers.get(call.vertex_buffer) else {
            log::error!("draw: unknown vertex buffer {:?}", call.vertex_buffer);
            return;
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();
        let depth_stencil_attachment =
            depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("draw"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("draw"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&pipeline_entry.pipeline);
            if let Some((width, height)) = self.viewport {
                pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            }
            if let Some(bound) = &self.bound {
                if bound.pipeline == call.pipeline {
                    if let Some(bind_group) = &bound.bind_group {
                        pass.set_bind_group(0, bind_group, &[]);
                    }
                }
            }
            pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));

            match call.index {
                Some(index) => {
                    let Some(index_buffer) = self.buffers.get(index.buffer) else {
                        log::error!("draw: unknown index buffer {:?}", index.buffer);
                        return;
                    };
                    pass.set_index_buffer(index_buffer.buffer.slice(..), index.format.into_wgpu());
                    pass.draw_indexed(0..index.count, 0, 0..1);
                }
                None => pass.draw(0..call.vertex_count, 0..1),
            }
        }
        self.context.queue.submit(iter::once(encoder.finish()));
    }
}
