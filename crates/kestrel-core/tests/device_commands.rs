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

//! Integration tests for the graphics device front-end, driven through a
//! recording backend that counts and logs every native-operation call.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kestrel_core::gpu::{
    BufferDescriptor, BufferError, BufferKind, BufferUsage, DrawCall, GpuCommand, GpuError,
    GraphicsApi, GraphicsBackend, IndexData, MeshDescriptor, MeshDrawMode, NativeId, OutputSlot,
    PipelineDescriptor, PipelineError, PrimitiveTopology, ProgramDescriptor, ProgramId,
    ProgramRef, RenderTargetDescriptor, RenderTargetId, ResourceHandle, ShaderError, ShaderStage,
    TextureChannels, TextureDescriptor, TextureFiltering, TextureSampleFormat,
    UniformBlockBinding, VertexAttribute, VertexFormat, VertexLayout,
};
use kestrel_core::math::Color;
use kestrel_core::GraphicsDevice;

/// Counters and a call log shared between a test and its backend.
#[derive(Default)]
struct BackendStats {
    ops: Mutex<Vec<String>>,
    render_target_binds: AtomicUsize,
    pipeline_binds: AtomicUsize,
    buffer_creates: AtomicUsize,
    buffer_destroys: AtomicUsize,
    draws: Mutex<Vec<DrawCall>>,
}

impl BackendStats {
    fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

/// A backend that fulfills the full contract against in-memory tables.
///
/// Compilation fails for sources containing `#error`, imitating a shader
/// compiler diagnostic.
struct RecordingBackend {
    stats: Arc<BackendStats>,
    next: u32,
    vertex_modules: HashSet<u32>,
    fragment_modules: HashSet<u32>,
    pipelines: HashSet<u32>,
    buffers: HashMap<u32, usize>,
    textures: HashSet<u32>,
    render_targets: HashSet<u32>,
}

impl RecordingBackend {
    fn new() -> (Self, Arc<BackendStats>) {
        let stats = Arc::new(BackendStats::default());
        (
            Self {
                stats: Arc::clone(&stats),
                next: 0,
                vertex_modules: HashSet::new(),
                fragment_modules: HashSet::new(),
                pipelines: HashSet::new(),
                buffers: HashMap::new(),
                textures: HashSet::new(),
                render_targets: HashSet::new(),
            },
            stats,
        )
    }

    fn next_native(&mut self) -> NativeId {
        self.next += 1;
        NativeId(self.next)
    }

    fn log(&self, entry: impl Into<String>) {
        self.stats.ops.lock().unwrap().push(entry.into());
    }
}

impl GraphicsBackend for RecordingBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Auto
    }

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    fn begin_frame(&mut self) -> Result<(), GpuError> {
        Ok(())
    }

    fn present(&mut self) {
        self.log("present");
    }

    fn set_clear_color(&mut self, _color: Color) {}

    fn clear(&mut self, _color: bool, _depth: bool) {
        self.log("clear");
    }

    fn create_render_target(
        &mut self,
        _width: u32,
        _height: u32,
        _color_textures: &[NativeId],
        _with_depth: bool,
    ) -> Result<NativeId, GpuError> {
        let native = self.next_native();
        self.render_targets.insert(native.raw());
        self.log("create_render_target");
        Ok(native)
    }

    fn destroy_render_target(&mut self, target: NativeId) {
        self.render_targets.remove(&target.raw());
        self.log("destroy_render_target");
    }

    fn bind_render_target(&mut self, target: Option<NativeId>) {
        self.stats.render_target_binds.fetch_add(1, Ordering::SeqCst);
        self.log(format!("bind_render_target({target:?})"));
    }

    fn compile_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(NativeId, Vec<UniformBlockBinding>), GpuError> {
        if descriptor
            .source
            .windows(6)
            .any(|window| window == b"#error")
        {
            return Err(ShaderError::Compilation {
                label: descriptor.label.clone(),
                details: "synthetic compile error".to_string(),
            }
            .into());
        }

        let native = self.next_native();
        match descriptor.stage {
            ShaderStage::Vertex => self.vertex_modules.insert(native.raw()),
            ShaderStage::Fragment => self.fragment_modules.insert(native.raw()),
        };
        self.log(format!("compile_program({})", descriptor.label));

        let bindings = descriptor
            .uniform_blocks
            .iter()
            .enumerate()
            .map(|(i, block)| UniformBlockBinding {
                name: block.name.clone(),
                size: block.size,
                binding: i as u32,
            })
            .collect();
        Ok((native, bindings))
    }

    fn destroy_program(&mut self, stage: ShaderStage, program: NativeId) {
        match stage {
            ShaderStage::Vertex => self.vertex_modules.remove(&program.raw()),
            ShaderStage::Fragment => self.fragment_modules.remove(&program.raw()),
        };
        self.log("destroy_program");
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
        vertex: NativeId,
        _fragment: NativeId,
    ) -> Result<NativeId, GpuError> {
        if !self.vertex_modules.contains(&vertex.raw()) {
            return Err(PipelineError::Creation {
                label: descriptor.label.clone(),
                details: "vertex module not found".to_string(),
            }
            .into());
        }
        let native = self.next_native();
        self.pipelines.insert(native.raw());
        self.log(format!("create_pipeline({})", descriptor.label));
        Ok(native)
    }

    fn destroy_pipeline(&mut self, pipeline: NativeId) {
        self.pipelines.remove(&pipeline.raw());
        self.log("destroy_pipeline");
    }

    fn bind_pipeline(&mut self, _pipeline: NativeId, _uniforms: &[(u32, NativeId)]) {
        self.stats.pipeline_binds.fetch_add(1, Ordering::SeqCst);
        self.log("bind_pipeline");
    }

    fn create_buffer(
        &mut self,
        _kind: BufferKind,
        _usage: BufferUsage,
        size: usize,
    ) -> Result<NativeId, GpuError> {
        let native = self.next_native();
        self.buffers.insert(native.raw(), size);
        self.stats.buffer_creates.fetch_add(1, Ordering::SeqCst);
        self.log(format!("create_buffer({size})"));
        Ok(native)
    }

    fn reallocate_buffer(
        &mut self,
        buffer: NativeId,
        _kind: BufferKind,
        _usage: BufferUsage,
        size: usize,
    ) -> Result<(), GpuError> {
        match self.buffers.get_mut(&buffer.raw()) {
            Some(stored) => {
                *stored = size;
                self.log(format!("reallocate_buffer({size})"));
                Ok(())
            }
            None => Err(GpuError::Backend("unknown native buffer".to_string())),
        }
    }

    fn upload_buffer(&mut self, _buffer: NativeId, data: &[u8]) {
        self.log(format!("upload_buffer({})", data.len()));
    }

    fn destroy_buffer(&mut self, buffer: NativeId) {
        self.buffers.remove(&buffer.raw());
        self.stats.buffer_destroys.fetch_add(1, Ordering::SeqCst);
        self.log("destroy_buffer");
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        _pixels: Option<&[u8]>,
    ) -> Result<NativeId, GpuError> {
        let native = self.next_native();
        self.textures.insert(native.raw());
        self.log(format!("create_texture({})", descriptor.label));
        Ok(native)
    }

    fn destroy_texture(&mut self, texture: NativeId) {
        self.textures.remove(&texture.raw());
        self.log("destroy_texture");
    }

    fn bind_texture(&mut self, _texture: NativeId, slot: u32) {
        self.log(format!("bind_texture({slot})"));
    }

    fn draw(&mut self, call: &DrawCall) {
        self.stats.draws.lock().unwrap().push(*call);
        self.log("draw");
    }
}

fn device() -> (GraphicsDevice, Arc<BackendStats>) {
    let (backend, stats) = RecordingBackend::new();
    (GraphicsDevice::new(Box::new(backend)), stats)
}

fn buffer_descriptor(size: usize) -> BufferDescriptor {
    BufferDescriptor {
        label: "test_buffer".to_string(),
        kind: BufferKind::Vertex,
        usage: BufferUsage::Static,
        size,
    }
}

fn position_layout() -> VertexLayout {
    VertexLayout::new(vec![VertexAttribute::new(
        "position",
        VertexFormat::Float32x3,
    )])
}

fn triangle_descriptor(indices: Option<IndexData>) -> MeshDescriptor {
    MeshDescriptor {
        label: "triangle".to_string(),
        layout: position_layout(),
        vertices: vec![0u8; 36], // 3 vertices, 12 bytes each
        indices,
    }
}

fn program_descriptor(stage: ShaderStage, source: &str) -> ProgramDescriptor {
    ProgramDescriptor {
        label: match stage {
            ShaderStage::Vertex => "test_vs".to_string(),
            ShaderStage::Fragment => "test_fs".to_string(),
        },
        stage,
        source: source.as_bytes().to_vec(),
        uniform_blocks: Vec::new(),
    }
}

fn bound_pipeline(device: &GraphicsDevice) -> kestrel_core::gpu::PipelineId {
    let vs = device
        .create_program(&program_descriptor(ShaderStage::Vertex, "fn main() {}"))
        .unwrap();
    let fs = device
        .create_program(&program_descriptor(ShaderStage::Fragment, "fn main() {}"))
        .unwrap();
    let pipeline = device
        .create_pipeline(&PipelineDescriptor {
            label: "test_pipeline".to_string(),
            vertex: ProgramRef::Id(vs),
            fragment: ProgramRef::Id(fs),
            layout: position_layout(),
            topology: PrimitiveTopology::TriangleList,
        })
        .unwrap();
    device.bind_pipeline(pipeline);
    pipeline
}

fn render_target_descriptor() -> RenderTargetDescriptor {
    RenderTargetDescriptor {
        label: "offscreen".to_string(),
        width: 64,
        height: 64,
        color_attachments: vec![TextureDescriptor {
            label: String::new(),
            width: 0,
            height: 0,
            channels: TextureChannels::Rgba,
            format: TextureSampleFormat::Byte,
            filtering: TextureFiltering::Linear,
            generate_mipmaps: false,
            render_attachment: true,
        }],
        with_depth: true,
    }
}

// --- Deferred path ---

#[test]
fn deferred_buffer_creation_end_to_end() {
    let (device, _stats) = device();

    let slot = OutputSlot::new();
    let buffer = device.acquire_command_buffer();
    device
        .record_with_output(
            buffer,
            GpuCommand::CreateBuffer(buffer_descriptor(256)),
            Arc::clone(&slot),
        )
        .unwrap();
    device.submit_command_buffer(buffer).unwrap();
    device.execute_command_buffer(buffer).unwrap();

    let id = slot.buffer().expect("creation result missing");
    assert!(id.raw() != 0, "handle zero is reserved");
    assert_eq!(device.with_buffer(id, |b| b.size), Some(256));
}

#[test]
fn commands_replay_in_push_order_and_callback_fires_once_after_all() {
    let (device, stats) = device();

    let buffer = device.acquire_command_buffer();
    for size in [1usize, 2, 3] {
        device
            .record(buffer, GpuCommand::CreateBuffer(buffer_descriptor(size)))
            .unwrap();
    }

    let fired = Arc::new(AtomicUsize::new(0));
    let ops_at_fire = Arc::new(AtomicUsize::new(0));
    {
        let fired = Arc::clone(&fired);
        let ops_at_fire = Arc::clone(&ops_at_fire);
        let stats = Arc::clone(&stats);
        device
            .set_command_buffer_callback(
                buffer,
                Box::new(move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                    ops_at_fire.store(stats.ops.lock().unwrap().len(), Ordering::SeqCst);
                }),
            )
            .unwrap();
    }

    device.submit_command_buffer(buffer).unwrap();
    device.execute_command_buffer(buffer).unwrap();

    assert_eq!(
        stats.ops(),
        vec!["create_buffer(1)", "create_buffer(2)", "create_buffer(3)"],
        "three commands must produce exactly three native calls, in push order"
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(
        ops_at_fire.load(Ordering::SeqCst),
        3,
        "callback must run after the last command"
    );
}

#[test]
fn recording_into_a_submitted_buffer_is_rejected() {
    let (device, stats) = device();

    let buffer = device.acquire_command_buffer();
    device
        .record(buffer, GpuCommand::CreateBuffer(buffer_descriptor(8)))
        .unwrap();
    device.submit_command_buffer(buffer).unwrap();

    let rejected = device.record(buffer, GpuCommand::CreateBuffer(buffer_descriptor(16)));
    assert!(rejected.is_err());

    device.execute_command_buffer(buffer).unwrap();
    assert_eq!(stats.ops(), vec!["create_buffer(8)"]);
}

#[test]
fn failed_program_leaves_dependent_pipeline_failed_in_the_same_buffer() {
    let (device, _stats) = device();

    let vertex_slot = OutputSlot::new();
    let fragment_slot = OutputSlot::new();
    let pipeline_slot = OutputSlot::new();

    let buffer = device.acquire_command_buffer();
    device
        .record_with_output(
            buffer,
            GpuCommand::CreateProgram(program_descriptor(ShaderStage::Vertex, "#error broken")),
            Arc::clone(&vertex_slot),
        )
        .unwrap();
    device
        .record_with_output(
            buffer,
            GpuCommand::CreateProgram(program_descriptor(ShaderStage::Fragment, "fn main() {}")),
            Arc::clone(&fragment_slot),
        )
        .unwrap();
    device
        .record_with_output(
            buffer,
            GpuCommand::CreatePipeline(PipelineDescriptor {
                label: "dependent".to_string(),
                vertex: ProgramRef::Deferred(Arc::clone(&vertex_slot)),
                fragment: ProgramRef::Deferred(Arc::clone(&fragment_slot)),
                layout: position_layout(),
                topology: PrimitiveTopology::TriangleList,
            }),
            Arc::clone(&pipeline_slot),
        )
        .unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    {
        let fired = Arc::clone(&fired);
        device
            .set_command_buffer_callback(
                buffer,
                Box::new(move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
    }

    device.submit_command_buffer(buffer).unwrap();
    device.execute_command_buffer(buffer).unwrap();

    // No guard: the dependent command runs, fails on its own, and the
    // buffer still completes.
    assert!(vertex_slot.program().is_none());
    assert!(fragment_slot.program().is_some());
    assert!(pipeline_slot.pipeline().is_none());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn cross_thread_recording_executes_on_the_owning_thread() {
    let (device, _stats) = device();
    let slot = OutputSlot::new();

    std::thread::scope(|scope| {
        let device = &device;
        let slot = Arc::clone(&slot);
        scope
            .spawn(move || {
                let buffer = device.acquire_command_buffer();
                device
                    .record_with_output(
                        buffer,
                        GpuCommand::CreateBuffer(buffer_descriptor(128)),
                        slot,
                    )
                    .unwrap();
                device.submit_command_buffer(buffer).unwrap();

                // Executing off the owning thread must be refused.
                assert!(matches!(
                    device.execute_command_buffer(buffer),
                    Err(GpuError::NotOwningThread)
                ));
            })
            .join()
            .unwrap();
    });

    assert!(slot.buffer().is_none(), "nothing may run before the drain");
    assert_eq!(device.flush_command_buffers().unwrap(), 1);
    let id = slot.buffer().expect("buffer must exist after the drain");
    assert_eq!(device.with_buffer(id, |b| b.size), Some(128));
}

// --- Immediate path ---

#[test]
fn zero_size_buffer_creation_allocates_no_handle() {
    let (device, stats) = device();

    let result = device.create_buffer(&buffer_descriptor(0));
    assert!(matches!(
        result,
        Err(GpuError::Buffer(BufferError::ZeroSize))
    ));
    assert_eq!(device.live_buffer_count(), 0, "no phantom handle");
    assert_eq!(stats.buffer_creates.load(Ordering::SeqCst), 0);
}

#[test]
fn destroying_a_buffer_twice_is_a_no_op() {
    let (device, stats) = device();

    let id = device.create_buffer(&buffer_descriptor(32)).unwrap();
    device.destroy_buffer(id);
    device.destroy_buffer(id);

    assert_eq!(stats.buffer_destroys.load(Ordering::SeqCst), 1);
    assert!(device.with_buffer(id, |_| ()).is_none());
}

#[test]
fn reallocation_preserves_both_handles() {
    let (device, stats) = device();

    let id = device.create_buffer(&buffer_descriptor(16)).unwrap();
    let native = device.with_buffer(id, |b| b.native).unwrap();

    device.allocate_buffer(id, 64).unwrap();

    assert_eq!(device.with_buffer(id, |b| b.native), Some(native));
    assert_eq!(device.with_buffer(id, |b| b.size), Some(64));
    assert_eq!(
        device.with_buffer(id, |b| b.shadow.clone()),
        Some(vec![0u8; 64]),
        "reallocation discards old contents"
    );
    assert_eq!(
        stats.buffer_creates.load(Ordering::SeqCst),
        1,
        "reallocation must mutate in place, not create a new native buffer"
    );
}

#[test]
fn upload_without_staged_data_is_skipped() {
    let (device, stats) = device();

    let id = device.create_buffer(&buffer_descriptor(64)).unwrap();
    assert!(matches!(
        device.upload_buffer(id),
        Err(GpuError::Buffer(BufferError::EmptyShadow { .. }))
    ));
    assert!(!stats.ops().iter().any(|op| op.starts_with("upload_buffer")));

    device.stage_buffer(id, &[7u8; 64]).unwrap();
    device.upload_buffer(id).unwrap();
    assert!(stats.ops().contains(&"upload_buffer(64)".to_string()));
}

#[test]
fn pipeline_creation_fails_cleanly_without_its_vertex_program() {
    let (device, _stats) = device();

    // Never created.
    let result = device.create_pipeline(&PipelineDescriptor {
        label: "orphan".to_string(),
        vertex: ProgramRef::Id(ProgramId(42)),
        fragment: ProgramRef::Id(ProgramId(43)),
        layout: position_layout(),
        topology: PrimitiveTopology::TriangleList,
    });
    assert!(matches!(
        result,
        Err(GpuError::Pipeline(
            PipelineError::UnresolvedVertexProgram { .. }
        ))
    ));

    // Created, then destroyed before pipeline creation.
    let vs = device
        .create_program(&program_descriptor(ShaderStage::Vertex, "fn main() {}"))
        .unwrap();
    let fs = device
        .create_program(&program_descriptor(ShaderStage::Fragment, "fn main() {}"))
        .unwrap();
    device.destroy_program(vs);

    let result = device.create_pipeline(&PipelineDescriptor {
        label: "stale".to_string(),
        vertex: ProgramRef::Id(vs),
        fragment: ProgramRef::Id(fs),
        layout: position_layout(),
        topology: PrimitiveTopology::TriangleList,
    });
    assert!(result.is_err());
}

#[test]
fn empty_shader_source_is_a_hard_error() {
    let (device, stats) = device();

    let result = device.create_program(&program_descriptor(ShaderStage::Vertex, ""));
    assert!(matches!(
        result,
        Err(GpuError::Shader(ShaderError::EmptySource { .. }))
    ));
    assert!(stats.ops().is_empty(), "the backend must not be reached");
}

#[test]
fn declared_uniform_blocks_become_buffers_with_binding_metadata() {
    let (device, _stats) = device();

    let mut descriptor = program_descriptor(ShaderStage::Vertex, "fn main() {}");
    descriptor.uniform_blocks = vec![
        kestrel_core::gpu::UniformBlockDescriptor {
            name: "ub_camera".to_string(),
            size: 128,
        },
        kestrel_core::gpu::UniformBlockDescriptor {
            name: "ub_model".to_string(),
            size: 64,
        },
    ];

    let program = device.create_program(&descriptor).unwrap();
    let uniform_buffers = device
        .with_program(program, |p| p.uniform_buffers.clone())
        .unwrap();
    assert_eq!(uniform_buffers.len(), 2);

    let camera = uniform_buffers[0];
    assert_eq!(device.with_buffer(camera, |b| b.kind), Some(BufferKind::Uniform));
    assert_eq!(device.with_buffer(camera, |b| b.binding), Some(Some(0)));
    assert_eq!(device.with_buffer(camera, |b| b.size), Some(128));
    assert_eq!(
        device.with_buffer(uniform_buffers[1], |b| b.binding),
        Some(Some(1))
    );

    // Destroying the program takes its auto-created buffers with it.
    device.destroy_program(program);
    assert_eq!(device.live_buffer_count(), 0);
}

#[test]
fn mesh_without_indices_draws_by_vertex_count() {
    let (device, _stats) = device();

    let mesh = device.create_mesh(&triangle_descriptor(None)).unwrap();
    let (draw_mode, vertex_buffer) = device
        .with_mesh(mesh, |m| (m.draw_mode, m.vertex_buffer))
        .unwrap();

    assert_eq!(draw_mode, MeshDrawMode::Vertices);
    assert_eq!(device.with_buffer(vertex_buffer, |b| b.count), Some(3));
    assert_eq!(device.with_buffer(vertex_buffer, |b| b.stride), Some(12));
}

#[test]
fn indexed_and_non_indexed_draw_paths() {
    let (device, stats) = device();
    bound_pipeline(&device);

    let plain = device.create_mesh(&triangle_descriptor(None)).unwrap();
    let indexed = device
        .create_mesh(&triangle_descriptor(Some(IndexData::Uint16(vec![0, 1, 2]))))
        .unwrap();

    device.draw(plain);
    device.draw(indexed);

    let draws = stats.draws.lock().unwrap();
    assert_eq!(draws.len(), 2);
    assert!(draws[0].index.is_none());
    assert_eq!(draws[0].vertex_count, 3);
    let index = draws[1].index.expect("indexed draw must carry indices");
    assert_eq!(index.count, 3);
}

#[test]
fn destroying_a_mesh_destroys_its_buffers() {
    let (device, _stats) = device();

    let mesh = device
        .create_mesh(&triangle_descriptor(Some(IndexData::Uint16(vec![0, 1, 2]))))
        .unwrap();
    assert_eq!(device.live_buffer_count(), 2);

    device.destroy_mesh(mesh);
    assert_eq!(device.live_buffer_count(), 0);
    // Again: silent no-op.
    device.destroy_mesh(mesh);
}

#[test]
fn rebinding_the_active_render_target_is_a_true_no_op() {
    let (device, stats) = device();

    let target = device
        .create_render_target(&render_target_descriptor())
        .unwrap();

    // The backbuffer is active from the start, so this is already a no-op.
    device.set_render_target(RenderTargetId::BACKBUFFER);
    assert_eq!(stats.render_target_binds.load(Ordering::SeqCst), 0);

    device.set_render_target(target);
    assert_eq!(stats.render_target_binds.load(Ordering::SeqCst), 1);

    device.set_render_target(target);
    assert_eq!(
        stats.render_target_binds.load(Ordering::SeqCst),
        1,
        "re-binding the active target must not reach the backend"
    );

    device.set_render_target(RenderTargetId::BACKBUFFER);
    assert_eq!(stats.render_target_binds.load(Ordering::SeqCst), 2);
}

#[test]
fn rebinding_the_bound_pipeline_is_a_true_no_op() {
    let (device, stats) = device();

    let pipeline = bound_pipeline(&device);
    assert_eq!(stats.pipeline_binds.load(Ordering::SeqCst), 1);

    device.bind_pipeline(pipeline);
    assert_eq!(stats.pipeline_binds.load(Ordering::SeqCst), 1);
}

#[test]
fn destroying_the_active_render_target_falls_back_to_the_backbuffer() {
    let (device, _stats) = device();

    let target = device
        .create_render_target(&render_target_descriptor())
        .unwrap();
    let textures = device
        .with_render_target(target, |t| t.textures.clone())
        .unwrap();
    device.set_render_target(target);

    device.destroy_render_target(target);

    assert_eq!(device.active_render_target(), RenderTargetId::BACKBUFFER);
    assert!(device.with_render_target(target, |_| ()).is_none());
    for texture in textures {
        assert!(
            device.with_texture(texture, |_| ()).is_none(),
            "attachment textures must be destroyed with their target"
        );
    }
}

#[test]
fn flush_drains_every_submitted_buffer() {
    let (device, _stats) = device();

    let first = device.acquire_command_buffer();
    device
        .record(first, GpuCommand::CreateBuffer(buffer_descriptor(8)))
        .unwrap();
    device.submit_command_buffer(first).unwrap();

    let second = device.acquire_command_buffer();
    device
        .record(second, GpuCommand::CreateBuffer(buffer_descriptor(8)))
        .unwrap();
    device.submit_command_buffer(second).unwrap();

    assert_eq!(device.flush_command_buffers().unwrap(), 2);
    assert_eq!(device.command_pool().submitted_len(), 0);
    assert_eq!(device.live_buffer_count(), 2);
}
