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

//! The concrete graphics device front-end.
//!
//! [`GraphicsDevice`] wraps one native backend and owns everything that is
//! backend-agnostic: the engine-level resource maps, the command-buffer
//! pool, the bound pipeline / active render target tracking, and the
//! owning-thread gate for command-buffer execution.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::gpu::api::{
    BufferDescriptor, BufferId, BufferKind, BufferUsage, GpuBuffer, GraphicsApi, Mesh,
    MeshDescriptor, MeshDrawMode, MeshId, Pipeline, PipelineDescriptor, PipelineId, Program,
    ProgramDescriptor, ProgramId, RenderTarget, RenderTargetDescriptor, RenderTargetId,
    ShaderStage, Texture, TextureDescriptor, TextureId,
};
use crate::gpu::command::{
    Command, CommandBufferId, CommandBufferPool, CompletionCallback, GpuCommand, OutputSlot,
    ResourceId,
};
use crate::gpu::error::{
    BufferError, CommandError, GpuError, MeshError, PipelineError, RenderTargetError, ShaderError,
    TextureError,
};
use crate::gpu::handle::ResourceMap;
use crate::gpu::traits::{DrawCall, GraphicsBackend, IndexedDraw};
use crate::math::Color;

struct DeviceState {
    backend: Box<dyn GraphicsBackend>,
    programs: ResourceMap<ProgramId, Program>,
    pipelines: ResourceMap<PipelineId, Pipeline>,
    buffers: ResourceMap<BufferId, GpuBuffer>,
    meshes: ResourceMap<MeshId, Mesh>,
    textures: ResourceMap<TextureId, Texture>,
    render_targets: ResourceMap<RenderTargetId, RenderTarget>,
    bound_pipeline: Option<PipelineId>,
    active_target: RenderTargetId,
    terminated: bool,
}

/// The graphics device: one native context, one owning thread.
///
/// Immediate operations (creation, binds, draws) must run on the thread
/// that constructed the device; native graphics APIs are not thread-safe
/// across contexts. Any thread may instead record work through the
/// command-buffer surface ([`acquire_command_buffer`](Self::acquire_command_buffer)
/// and friends) and submit it for execution on the owning thread.
pub struct GraphicsDevice {
    owner: ThreadId,
    pool: CommandBufferPool,
    state: Mutex<DeviceState>,
}

impl GraphicsDevice {
    /// Wraps an initialized backend. The calling thread becomes the
    /// device's owning thread.
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        log::info!("graphics device initialized ({:?})", backend.api());
        Self {
            owner: thread::current().id(),
            pool: CommandBufferPool::new(),
            state: Mutex::new(DeviceState {
                backend,
                programs: ResourceMap::new(),
                pipelines: ResourceMap::new(),
                buffers: ResourceMap::new(),
                meshes: ResourceMap::new(),
                textures: ResourceMap::new(),
                render_targets: ResourceMap::new(),
                bound_pipeline: None,
                active_target: RenderTargetId::BACKBUFFER,
                terminated: false,
            }),
        }
    }

    /// The native API the backend was constructed for.
    pub fn api(&self) -> GraphicsApi {
        self.state.lock().unwrap().backend.api()
    }

    /// The thread that owns the native context.
    pub fn owner_thread(&self) -> ThreadId {
        self.owner
    }

    /// Returns `true` when called from the owning thread.
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    // --- Command buffer surface (callable from any thread) ---

    /// Acquires a command buffer for exclusive recording.
    pub fn acquire_command_buffer(&self) -> CommandBufferId {
        self.pool.acquire()
    }

    /// Records a command with no result slot.
    pub fn record(&self, id: CommandBufferId, op: GpuCommand) -> Result<(), CommandError> {
        self.pool.record(id, Command::new(op))
    }

    /// Records a creation command whose result lands in `output` once the
    /// buffer executes. The slot stays empty if the command fails.
    pub fn record_with_output(
        &self,
        id: CommandBufferId,
        op: GpuCommand,
        output: Arc<OutputSlot>,
    ) -> Result<(), CommandError> {
        self.pool.record(id, Command::with_output(op, output))
    }

    /// Attaches the buffer's completion callback, fired once after the last
    /// command executes.
    pub fn set_command_buffer_callback(
        &self,
        id: CommandBufferId,
        callback: CompletionCallback,
    ) -> Result<(), CommandError> {
        self.pool.set_callback(id, callback)
    }

    /// Submits a recorded buffer. The caller must not touch it afterwards.
    pub fn submit_command_buffer(&self, id: CommandBufferId) -> Result<(), CommandError> {
        self.pool.submit(id)
    }

    /// Replays a submitted buffer in push order. Owning thread only.
    ///
    /// Individual command failures are logged and leave their output slots
    /// empty; they never abort the rest of the buffer. The completion
    /// callback fires after the last command, then the buffer returns to
    /// the pool.
    pub fn execute_command_buffer(&self, id: CommandBufferId) -> Result<(), GpuError> {
        if !self.is_owner_thread() {
            log::error!("execute_command_buffer called off the owning thread");
            return Err(GpuError::NotOwningThread);
        }

        let (commands, callback) = self.pool.begin_execute(id)?;
        {
            let mut state = self.state.lock().unwrap();
            for command in commands {
                Self::dispatch(&mut state, command);
            }
        }
        // The state lock is released before user code runs.
        if let Some(callback) = callback {
            callback();
        }
        self.pool.finish_execute(id);
        Ok(())
    }

    /// Drains every submitted buffer, in submission order. Owning thread
    /// only; typically called once per frame before any draw calls.
    pub fn flush_command_buffers(&self) -> Result<usize, GpuError> {
        if !self.is_owner_thread() {
            return Err(GpuError::NotOwningThread);
        }
        let pending = self.pool.submitted_ids();
        let executed = pending.len();
        for id in pending {
            self.execute_command_buffer(id)?;
        }
        Ok(executed)
    }

    /// The pool backing the command-buffer surface.
    pub fn command_pool(&self) -> &CommandBufferPool {
        &self.pool
    }

    // --- Immediate operations (owning thread) ---

    /// Creates an offscreen render target and its attachment textures.
    pub fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, GpuError> {
        Self::create_render_target_locked(&mut self.state.lock().unwrap(), descriptor)
    }

    /// Destroys a render target and its attachment textures. Destroying the
    /// active target rebinds the backbuffer first.
    pub fn destroy_render_target(&self, id: RenderTargetId) {
        Self::destroy_render_target_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Makes a render target current. Re-binding the already-active target
    /// is a true no-op and never reaches the backend.
    pub fn set_render_target(&self, id: RenderTargetId) {
        Self::set_render_target_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Sets the clear color used by [`clear`](Self::clear) and scheduled
    /// post-present clears.
    pub fn set_clear_color(&self, color: Color) {
        self.state.lock().unwrap().backend.set_clear_color(color);
    }

    /// Clears the active render target's attachments.
    pub fn clear(&self, color: bool, depth: bool) {
        self.state.lock().unwrap().backend.clear(color, depth);
    }

    /// Compiles a shader program and auto-creates a uniform buffer per
    /// declared block.
    pub fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, GpuError> {
        Self::create_program_locked(&mut self.state.lock().unwrap(), descriptor)
    }

    /// Destroys a program and the uniform buffers created alongside it.
    pub fn destroy_program(&self, id: ProgramId) {
        Self::destroy_program_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Builds a pipeline over two compiled programs.
    pub fn create_pipeline(&self, descriptor: &PipelineDescriptor) -> Result<PipelineId, GpuError> {
        Self::create_pipeline_locked(&mut self.state.lock().unwrap(), descriptor)
    }

    /// Destroys a pipeline, unbinding it if it was bound.
    pub fn destroy_pipeline(&self, id: PipelineId) {
        Self::destroy_pipeline_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Makes a pipeline current. Re-binding the bound pipeline is a true
    /// no-op and never reaches the backend.
    pub fn bind_pipeline(&self, id: PipelineId) {
        Self::bind_pipeline_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Creates a GPU buffer. Size zero fails without allocating a handle.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, GpuError> {
        let mut state = self.state.lock().unwrap();
        Self::create_buffer_record(
            &mut state,
            descriptor.label.clone(),
            descriptor.kind,
            descriptor.usage,
            descriptor.size,
            None,
        )
    }

    /// Reallocates a buffer's backing storage in place, discarding its
    /// contents. The handle and the native id both stay valid.
    pub fn allocate_buffer(&self, id: BufferId, size: usize) -> Result<(), GpuError> {
        Self::allocate_buffer_locked(&mut self.state.lock().unwrap(), id, size)
    }

    /// Copies bytes into a buffer's CPU shadow without touching native
    /// storage.
    pub fn stage_buffer(&self, id: BufferId, data: &[u8]) -> Result<(), GpuError> {
        Self::stage_buffer_locked(&mut self.state.lock().unwrap(), id, data)
    }

    /// Pushes a buffer's CPU shadow to its native storage. An empty shadow
    /// logs an error and skips the upload.
    pub fn upload_buffer(&self, id: BufferId) -> Result<(), GpuError> {
        Self::upload_buffer_locked(&mut self.state.lock().unwrap(), id)
    }

    /// Destroys a buffer: native storage, CPU shadow, and any platform side
    /// data. A second destroy of the same id is a no-op.
    pub fn destroy_buffer(&self, id: BufferId) {
        Self::destroy_buffer_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Creates a mesh atomically: the vertex buffer and the optional index
    /// buffer either both exist afterwards or neither does.
    pub fn create_mesh(&self, descriptor: &MeshDescriptor) -> Result<MeshId, GpuError> {
        Self::create_mesh_locked(&mut self.state.lock().unwrap(), descriptor)
    }

    /// Destroys a mesh and both of its buffers.
    pub fn destroy_mesh(&self, id: MeshId) {
        Self::destroy_mesh_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Creates a texture (and its sampler), optionally from pixel data.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, GpuError> {
        Self::create_texture_locked(&mut self.state.lock().unwrap(), descriptor, pixels)
    }

    /// Destroys a texture.
    pub fn destroy_texture(&self, id: TextureId) {
        Self::destroy_texture_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Binds a texture to a shader slot.
    pub fn bind_texture(&self, id: TextureId, slot: u32) {
        let mut state = self.state.lock().unwrap();
        let DeviceState {
            backend, textures, ..
        } = &mut *state;
        match textures.get(id) {
            Some(texture) => backend.bind_texture(texture.native, slot),
            None => log::error!("bind_texture: unknown texture {id:?}"),
        }
    }

    /// Draws a mesh with the bound pipeline: uploads the pipeline's uniform
    /// buffers, binds the mesh's buffers into the fixed input slots, and
    /// issues one draw call sized by vertex or index count.
    pub fn draw(&self, id: MeshId) {
        Self::draw_locked(&mut self.state.lock().unwrap(), id);
    }

    /// Reconfigures the swap chain and viewport after a window resize.
    pub fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.lock().unwrap();
        state.backend.on_resize(width, height);
        state.backend.set_viewport(width, height);
    }

    /// Acquires the next swap-chain image, applying any clear scheduled by
    /// the previous present.
    pub fn begin_frame(&self) -> Result<(), GpuError> {
        self.state.lock().unwrap().backend.begin_frame()
    }

    /// Flips the swap chain, then schedules the clear of the
    /// newly-presented target for the start of the next frame.
    pub fn present(&self) {
        self.state.lock().unwrap().backend.present();
    }

    /// Releases every outstanding resource. Idempotent; also runs on drop.
    pub fn terminate(&self) {
        let mut state = self.state.lock().unwrap();
        if state.terminated {
            return;
        }
        state.terminated = true;

        let DeviceState {
            backend,
            programs,
            pipelines,
            buffers,
            meshes,
            textures,
            render_targets,
            bound_pipeline,
            active_target,
            ..
        } = &mut *state;

        *bound_pipeline = None;
        *active_target = RenderTargetId::BACKBUFFER;
        backend.bind_render_target(None);

        meshes.drain();
        for (_, pipeline) in pipelines.drain() {
            backend.destroy_pipeline(pipeline.native);
        }
        for (_, program) in programs.drain() {
            backend.destroy_program(program.stage, program.native);
        }
        for (_, target) in render_targets.drain() {
            backend.destroy_render_target(target.native);
        }
        for (_, texture) in textures.drain() {
            backend.destroy_texture(texture.native);
        }
        for (_, buffer) in buffers.drain() {
            backend.destroy_buffer(buffer.native);
        }
        log::info!("graphics device terminated, all resources released");
    }

    // --- Introspection ---

    /// Runs `f` over the buffer record for `id`, if it is live.
    pub fn with_buffer<R>(&self, id: BufferId, f: impl FnOnce(&GpuBuffer) -> R) -> Option<R> {
        self.state.lock().unwrap().buffers.get(id).map(f)
    }

    /// Runs `f` over the mesh record for `id`, if it is live.
    pub fn with_mesh<R>(&self, id: MeshId, f: impl FnOnce(&Mesh) -> R) -> Option<R> {
        self.state.lock().unwrap().meshes.get(id).map(f)
    }

    /// Runs `f` over the program record for `id`, if it is live.
    pub fn with_program<R>(&self, id: ProgramId, f: impl FnOnce(&Program) -> R) -> Option<R> {
        self.state.lock().unwrap().programs.get(id).map(f)
    }

    /// Runs `f` over the pipeline record for `id`, if it is live.
    pub fn with_pipeline<R>(&self, id: PipelineId, f: impl FnOnce(&Pipeline) -> R) -> Option<R> {
        self.state.lock().unwrap().pipelines.get(id).map(f)
    }

    /// Runs `f` over the texture record for `id`, if it is live.
    pub fn with_texture<R>(&self, id: TextureId, f: impl FnOnce(&Texture) -> R) -> Option<R> {
        self.state.lock().unwrap().textures.get(id).map(f)
    }

    /// Runs `f` over the render target record for `id`, if it is live.
    pub fn with_render_target<R>(
        &self,
        id: RenderTargetId,
        f: impl FnOnce(&RenderTarget) -> R,
    ) -> Option<R> {
        self.state.lock().unwrap().render_targets.get(id).map(f)
    }

    /// The currently bound pipeline, if any.
    pub fn bound_pipeline(&self) -> Option<PipelineId> {
        self.state.lock().unwrap().bound_pipeline
    }

    /// The currently active render target.
    pub fn active_render_target(&self) -> RenderTargetId {
        self.state.lock().unwrap().active_target
    }

    /// Number of live GPU buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().unwrap().buffers.len()
    }

    /// Finds a uniform buffer of a pipeline's programs by block name.
    pub fn find_uniform_buffer(&self, pipeline: PipelineId, name: &str) -> Option<BufferId> {
        let state = self.state.lock().unwrap();
        let pipeline = state.pipelines.get(pipeline)?;
        for program_id in [pipeline.vertex, pipeline.fragment] {
            if let Some(program) = state.programs.get(program_id) {
                for &buffer_id in &program.uniform_buffers {
                    if let Some(buffer) = state.buffers.get(buffer_id) {
                        if buffer.label == name {
                            return Some(buffer_id);
                        }
                    }
                }
            }
        }
        None
    }

    // --- Command dispatch ---

    fn dispatch(state: &mut DeviceState, command: Command) {
        let Command { op, output } = command;
        let result: Result<Option<ResourceId>, GpuError> = match op {
            GpuCommand::CreateProgram(desc) => {
                Self::create_program_locked(state, &desc).map(|id| Some(ResourceId::Program(id)))
            }
            GpuCommand::DestroyProgram(id) => {
                Self::destroy_program_locked(state, id);
                Ok(None)
            }
            GpuCommand::CreatePipeline(desc) => {
                Self::create_pipeline_locked(state, &desc).map(|id| Some(ResourceId::Pipeline(id)))
            }
            GpuCommand::DestroyPipeline(id) => {
                Self::destroy_pipeline_locked(state, id);
                Ok(None)
            }
            GpuCommand::CreateBuffer(desc) => Self::create_buffer_record(
                state,
                desc.label.clone(),
                desc.kind,
                desc.usage,
                desc.size,
                None,
            )
            .map(|id| Some(ResourceId::Buffer(id))),
            GpuCommand::AllocateBuffer { buffer, size } => {
                Self::allocate_buffer_locked(state, buffer, size).map(|_| None)
            }
            GpuCommand::StageBuffer { buffer, data } => {
                Self::stage_buffer_locked(state, buffer, &data).map(|_| None)
            }
            GpuCommand::UploadBuffer { buffer } => {
                Self::upload_buffer_locked(state, buffer).map(|_| None)
            }
            GpuCommand::DestroyBuffer(id) => {
                Self::destroy_buffer_locked(state, id);
                Ok(None)
            }
            GpuCommand::CreateMesh(desc) => {
                Self::create_mesh_locked(state, &desc).map(|id| Some(ResourceId::Mesh(id)))
            }
            GpuCommand::DestroyMesh(id) => {
                Self::destroy_mesh_locked(state, id);
                Ok(None)
            }
            GpuCommand::CreateTexture { descriptor, pixels } => {
                Self::create_texture_locked(state, &descriptor, pixels.as_deref())
                    .map(|id| Some(ResourceId::Texture(id)))
            }
            GpuCommand::DestroyTexture(id) => {
                Self::destroy_texture_locked(state, id);
                Ok(None)
            }
            GpuCommand::CreateRenderTarget(desc) => Self::create_render_target_locked(state, &desc)
                .map(|id| Some(ResourceId::RenderTarget(id))),
            GpuCommand::DestroyRenderTarget(id) => {
                Self::destroy_render_target_locked(state, id);
                Ok(None)
            }
        };

        match result {
            Ok(Some(id)) => {
                if let Some(slot) = output {
                    slot.fulfill(id);
                }
            }
            Ok(None) => {}
            // A failed command leaves its slot empty; the rest of the
            // buffer still runs. Callers null-check the slot.
            Err(e) => log::error!("deferred command failed: {e}"),
        }
    }

    // --- Locked operation bodies ---

    fn create_render_target_locked(
        state: &mut DeviceState,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, GpuError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            log::error!(
                "render target '{}': zero extent {}x{}",
                descriptor.label,
                descriptor.width,
                descriptor.height
            );
            return Err(RenderTargetError::ZeroExtent.into());
        }

        let mut texture_ids = Vec::with_capacity(descriptor.color_attachments.len());
        let mut natives = Vec::with_capacity(descriptor.color_attachments.len());
        for (i, attachment) in descriptor.color_attachments.iter().enumerate() {
            let mut tex = attachment.clone();
            tex.label = format!("{}_color{}", descriptor.label, i);
            tex.width = descriptor.width;
            tex.height = descriptor.height;
            tex.render_attachment = true;

            match Self::create_texture_locked(state, &tex, None) {
                Ok(id) => {
                    // Just created, so the lookup cannot miss.
                    if let Some(texture) = state.textures.get(id) {
                        natives.push(texture.native);
                    }
                    texture_ids.push(id);
                }
                Err(e) => {
                    for id in texture_ids {
                        Self::destroy_texture_locked(state, id);
                    }
                    return Err(e);
                }
            }
        }

        match state.backend.create_render_target(
            descriptor.width,
            descriptor.height,
            &natives,
            descriptor.with_depth,
        ) {
            Ok(native) => Ok(state.render_targets.add(RenderTarget {
                label: descriptor.label.clone(),
                width: descriptor.width,
                height: descriptor.height,
                textures: texture_ids,
                with_depth: descriptor.with_depth,
                native,
            })),
            Err(e) => {
                for id in texture_ids {
                    Self::destroy_texture_locked(state, id);
                }
                Err(e)
            }
        }
    }

    fn destroy_render_target_locked(state: &mut DeviceState, id: RenderTargetId) {
        if id.is_backbuffer() {
            log::error!("the backbuffer cannot be destroyed");
            return;
        }
        if state.active_target == id {
            log::warn!("destroying the active render target {id:?}, rebinding the backbuffer");
            Self::set_render_target_locked(state, RenderTargetId::BACKBUFFER);
        }
        if let Some(target) = state.render_targets.remove(id) {
            state.backend.destroy_render_target(target.native);
            for texture in target.textures {
                Self::destroy_texture_locked(state, texture);
            }
        }
    }

    fn set_render_target_locked(state: &mut DeviceState, id: RenderTargetId) {
        if state.active_target == id {
            return;
        }
        if id.is_backbuffer() {
            state.backend.bind_render_target(None);
            state.active_target = id;
            return;
        }
        let DeviceState {
            backend,
            render_targets,
            active_target,
            ..
        } = state;
        match render_targets.get(id) {
            Some(target) => {
                backend.bind_render_target(Some(target.native));
                backend.set_viewport(target.width, target.height);
                *active_target = id;
            }
            None => log::error!("set_render_target: unknown render target {id:?}"),
        }
    }

    fn create_program_locked(
        state: &mut DeviceState,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramId, GpuError> {
        if descriptor.source.is_empty() {
            log::error!(
                "program '{}': cannot compile with empty source",
                descriptor.label
            );
            return Err(ShaderError::EmptySource {
                stage: descriptor.stage,
            }
            .into());
        }

        let (native, blocks) = state.backend.compile_program(descriptor)?;

        let mut uniform_buffers = Vec::with_capacity(blocks.len());
        for block in blocks {
            match Self::create_buffer_record(
                state,
                block.name.clone(),
                BufferKind::Uniform,
                BufferUsage::Dynamic,
                block.size,
                Some(block.binding),
            ) {
                Ok(id) => uniform_buffers.push(id),
                Err(e) => log::error!(
                    "program '{}': failed to create uniform buffer '{}': {e}",
                    descriptor.label,
                    block.name
                ),
            }
        }

        let id = state.programs.add(Program {
            label: descriptor.label.clone(),
            stage: descriptor.stage,
            native,
            uniform_buffers,
        });
        log::debug!("created program '{}' as {id:?}", descriptor.label);
        Ok(id)
    }

    fn destroy_program_locked(state: &mut DeviceState, id: ProgramId) {
        if let Some(program) = state.programs.remove(id) {
            state.backend.destroy_program(program.stage, program.native);
            for buffer in program.uniform_buffers {
                Self::destroy_buffer_locked(state, buffer);
            }
        }
    }

    fn create_pipeline_locked(
        state: &mut DeviceState,
        descriptor: &PipelineDescriptor,
    ) -> Result<PipelineId, GpuError> {
        let vertex_id = descriptor.vertex.resolve().ok_or_else(|| {
            PipelineError::UnresolvedVertexProgram {
                label: descriptor.label.clone(),
            }
        })?;
        let fragment_id = descriptor.fragment.resolve().ok_or_else(|| {
            PipelineError::UnresolvedFragmentProgram {
                label: descriptor.label.clone(),
            }
        })?;

        let DeviceState {
            backend,
            programs,
            pipelines,
            ..
        } = state;

        let vertex =
            programs
                .get(vertex_id)
                .ok_or_else(|| PipelineError::UnresolvedVertexProgram {
                    label: descriptor.label.clone(),
                })?;
        let fragment =
            programs
                .get(fragment_id)
                .ok_or_else(|| PipelineError::UnresolvedFragmentProgram {
                    label: descriptor.label.clone(),
                })?;

        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            log::warn!(
                "pipeline '{}': program stages are swapped or mismatched",
                descriptor.label
            );
        }

        let native = backend.create_pipeline(descriptor, vertex.native, fragment.native)?;
        let id = pipelines.add(Pipeline {
            label: descriptor.label.clone(),
            native,
            vertex: vertex_id,
            fragment: fragment_id,
            topology: descriptor.topology,
        });
        log::debug!("created pipeline '{}' as {id:?}", descriptor.label);
        Ok(id)
    }

    fn destroy_pipeline_locked(state: &mut DeviceState, id: PipelineId) {
        if let Some(pipeline) = state.pipelines.remove(id) {
            state.backend.destroy_pipeline(pipeline.native);
            if state.bound_pipeline == Some(id) {
                state.bound_pipeline = None;
            }
        }
    }

    fn bind_pipeline_locked(state: &mut DeviceState, id: PipelineId) {
        if state.bound_pipeline == Some(id) {
            return;
        }
        let DeviceState {
            backend,
            programs,
            pipelines,
            buffers,
            bound_pipeline,
            ..
        } = state;

        let Some(pipeline) = pipelines.get(id) else {
            log::error!("bind_pipeline: unknown pipeline {id:?}");
            return;
        };

        let mut uniforms = Vec::new();
        for program_id in [pipeline.vertex, pipeline.fragment] {
            if let Some(program) = programs.get(program_id) {
                for &buffer_id in &program.uniform_buffers {
                    if let Some(buffer) = buffers.get(buffer_id) {
                        if let Some(binding) = buffer.binding {
                            uniforms.push((binding, buffer.native));
                        }
                    }
                }
            }
        }

        backend.bind_pipeline(pipeline.native, &uniforms);
        *bound_pipeline = Some(id);
    }

    fn create_buffer_record(
        state: &mut DeviceState,
        label: String,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
        binding: Option<u32>,
    ) -> Result<BufferId, GpuError> {
        if size == 0 {
            log::error!("buffer '{label}': cannot create a GPU buffer with size zero");
            return Err(BufferError::ZeroSize.into());
        }

        let native = state.backend.create_buffer(kind, usage, size)?;
        // The shadow stays empty until the buffer is allocated or staged.
        let id = state.buffers.add(GpuBuffer {
            label,
            kind,
            usage,
            size,
            shadow: Vec::new(),
            count: 0,
            stride: 0,
            native,
            binding,
        });
        Ok(id)
    }

    fn allocate_buffer_locked(
        state: &mut DeviceState,
        id: BufferId,
        size: usize,
    ) -> Result<(), GpuError> {
        if size == 0 {
            log::error!("allocate_buffer: cannot allocate zero bytes for {id:?}");
            return Err(BufferError::ZeroSize.into());
        }
        let DeviceState {
            backend, buffers, ..
        } = state;
        let Some(buffer) = buffers.get_mut(id) else {
            return Err(BufferError::NotFound { id }.into());
        };
        backend.reallocate_buffer(buffer.native, buffer.kind, buffer.usage, size)?;
        buffer.size = size;
        buffer.shadow = vec![0; size];
        Ok(())
    }

    fn stage_buffer_locked(
        state: &mut DeviceState,
        id: BufferId,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let Some(buffer) = state.buffers.get_mut(id) else {
            return Err(BufferError::NotFound { id }.into());
        };
        if buffer.size == 0 {
            log::error!("stage_buffer: {id:?} has no allocated storage");
            return Err(BufferError::ZeroSize.into());
        }
        buffer.stage(data);
        Ok(())
    }

    fn upload_buffer_locked(state: &mut DeviceState, id: BufferId) -> Result<(), GpuError> {
        let DeviceState {
            backend, buffers, ..
        } = state;
        let Some(buffer) = buffers.get(id) else {
            return Err(BufferError::NotFound { id }.into());
        };
        if buffer.shadow.is_empty() || buffer.size == 0 {
            log::error!("upload_buffer: {id:?} has no staged data or zero size");
            return Err(BufferError::EmptyShadow { id }.into());
        }
        backend.upload_buffer(buffer.native, &buffer.shadow);
        Ok(())
    }

    fn destroy_buffer_locked(state: &mut DeviceState, id: BufferId) {
        if let Some(buffer) = state.buffers.remove(id) {
            state.backend.destroy_buffer(buffer.native);
        }
    }

    fn create_mesh_locked(
        state: &mut DeviceState,
        descriptor: &MeshDescriptor,
    ) -> Result<MeshId, GpuError> {
        if descriptor.vertices.is_empty() {
            log::error!("mesh '{}': no vertex data", descriptor.label);
            return Err(MeshError::EmptyVertexData.into());
        }
        let stride = descriptor.layout.stride();
        if stride == 0 {
            log::error!("mesh '{}': empty vertex layout", descriptor.label);
            return Err(MeshError::EmptyLayout.into());
        }

        let vertex_buffer = Self::create_buffer_record(
            state,
            format!("{}_vb", descriptor.label),
            BufferKind::Vertex,
            BufferUsage::Static,
            descriptor.vertices.len(),
            None,
        )?;
        {
            let DeviceState {
                backend, buffers, ..
            } = state;
            if let Some(buffer) = buffers.get_mut(vertex_buffer) {
                buffer.stage(&descriptor.vertices);
                buffer.count = (descriptor.vertices.len() / stride as usize) as u32;
                buffer.stride = stride;
                backend.upload_buffer(buffer.native, &buffer.shadow);
            }
        }

        let (index_buffer, draw_mode, index_format) = match &descriptor.indices {
            Some(indices) if !indices.is_empty() => {
                let bytes = indices.as_bytes();
                match Self::create_buffer_record(
                    state,
                    format!("{}_ib", descriptor.label),
                    BufferKind::Index,
                    BufferUsage::Static,
                    bytes.len(),
                    None,
                ) {
                    Ok(id) => {
                        let DeviceState {
                            backend, buffers, ..
                        } = state;
                        if let Some(buffer) = buffers.get_mut(id) {
                            buffer.stage(bytes);
                            buffer.count = indices.len() as u32;
                            backend.upload_buffer(buffer.native, &buffer.shadow);
                        }
                        (Some(id), MeshDrawMode::Indices, Some(indices.format()))
                    }
                    Err(e) => {
                        // Atomicity: no half-created mesh survives.
                        Self::destroy_buffer_locked(state, vertex_buffer);
                        return Err(e);
                    }
                }
            }
            _ => (None, MeshDrawMode::Vertices, None),
        };

        let id = state.meshes.add(Mesh {
            label: descriptor.label.clone(),
            vertex_buffer,
            index_buffer,
            draw_mode,
            index_format,
        });
        log::debug!("created mesh '{}' as {id:?}", descriptor.label);
        Ok(id)
    }

    fn destroy_mesh_locked(state: &mut DeviceState, id: MeshId) {
        if let Some(mesh) = state.meshes.remove(id) {
            if let Some(index_buffer) = mesh.index_buffer {
                Self::destroy_buffer_locked(state, index_buffer);
            }
            Self::destroy_buffer_locked(state, mesh.vertex_buffer);
        }
    }

    fn create_texture_locked(
        state: &mut DeviceState,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, GpuError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            log::error!("texture '{}': zero extent", descriptor.label);
            return Err(TextureError::ZeroExtent.into());
        }
        let native = state.backend.create_texture(descriptor, pixels)?;
        Ok(state.textures.add(Texture {
            label: descriptor.label.clone(),
            width: descriptor.width,
            height: descriptor.height,
            channels: descriptor.channels,
            native,
        }))
    }

    fn destroy_texture_locked(state: &mut DeviceState, id: TextureId) {
        if let Some(texture) = state.textures.remove(id) {
            state.backend.destroy_texture(texture.native);
        }
    }

    fn draw_locked(state: &mut DeviceState, id: MeshId) {
        let DeviceState {
            backend,
            programs,
            pipelines,
            buffers,
            meshes,
            bound_pipeline,
            ..
        } = state;

        let Some(pipeline_id) = *bound_pipeline else {
            log::error!("draw: no pipeline bound");
            return;
        };
        let Some(pipeline) = pipelines.get(pipeline_id) else {
            log::error!("draw: bound pipeline {pipeline_id:?} is gone");
            return;
        };

        // Restage the bound pipeline's uniform blocks before the call, the
        // shadow copy being the source of truth for their contents.
        for program_id in [pipeline.vertex, pipeline.fragment] {
            if let Some(program) = programs.get(program_id) {
                for &buffer_id in &program.uniform_buffers {
                    if let Some(buffer) = buffers.get(buffer_id) {
                        if !buffer.shadow.is_empty() {
                            backend.upload_buffer(buffer.native, &buffer.shadow);
                        }
                    }
                }
            }
        }

        let Some(mesh) = meshes.get(id) else {
            log::error!("draw: unknown mesh {id:?}");
            return;
        };
        let Some(vertex_buffer) = buffers.get(mesh.vertex_buffer) else {
            log::error!("draw: mesh {id:?} vertex buffer is gone");
            return;
        };

        let index = match mesh.draw_mode {
            MeshDrawMode::Indices => mesh
                .index_buffer
                .and_then(|ib| buffers.get(ib))
                .zip(mesh.index_format)
                .map(|(buffer, format)| IndexedDraw {
                    buffer: buffer.native,
                    format,
                    count: buffer.count,
                }),
            MeshDrawMode::Vertices => None,
        };

        backend.draw(&DrawCall {
            pipeline: pipeline.native,
            vertex_buffer: vertex_buffer.native,
            vertex_count: vertex_buffer.count,
            stride: vertex_buffer.stride,
            index,
        });
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        self.terminate();
    }
}
