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

use crate::gpu::api::{
    BufferKind, BufferUsage, GraphicsApi, IndexFormat, PipelineDescriptor, ProgramDescriptor,
    ShaderStage, TextureDescriptor,
};
use crate::gpu::error::GpuError;
use crate::gpu::handle::NativeId;
use crate::math::Color;

/// The binding metadata the backend attaches to one declared uniform block.
#[derive(Debug, Clone)]
pub struct UniformBlockBinding {
    /// Block name, as declared.
    pub name: String,
    /// Block size in bytes.
    pub size: usize,
    /// The native binding index the block was assigned.
    pub binding: u32,
}

/// The indexed portion of a draw submission.
#[derive(Debug, Clone, Copy)]
pub struct IndexedDraw {
    /// Native index buffer.
    pub buffer: NativeId,
    /// Index width.
    pub format: IndexFormat,
    /// Number of indices to draw.
    pub count: u32,
}

/// A fully resolved draw submission handed to the backend.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall {
    /// Native pipeline to draw with.
    pub pipeline: NativeId,
    /// Native vertex buffer bound to the fixed input slot.
    pub vertex_buffer: NativeId,
    /// Number of vertices, used when `index` is absent.
    pub vertex_count: u32,
    /// Per-vertex stride in bytes.
    pub stride: u32,
    /// Present for indexed draws.
    pub index: Option<IndexedDraw>,
}

/// The abstract contract every native graphics backend implements.
///
/// A backend owns the native context and one resource map per native
/// resource kind; it deals exclusively in [`NativeId`]s. All methods must be
/// called on the thread that created the native context — the
/// [`GraphicsDevice`](crate::gpu::device::GraphicsDevice) enforces this
/// above.
///
/// Backend guarantees (in addition to each method's own contract):
///
/// - a destroyed handle's slot is never returned by a later unrelated
///   lookup;
/// - reallocating a buffer preserves its native id (in-place slot
///   replacement, not a new handle);
/// - destroying a vertex-stage program also releases any per-stage side
///   storage kept only for later pipeline derivation.
pub trait GraphicsBackend: Send {
    /// The native API this backend was constructed for.
    fn api(&self) -> GraphicsApi;

    /// Reconfigures the swap chain after a window resize.
    fn on_resize(&mut self, width: u32, height: u32);

    /// Sets the rasterizer viewport.
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Acquires the next swap-chain image. Clears it if a clear was
    /// scheduled by the previous [`present`](Self::present).
    fn begin_frame(&mut self) -> Result<(), GpuError>;

    /// Flips the swap chain and schedules a clear of the newly presented
    /// target for the start of the next frame.
    fn present(&mut self);

    /// Sets the color used by [`clear`](Self::clear) and scheduled clears.
    fn set_clear_color(&mut self, color: Color);

    /// Clears the currently bound target's attachments.
    fn clear(&mut self, color: bool, depth: bool);

    /// Creates an offscreen render target over already-created native
    /// color textures.
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        color_textures: &[NativeId],
        with_depth: bool,
    ) -> Result<NativeId, GpuError>;

    /// Destroys a render target (not its color textures).
    fn destroy_render_target(&mut self, target: NativeId);

    /// Binds a render target; `None` binds the backbuffer.
    fn bind_render_target(&mut self, target: Option<NativeId>);

    /// Compiles one shader stage, returning the native module and the
    /// binding metadata for the descriptor's declared uniform blocks.
    fn compile_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(NativeId, Vec<UniformBlockBinding>), GpuError>;

    /// Destroys a compiled program, including per-stage side storage.
    fn destroy_program(&mut self, stage: ShaderStage, program: NativeId);

    /// Builds a pipeline state object over already-compiled programs.
    /// Fails when `vertex` no longer names a live native module.
    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
        vertex: NativeId,
        fragment: NativeId,
    ) -> Result<NativeId, GpuError>;

    /// Destroys a pipeline state object.
    fn destroy_pipeline(&mut self, pipeline: NativeId);

    /// Makes a pipeline current, binding `uniforms` as
    /// `(binding index, native uniform buffer)` pairs.
    fn bind_pipeline(&mut self, pipeline: NativeId, uniforms: &[(u32, NativeId)]);

    /// Creates a native buffer of `size` bytes.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
    ) -> Result<NativeId, GpuError>;

    /// Replaces a buffer's backing storage in place; the native id stays
    /// valid, old contents are discarded.
    fn reallocate_buffer(
        &mut self,
        buffer: NativeId,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
    ) -> Result<(), GpuError>;

    /// Copies `data` into the native buffer.
    fn upload_buffer(&mut self, buffer: NativeId, data: &[u8]);

    /// Destroys a native buffer.
    fn destroy_buffer(&mut self, buffer: NativeId);

    /// Creates a texture (and its sampler), optionally from pixel data.
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<NativeId, GpuError>;

    /// Destroys a texture and its sampler.
    fn destroy_texture(&mut self, texture: NativeId);

    /// Binds a texture to a shader slot.
    fn bind_texture(&mut self, texture: NativeId, slot: u32);

    /// Issues one draw call against the currently bound pipeline and
    /// render target.
    fn draw(&mut self, call: &DrawCall);
}
