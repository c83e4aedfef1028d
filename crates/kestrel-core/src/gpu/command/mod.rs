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

//! The deferred command buffer: an ordered, replayable list of device
//! operations bridging caller threads to the device's owning thread.
//!
//! Any thread may acquire a buffer from the [`CommandBufferPool`], record
//! [`GpuCommand`]s into it, and submit it. The owning thread replays the
//! commands in push order, writing creation results into shared
//! [`OutputSlot`]s, then fires the buffer's completion callback exactly
//! once.

mod pool;

pub use pool::CommandBufferPool;

use std::sync::{Arc, Mutex};

use crate::gpu::api::{
    BufferDescriptor, BufferId, MeshDescriptor, MeshId, PipelineDescriptor, PipelineId,
    ProgramDescriptor, ProgramId, RenderTargetDescriptor, RenderTargetId, TextureDescriptor,
    TextureId,
};

/// Identifies one command buffer inside its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u32);

/// Lifecycle state of a pooled command buffer.
///
/// `Available → Recording` on acquire, `Recording → Submitted` on submit
/// (no further appends), `Submitted → Executed → Available` on execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBufferState {
    /// Idle, on the pool's free list.
    Available,
    /// Acquired by a caller; commands may be appended.
    Recording,
    /// Handed back to the pool; immutable, awaiting execution.
    Submitted,
    /// Currently being replayed on the owning thread.
    Executed,
}

/// The result of a creation command, as stored in an [`OutputSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId {
    /// A created shader program.
    Program(ProgramId),
    /// A created pipeline.
    Pipeline(PipelineId),
    /// A created GPU buffer.
    Buffer(BufferId),
    /// A created mesh.
    Mesh(MeshId),
    /// A created texture.
    Texture(TextureId),
    /// A created render target.
    RenderTarget(RenderTargetId),
}

/// A shared slot a creation command writes its result into.
///
/// The slot stays empty when the command fails; callers must treat an empty
/// slot as "resource unavailable".
#[derive(Debug, Default)]
pub struct OutputSlot(Mutex<Option<ResourceId>>);

impl OutputSlot {
    /// Creates an empty, shareable slot.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores a result. Called by the executor; last write wins.
    pub fn fulfill(&self, id: ResourceId) {
        *self.0.lock().unwrap() = Some(id);
    }

    /// Returns the stored result, if any.
    pub fn get(&self) -> Option<ResourceId> {
        *self.0.lock().unwrap()
    }

    /// The stored program id, if the slot holds one.
    pub fn program(&self) -> Option<ProgramId> {
        match self.get() {
            Some(ResourceId::Program(id)) => Some(id),
            _ => None,
        }
    }

    /// The stored pipeline id, if the slot holds one.
    pub fn pipeline(&self) -> Option<PipelineId> {
        match self.get() {
            Some(ResourceId::Pipeline(id)) => Some(id),
            _ => None,
        }
    }

    /// The stored buffer id, if the slot holds one.
    pub fn buffer(&self) -> Option<BufferId> {
        match self.get() {
            Some(ResourceId::Buffer(id)) => Some(id),
            _ => None,
        }
    }

    /// The stored mesh id, if the slot holds one.
    pub fn mesh(&self) -> Option<MeshId> {
        match self.get() {
            Some(ResourceId::Mesh(id)) => Some(id),
            _ => None,
        }
    }

    /// The stored texture id, if the slot holds one.
    pub fn texture(&self) -> Option<TextureId> {
        match self.get() {
            Some(ResourceId::Texture(id)) => Some(id),
            _ => None,
        }
    }

    /// The stored render target id, if the slot holds one.
    pub fn render_target(&self) -> Option<RenderTargetId> {
        match self.get() {
            Some(ResourceId::RenderTarget(id)) => Some(id),
            _ => None,
        }
    }
}

/// A deferred device operation.
///
/// Commands own their descriptor data, so recording from an arbitrary
/// thread imposes no lifetime contract on the caller.
#[derive(Debug)]
pub enum GpuCommand {
    /// Compile a shader program.
    CreateProgram(ProgramDescriptor),
    /// Destroy a shader program.
    DestroyProgram(ProgramId),
    /// Create a pipeline; program references may be deferred output slots.
    CreatePipeline(PipelineDescriptor),
    /// Destroy a pipeline.
    DestroyPipeline(PipelineId),
    /// Create a GPU buffer.
    CreateBuffer(BufferDescriptor),
    /// Reallocate a buffer's backing storage, discarding its contents.
    AllocateBuffer {
        /// The buffer to reallocate.
        buffer: BufferId,
        /// New size in bytes.
        size: usize,
    },
    /// Copy bytes into a buffer's CPU shadow.
    StageBuffer {
        /// The buffer to stage into.
        buffer: BufferId,
        /// Bytes to copy.
        data: Vec<u8>,
    },
    /// Push a buffer's CPU shadow to its native storage.
    UploadBuffer {
        /// The buffer to upload.
        buffer: BufferId,
    },
    /// Destroy a GPU buffer.
    DestroyBuffer(BufferId),
    /// Create a mesh (vertex + optional index buffer, atomically).
    CreateMesh(MeshDescriptor),
    /// Destroy a mesh and its buffers.
    DestroyMesh(MeshId),
    /// Create a texture, optionally from pixel data.
    CreateTexture {
        /// The texture description.
        descriptor: TextureDescriptor,
        /// Initial pixel data, tightly packed.
        pixels: Option<Vec<u8>>,
    },
    /// Destroy a texture.
    DestroyTexture(TextureId),
    /// Create an offscreen render target.
    CreateRenderTarget(RenderTargetDescriptor),
    /// Destroy a render target and its attachment textures.
    DestroyRenderTarget(RenderTargetId),
}

/// Completion callback attached to a command buffer, fired once after the
/// last command executes.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// One recorded entry: an operation plus an optional result slot.
///
/// Immutable once pushed, consumed exactly once during execution.
pub struct Command {
    /// The operation to perform.
    pub op: GpuCommand,
    /// Where to write the created handle, for creation commands.
    pub output: Option<Arc<OutputSlot>>,
}

impl Command {
    /// A command with no result slot.
    pub fn new(op: GpuCommand) -> Self {
        Self { op, output: None }
    }

    /// A command writing its result into `output`.
    pub fn with_output(op: GpuCommand, output: Arc<OutputSlot>) -> Self {
        Self {
            op,
            output: Some(output),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("op", &self.op)
            .field("has_output", &self.output.is_some())
            .finish()
    }
}
