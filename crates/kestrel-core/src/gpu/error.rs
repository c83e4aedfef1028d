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

//! The hierarchy of error types for the graphics device layer.
//!
//! Errors are surfaced through `Result`s; command-buffer replay converts
//! per-command failures into a log entry and an empty output slot and keeps
//! going, so one failed creation never aborts the rest of a buffer.

use std::fmt;

use crate::gpu::api::{
    BufferId, MeshId, PipelineId, ProgramId, RenderTargetId, ShaderStage, TextureChannels,
    TextureId, TextureSampleFormat,
};
use crate::gpu::command::{CommandBufferId, CommandBufferState};

/// An error compiling or addressing a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// The supplied shader source was empty.
    EmptySource {
        /// Stage the program was meant for.
        stage: ShaderStage,
    },
    /// The backend failed to compile the source.
    Compilation {
        /// Program label.
        label: String,
        /// Compiler diagnostics, when available.
        details: String,
    },
    /// The requested program does not exist (destroyed or never created).
    NotFound {
        /// The missing program.
        id: ProgramId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::EmptySource { stage } => {
                write!(f, "cannot compile {stage:?} shader with empty source")
            }
            ShaderError::Compilation { label, details } => {
                write!(f, "shader compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => write!(f, "shader program not found: {id:?}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error creating or addressing a pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The vertex program reference could not be resolved.
    UnresolvedVertexProgram {
        /// Pipeline label.
        label: String,
    },
    /// The fragment program reference could not be resolved.
    UnresolvedFragmentProgram {
        /// Pipeline label.
        label: String,
    },
    /// The backend failed to build the pipeline state object.
    Creation {
        /// Pipeline label.
        label: String,
        /// Backend diagnostics, when available.
        details: String,
    },
    /// The requested pipeline does not exist.
    NotFound {
        /// The missing pipeline.
        id: PipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::UnresolvedVertexProgram { label } => {
                write!(f, "pipeline '{label}': vertex program could not be resolved")
            }
            PipelineError::UnresolvedFragmentProgram { label } => {
                write!(
                    f,
                    "pipeline '{label}': fragment program could not be resolved"
                )
            }
            PipelineError::Creation { label, details } => {
                write!(f, "pipeline creation failed for '{label}': {details}")
            }
            PipelineError::NotFound { id } => write!(f, "pipeline not found: {id:?}"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error creating or operating on a GPU buffer.
#[derive(Debug)]
pub enum BufferError {
    /// Buffers of size zero cannot be created or allocated.
    ZeroSize,
    /// An upload was requested but the CPU shadow holds no data.
    EmptyShadow {
        /// The affected buffer.
        id: BufferId,
    },
    /// The requested buffer does not exist.
    NotFound {
        /// The missing buffer.
        id: BufferId,
    },
    /// The backend failed to create or reallocate the native buffer.
    Creation {
        /// Backend diagnostics, when available.
        details: String,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::ZeroSize => write!(f, "cannot create a GPU buffer with size zero"),
            BufferError::EmptyShadow { id } => {
                write!(f, "buffer {id:?}: cannot upload with empty shadow data")
            }
            BufferError::NotFound { id } => write!(f, "GPU buffer not found: {id:?}"),
            BufferError::Creation { details } => write!(f, "buffer creation failed: {details}"),
        }
    }
}

impl std::error::Error for BufferError {}

/// An error creating or addressing a mesh.
#[derive(Debug)]
pub enum MeshError {
    /// Mesh creation requires non-empty vertex data.
    EmptyVertexData,
    /// The vertex layout has no attributes, so no stride can be derived.
    EmptyLayout,
    /// The requested mesh does not exist.
    NotFound {
        /// The missing mesh.
        id: MeshId,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::EmptyVertexData => write!(f, "cannot create a mesh without vertex data"),
            MeshError::EmptyLayout => {
                write!(f, "cannot create a mesh with an empty vertex layout")
            }
            MeshError::NotFound { id } => write!(f, "mesh not found: {id:?}"),
        }
    }
}

impl std::error::Error for MeshError {}

/// An error creating or addressing a texture.
#[derive(Debug)]
pub enum TextureError {
    /// Texture dimensions must be non-zero.
    ZeroExtent,
    /// The channel/format combination has no native equivalent.
    UnsupportedFormat {
        /// Requested channel count.
        channels: TextureChannels,
        /// Requested sample format.
        format: TextureSampleFormat,
    },
    /// The backend failed to create the texture.
    Creation {
        /// Backend diagnostics, when available.
        details: String,
    },
    /// The requested texture does not exist.
    NotFound {
        /// The missing texture.
        id: TextureId,
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::ZeroExtent => write!(f, "cannot create a texture with zero extent"),
            TextureError::UnsupportedFormat { channels, format } => {
                write!(f, "unsupported texture format: {channels:?}/{format:?}")
            }
            TextureError::Creation { details } => write!(f, "texture creation failed: {details}"),
            TextureError::NotFound { id } => write!(f, "texture not found: {id:?}"),
        }
    }
}

impl std::error::Error for TextureError {}

/// An error creating or addressing a render target.
#[derive(Debug)]
pub enum RenderTargetError {
    /// Render target dimensions must be non-zero.
    ZeroExtent,
    /// The backend failed to create the target.
    Creation {
        /// Backend diagnostics, when available.
        details: String,
    },
    /// The requested render target does not exist.
    NotFound {
        /// The missing target.
        id: RenderTargetId,
    },
}

impl fmt::Display for RenderTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTargetError::ZeroExtent => {
                write!(f, "cannot create a render target with zero extent")
            }
            RenderTargetError::Creation { details } => {
                write!(f, "render target creation failed: {details}")
            }
            RenderTargetError::NotFound { id } => write!(f, "render target not found: {id:?}"),
        }
    }
}

impl std::error::Error for RenderTargetError {}

/// A command-buffer misuse error.
#[derive(Debug)]
pub enum CommandError {
    /// The index does not name a buffer in the pool.
    UnknownBuffer {
        /// The unknown index.
        id: CommandBufferId,
    },
    /// The buffer is not in the state the operation requires.
    InvalidState {
        /// The affected buffer.
        id: CommandBufferId,
        /// State the buffer was found in.
        state: CommandBufferState,
        /// State the operation requires.
        expected: CommandBufferState,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownBuffer { id } => write!(f, "unknown command buffer {id:?}"),
            CommandError::InvalidState {
                id,
                state,
                expected,
            } => write!(
                f,
                "command buffer {id:?} is {state:?}, operation requires {expected:?}"
            ),
        }
    }
}

impl std::error::Error for CommandError {}

/// The umbrella error type for device operations.
#[derive(Debug)]
pub enum GpuError {
    /// Shader program error.
    Shader(ShaderError),
    /// Pipeline error.
    Pipeline(PipelineError),
    /// GPU buffer error.
    Buffer(BufferError),
    /// Mesh error.
    Mesh(MeshError),
    /// Texture error.
    Texture(TextureError),
    /// Render target error.
    RenderTarget(RenderTargetError),
    /// Command buffer misuse.
    Command(CommandError),
    /// The operation ran on a thread other than the device's owning thread.
    NotOwningThread,
    /// An otherwise uncategorized backend failure.
    Backend(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::Shader(e) => e.fmt(f),
            GpuError::Pipeline(e) => e.fmt(f),
            GpuError::Buffer(e) => e.fmt(f),
            GpuError::Mesh(e) => e.fmt(f),
            GpuError::Texture(e) => e.fmt(f),
            GpuError::RenderTarget(e) => e.fmt(f),
            GpuError::Command(e) => e.fmt(f),
            GpuError::NotOwningThread => {
                write!(f, "operation must run on the device's owning thread")
            }
            GpuError::Backend(details) => write!(f, "backend error: {details}"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Shader(e) => Some(e),
            GpuError::Pipeline(e) => Some(e),
            GpuError::Buffer(e) => Some(e),
            GpuError::Mesh(e) => Some(e),
            GpuError::Texture(e) => Some(e),
            GpuError::RenderTarget(e) => Some(e),
            GpuError::Command(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShaderError> for GpuError {
    fn from(e: ShaderError) -> Self {
        GpuError::Shader(e)
    }
}

impl From<PipelineError> for GpuError {
    fn from(e: PipelineError) -> Self {
        GpuError::Pipeline(e)
    }
}

impl From<BufferError> for GpuError {
    fn from(e: BufferError) -> Self {
        GpuError::Buffer(e)
    }
}

impl From<MeshError> for GpuError {
    fn from(e: MeshError) -> Self {
        GpuError::Mesh(e)
    }
}

impl From<TextureError> for GpuError {
    fn from(e: TextureError) -> Self {
        GpuError::Texture(e)
    }
}

impl From<RenderTargetError> for GpuError {
    fn from(e: RenderTargetError) -> Self {
        GpuError::RenderTarget(e)
    }
}

impl From<CommandError> for GpuError {
    fn from(e: CommandError) -> Self {
        GpuError::Command(e)
    }
}
