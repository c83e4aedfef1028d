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

//! Descriptors and engine-level resource records, one module per resource
//! kind.

pub mod buffer;
pub mod mesh;
pub mod pipeline;
pub mod program;
pub mod render_target;
pub mod texture;

pub use self::buffer::{BufferDescriptor, BufferId, BufferKind, BufferUsage, GpuBuffer};
pub use self::mesh::{IndexData, IndexFormat, Mesh, MeshDescriptor, MeshDrawMode, MeshId};
pub use self::pipeline::{
    Pipeline, PipelineDescriptor, PipelineId, PrimitiveTopology, ProgramRef, VertexAttribute,
    VertexFormat, VertexLayout,
};
pub use self::program::{Program, ProgramDescriptor, ProgramId, ShaderStage, UniformBlockDescriptor};
pub use self::render_target::{RenderTarget, RenderTargetDescriptor, RenderTargetId};
pub use self::texture::{
    Texture, TextureChannels, TextureDescriptor, TextureFiltering, TextureId, TextureSampleFormat,
};

/// A backend-agnostic identifier for a native graphics API.
///
/// Chosen once when the device is constructed; never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsApi {
    /// Desktop OpenGL.
    OpenGl,
    /// OpenGL ES / WebGL.
    OpenGlEs,
    /// Microsoft Direct3D.
    Direct3D,
    /// Vulkan.
    Vulkan,
    /// Apple Metal.
    Metal,
    /// Let the backend pick whatever the platform supports best.
    #[default]
    Auto,
}
