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

//! Shader program descriptors and the engine-level program record.

use crate::gpu::api::buffer::BufferId;
use crate::gpu::handle::{NativeId, Release, ResourceHandle};

/// The programmable stage a program is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,
    /// The fragment (pixel) stage.
    Fragment,
}

/// Declares one uniform block a program consumes.
///
/// The device walks these on program creation and auto-creates a matching
/// uniform GPU buffer per block, carrying the backend-assigned binding
/// index.
#[derive(Debug, Clone)]
pub struct UniformBlockDescriptor {
    /// Block name; the created uniform buffer is findable by it.
    pub name: String,
    /// Block size in bytes.
    pub size: usize,
}

/// Describes a shader program to be compiled by the device.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Debug label.
    pub label: String,
    /// Stage to compile for.
    pub stage: ShaderStage,
    /// Shader source text. Must be non-empty.
    pub source: Vec<u8>,
    /// Uniform blocks consumed by this stage.
    pub uniform_blocks: Vec<UniformBlockDescriptor>,
}

/// An opaque handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramId(pub u32);

impl ResourceHandle for ProgramId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of a compiled shader program.
#[derive(Debug)]
pub struct Program {
    /// Debug label.
    pub label: String,
    /// Stage the program was compiled for.
    pub stage: ShaderStage,
    /// The backend-native module object.
    pub native: NativeId,
    /// Uniform buffers auto-created from the declared blocks.
    pub uniform_buffers: Vec<BufferId>,
}

impl Release for Program {
    fn release(&mut self) {}
}
