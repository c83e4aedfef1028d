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

//! Mesh descriptors and the engine-level mesh record.

use crate::gpu::api::buffer::BufferId;
use crate::gpu::api::pipeline::VertexLayout;
use crate::gpu::handle::{Release, ResourceHandle};

/// How a mesh's draw call is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshDrawMode {
    /// Non-indexed, sized by vertex count.
    Vertices,
    /// Indexed, sized by index count.
    Indices,
}

/// The data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

/// Owned index data supplied to mesh creation.
#[derive(Debug, Clone)]
pub enum IndexData {
    /// 16-bit indices.
    Uint16(Vec<u16>),
    /// 32-bit indices.
    Uint32(Vec<u32>),
}

impl IndexData {
    /// The wire format of these indices.
    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::Uint16(_) => IndexFormat::Uint16,
            IndexData::Uint32(_) => IndexFormat::Uint32,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexData::Uint16(v) => v.len(),
            IndexData::Uint32(v) => v.len(),
        }
    }

    /// Returns `true` if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes, little-endian as laid out in memory.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::Uint16(v) => bytemuck::cast_slice(v),
            IndexData::Uint32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Describes a mesh to be created by the device.
///
/// Creation is atomic: the vertex buffer and the optional index buffer
/// either both exist afterwards, or neither does.
#[derive(Debug, Clone)]
pub struct MeshDescriptor {
    /// Debug label.
    pub label: String,
    /// Layout of the interleaved vertex data.
    pub layout: VertexLayout,
    /// Interleaved vertex bytes. Must be non-empty.
    pub vertices: Vec<u8>,
    /// Optional index data; its presence selects indexed drawing.
    pub indices: Option<IndexData>,
}

/// An opaque handle to a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshId(pub u32);

impl ResourceHandle for MeshId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of a mesh.
#[derive(Debug)]
pub struct Mesh {
    /// Debug label.
    pub label: String,
    /// The vertex buffer.
    pub vertex_buffer: BufferId,
    /// The index buffer, if the mesh is indexed.
    pub index_buffer: Option<BufferId>,
    /// Draw sizing mode.
    pub draw_mode: MeshDrawMode,
    /// Index format, present iff the mesh is indexed.
    pub index_format: Option<IndexFormat>,
}

impl Release for Mesh {
    fn release(&mut self) {}
}
