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

//! Pipeline state: vertex layout, topology, and the bindable combination of
//! shader stages.

use std::sync::Arc;

use crate::gpu::api::program::ProgramId;
use crate::gpu::command::OutputSlot;
use crate::gpu::handle::{NativeId, Release, ResourceHandle};

/// The data format of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit unsigned integer.
    Uint32,
    /// One 32-bit signed integer.
    Sint32,
}

impl VertexFormat {
    /// Size of one attribute of this format, in bytes.
    pub const fn byte_size(self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One attribute of an interleaved vertex.
#[derive(Debug, Clone)]
pub struct VertexAttribute {
    /// Attribute name, for diagnostics only.
    pub name: String,
    /// Data format.
    pub format: VertexFormat,
}

impl VertexAttribute {
    /// Shorthand constructor.
    pub fn new(name: impl Into<String>, format: VertexFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }
}

/// The interleaved layout of a vertex buffer.
///
/// Attribute offsets are derived from declaration order; the stride is the
/// sum of the attribute sizes.
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    /// Attributes in buffer order.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Creates a layout from a list of attributes.
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Per-vertex stride in bytes.
    pub fn stride(&self) -> u32 {
        self.attributes.iter().map(|a| a.format.byte_size()).sum()
    }

    /// Iterates `(offset, attribute)` pairs in buffer order.
    pub fn offsets(&self) -> impl Iterator<Item = (u32, &VertexAttribute)> {
        let mut offset = 0;
        self.attributes.iter().map(move |attribute| {
            let current = offset;
            offset += attribute.format.byte_size();
            (current, attribute)
        })
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Independent triangles.
    #[default]
    TriangleList,
    /// A connected triangle strip.
    TriangleStrip,
    /// Independent line segments.
    LineList,
    /// Independent points.
    PointList,
}

/// A reference to a shader program in a pipeline descriptor.
///
/// `Deferred` lets a create-pipeline command recorded into the same command
/// buffer as its create-program commands reference their results before they
/// exist: the slot is resolved at execution time, strictly after the earlier
/// commands have run.
#[derive(Debug, Clone)]
pub enum ProgramRef {
    /// An already-created program.
    Id(ProgramId),
    /// The output slot of an earlier create-program command.
    Deferred(Arc<OutputSlot>),
}

impl ProgramRef {
    /// Resolves the reference, returning `None` when a deferred slot is
    /// still empty (the producing command failed or never ran).
    pub fn resolve(&self) -> Option<ProgramId> {
        match self {
            ProgramRef::Id(id) => Some(*id),
            ProgramRef::Deferred(slot) => slot.program(),
        }
    }
}

impl From<ProgramId> for ProgramRef {
    fn from(id: ProgramId) -> Self {
        ProgramRef::Id(id)
    }
}

/// Describes a pipeline to be created by the device.
#[derive(Debug, Clone)]
pub struct PipelineDescriptor {
    /// Debug label.
    pub label: String,
    /// The vertex-stage program.
    pub vertex: ProgramRef,
    /// The fragment-stage program.
    pub fragment: ProgramRef,
    /// Expected vertex buffer layout.
    pub layout: VertexLayout,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
}

/// An opaque handle to a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineId(pub u32);

impl ResourceHandle for PipelineId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of a pipeline.
///
/// A pipeline must be destroyed before the programs it references; the
/// device does not enforce that ordering.
#[derive(Debug)]
pub struct Pipeline {
    /// Debug label.
    pub label: String,
    /// The backend-native pipeline object.
    pub native: NativeId,
    /// The vertex-stage program.
    pub vertex: ProgramId,
    /// The fragment-stage program.
    pub fragment: ProgramId,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
}

impl Release for Pipeline {
    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_the_sum_of_attribute_sizes() {
        let layout = VertexLayout::new(vec![
            VertexAttribute::new("position", VertexFormat::Float32x3),
            VertexAttribute::new("normal", VertexFormat::Float32x3),
            VertexAttribute::new("uv", VertexFormat::Float32x2),
        ]);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn offsets_follow_declaration_order() {
        let layout = VertexLayout::new(vec![
            VertexAttribute::new("position", VertexFormat::Float32x3),
            VertexAttribute::new("color", VertexFormat::Float32x4),
        ]);
        let offsets: Vec<u32> = layout.offsets().map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![0, 12]);
    }
}
