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

//! GPU buffer descriptors and the engine-level buffer record.

use crate::gpu::handle::{NativeId, Release, ResourceHandle};

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
    /// Uniform/constant block data.
    Uniform,
}

/// How often a buffer's contents are expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once (or rarely), drawn many times.
    Static,
    /// Rewritten frequently, typically every frame.
    Dynamic,
}

/// Describes a GPU buffer to be created by the device.
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// Debug/lookup label. Uniform buffers are found by this name.
    pub label: String,
    /// What the buffer is bound as.
    pub kind: BufferKind,
    /// Expected update frequency.
    pub usage: BufferUsage,
    /// Size in bytes. Must be greater than zero.
    pub size: usize,
}

/// An opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u32);

impl ResourceHandle for BufferId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of a GPU buffer.
///
/// Carries a CPU-side shadow copy of the contents so the data can be
/// restaged after a reallocation without the caller resupplying it.
#[derive(Debug)]
pub struct GpuBuffer {
    /// Debug/lookup label.
    pub label: String,
    /// What the buffer is bound as.
    pub kind: BufferKind,
    /// Expected update frequency.
    pub usage: BufferUsage,
    /// Current size in bytes.
    pub size: usize,
    /// CPU-side shadow of the buffer contents.
    pub shadow: Vec<u8>,
    /// Element count (vertices or indices), set by mesh creation.
    pub count: u32,
    /// Per-element stride in bytes, set by mesh creation.
    pub stride: u32,
    /// The backend-native buffer object.
    pub native: NativeId,
    /// Uniform binding index assigned by the backend, if this is a
    /// uniform-block buffer.
    pub binding: Option<u32>,
}

impl GpuBuffer {
    /// Copies `data` into the shadow, truncating to the allocated size.
    ///
    /// Staging does not touch the native buffer; pair with an upload.
    pub fn stage(&mut self, data: &[u8]) {
        let n = data.len().min(self.size);
        if n < data.len() {
            log::warn!(
                "buffer '{}': staging {} bytes into {} allocated, truncating",
                self.label,
                data.len(),
                self.size
            );
        }
        self.shadow.resize(self.size, 0);
        self.shadow[..n].copy_from_slice(&data[..n]);
    }
}

impl Release for GpuBuffer {
    fn release(&mut self) {
        self.shadow = Vec::new();
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_buffer(size: usize) -> GpuBuffer {
        GpuBuffer {
            label: "test".to_string(),
            kind: BufferKind::Vertex,
            usage: BufferUsage::Static,
            size,
            shadow: vec![0; size],
            count: 0,
            stride: 0,
            native: NativeId(1),
            binding: None,
        }
    }

    #[test]
    fn stage_truncates_to_allocated_size() {
        let mut buffer = test_buffer(4);
        buffer.stage(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.shadow, vec![1, 2, 3, 4]);
    }

    #[test]
    fn release_drops_the_shadow() {
        let mut buffer = test_buffer(4);
        buffer.stage(&[1, 2, 3, 4]);
        buffer.release();
        assert!(buffer.shadow.is_empty());
        assert_eq!(buffer.size, 0);
    }
}
