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

//! Asset-facing helpers built on the device's command-buffer surface.

mod mesh_dump;
mod shaders;

pub use mesh_dump::load_vertex_dump;
pub use shaders::{ShaderPipeline, ShaderRegistry, ShaderSetDescriptor};

use std::fmt;

use crate::gpu::error::{CommandError, GpuError};
use crate::vfs::VfsError;

/// An error loading an asset.
#[derive(Debug)]
pub enum AssetError {
    /// The source file could not be loaded.
    Vfs(VfsError),
    /// Recording into the command buffer was rejected.
    Command(CommandError),
    /// The device refused an operation.
    Gpu(GpuError),
    /// A raw vertex dump's byte count does not divide by the layout stride.
    MalformedVertexDump {
        /// The dump path.
        path: String,
        /// Byte count found.
        len: usize,
        /// Stride implied by the supplied layout.
        stride: u32,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Vfs(e) => e.fmt(f),
            AssetError::Command(e) => e.fmt(f),
            AssetError::Gpu(e) => e.fmt(f),
            AssetError::MalformedVertexDump { path, len, stride } => write!(
                f,
                "vertex dump '{path}': {len} bytes is not a multiple of stride {stride}"
            ),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Vfs(e) => Some(e),
            AssetError::Command(e) => Some(e),
            AssetError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VfsError> for AssetError {
    fn from(e: VfsError) -> Self {
        AssetError::Vfs(e)
    }
}

impl From<CommandError> for AssetError {
    fn from(e: CommandError) -> Self {
        AssetError::Command(e)
    }
}

impl From<GpuError> for AssetError {
    fn from(e: GpuError) -> Self {
        AssetError::Gpu(e)
    }
}
