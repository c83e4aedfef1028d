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

//! The backend-agnostic graphics device layer.
//!
//! This module defines the "common language" for all GPU work:
//!
//! - [`handle`]: typed resource handles and the owning [`handle::ResourceMap`].
//! - [`api`]: descriptors and engine-level resource records, one file per
//!   resource kind.
//! - [`command`]: the deferred command buffer and its pool, the bridge from
//!   arbitrary caller threads to the device's owning thread.
//! - [`traits`]: the [`traits::GraphicsBackend`] contract a native backend
//!   fulfills.
//! - [`device`]: the concrete [`device::GraphicsDevice`] front-end that owns
//!   the resource maps, the pool, and the bound-state tracking.
//!
//! The "what" lives here; the "how" is a backend implementation in
//! `kestrel-infra` (wgpu), selected once at device construction.

pub mod api;
pub mod command;
pub mod device;
pub mod error;
pub mod handle;
pub mod traits;

pub use self::api::*;
pub use self::command::{
    Command, CommandBufferId, CommandBufferPool, CommandBufferState, GpuCommand, OutputSlot,
    ResourceId,
};
pub use self::device::GraphicsDevice;
pub use self::error::{
    BufferError, CommandError, GpuError, MeshError, PipelineError, RenderTargetError, ShaderError,
    TextureError,
};
pub use self::handle::{NativeId, Release, ResourceHandle, ResourceMap};
pub use self::traits::{DrawCall, GraphicsBackend, IndexedDraw, UniformBlockBinding};
