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

//! Render target descriptors and the engine-level render target record.

use crate::gpu::api::texture::{TextureDescriptor, TextureId};
use crate::gpu::handle::{NativeId, Release, ResourceHandle};

/// Describes an offscreen render target.
///
/// The color attachment descriptors' dimensions are overridden with the
/// target's own width and height.
#[derive(Debug, Clone)]
pub struct RenderTargetDescriptor {
    /// Debug label.
    pub label: String,
    /// Width in pixels. Must be greater than zero.
    pub width: u32,
    /// Height in pixels. Must be greater than zero.
    pub height: u32,
    /// One descriptor per color attachment texture.
    pub color_attachments: Vec<TextureDescriptor>,
    /// Attach a depth buffer.
    pub with_depth: bool,
}

/// An opaque handle to a render target.
///
/// [`RenderTargetId::BACKBUFFER`] (raw value 0) denotes the swap chain's
/// backbuffer; it is never created or destroyed through the resource map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderTargetId(pub u32);

impl RenderTargetId {
    /// The native swap chain's backbuffer.
    pub const BACKBUFFER: Self = Self(0);

    /// Returns `true` if this is the backbuffer sentinel.
    pub const fn is_backbuffer(self) -> bool {
        self.0 == 0
    }
}

impl ResourceHandle for RenderTargetId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of an offscreen render target.
#[derive(Debug)]
pub struct RenderTarget {
    /// Debug label.
    pub label: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Color attachment textures, owned by the texture map.
    pub textures: Vec<TextureId>,
    /// Whether a depth buffer is attached.
    pub with_depth: bool,
    /// The backend-native render target object.
    pub native: NativeId,
}

impl Release for RenderTarget {
    fn release(&mut self) {}
}
