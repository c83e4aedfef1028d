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

//! Texture descriptors and the engine-level texture record.

use crate::gpu::handle::{NativeId, Release, ResourceHandle};

/// Channel count of a texture's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannels {
    /// One channel.
    R,
    /// Two channels.
    Rg,
    /// Three channels.
    Rgb,
    /// Four channels.
    Rgba,
}

impl TextureChannels {
    /// Number of channels.
    pub const fn count(self) -> u32 {
        match self {
            TextureChannels::R => 1,
            TextureChannels::Rg => 2,
            TextureChannels::Rgb => 3,
            TextureChannels::Rgba => 4,
        }
    }
}

/// Per-channel sample format.
///
/// Combined with [`TextureChannels`], this selects the native pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSampleFormat {
    /// 8-bit unsigned normalized.
    Byte,
    /// 32-bit float.
    Float,
    /// 32-bit signed integer.
    Int,
}

/// Sampling filter applied when a texture is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFiltering {
    /// Nearest-texel point sampling.
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// Describes a texture to be created by the device.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// Debug label.
    pub label: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel count.
    pub channels: TextureChannels,
    /// Per-channel format.
    pub format: TextureSampleFormat,
    /// Sampling filter; the sampler is created alongside the texture.
    pub filtering: TextureFiltering,
    /// Generate a mipmap chain after upload.
    pub generate_mipmaps: bool,
    /// Create as an uninitialized render-target attachment.
    pub render_attachment: bool,
}

impl TextureDescriptor {
    /// Bytes per pixel for this channel/format combination.
    pub const fn bytes_per_pixel(&self) -> u32 {
        let per_channel = match self.format {
            TextureSampleFormat::Byte => 1,
            TextureSampleFormat::Float | TextureSampleFormat::Int => 4,
        };
        self.channels.count() * per_channel
    }
}

/// An opaque handle to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

impl ResourceHandle for TextureId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn raw(self) -> u32 {
        self.0
    }
}

/// The engine-level record of a texture.
#[derive(Debug)]
pub struct Texture {
    /// Debug label.
    pub label: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel count.
    pub channels: TextureChannels,
    /// The backend-native texture object (view + sampler included).
    pub native: NativeId,
}

impl Release for Texture {
    fn release(&mut self) {}
}
