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

//! Conversions from the engine's backend-agnostic enums to wgpu types.

use kestrel_core::gpu::api::{
    IndexFormat, PrimitiveTopology, TextureChannels, TextureFiltering, TextureSampleFormat,
    VertexFormat,
};
use kestrel_core::math::Color;

/// Conversion into the matching wgpu type.
pub trait IntoWgpu<T> {
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Uint32 => wgpu::VertexFormat::Uint32,
            VertexFormat::Sint32 => wgpu::VertexFormat::Sint32,
        }
    }
}

impl IntoWgpu<wgpu::PrimitiveTopology> for PrimitiveTopology {
    fn into_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
            PrimitiveTopology::PointList => wgpu::PrimitiveTopology::PointList,
        }
    }
}

impl IntoWgpu<wgpu::IndexFormat> for IndexFormat {
    fn into_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

impl IntoWgpu<wgpu::FilterMode> for TextureFiltering {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFiltering::Nearest => wgpu::FilterMode::Nearest,
            TextureFiltering::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl IntoWgpu<wgpu::Color> for Color {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// The channel/format combination's native pixel format, plus whether the
/// source data has to be expanded to four channels first (wgpu exposes no
/// three-channel formats).
pub fn pixel_format(
    channels: TextureChannels,
    format: TextureSampleFormat,
) -> (wgpu::TextureFormat, bool) {
    use TextureSampleFormat as F;
    match (channels, format) {
        (TextureChannels::R, F::Byte) => (wgpu::TextureFormat::R8Unorm, false),
        (TextureChannels::R, F::Float) => (wgpu::TextureFormat::R32Float, false),
        (TextureChannels::R, F::Int) => (wgpu::TextureFormat::R32Sint, false),
        (TextureChannels::Rg, F::Byte) => (wgpu::TextureFormat::Rg8Unorm, false),
        (TextureChannels::Rg, F::Float) => (wgpu::TextureFormat::Rg32Float, false),
        (TextureChannels::Rg, F::Int) => (wgpu::TextureFormat::Rg32Sint, false),
        (TextureChannels::Rgb, F::Byte) => (wgpu::TextureFormat::Rgba8Unorm, true),
        (TextureChannels::Rgb, F::Float) => (wgpu::TextureFormat::Rgba32Float, true),
        (TextureChannels::Rgb, F::Int) => (wgpu::TextureFormat::Rgba32Sint, true),
        (TextureChannels::Rgba, F::Byte) => (wgpu::TextureFormat::Rgba8Unorm, false),
        (TextureChannels::Rgba, F::Float) => (wgpu::TextureFormat::Rgba32Float, false),
        (TextureChannels::Rgba, F::Int) => (wgpu::TextureFormat::Rgba32Sint, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_channel_formats_require_expansion() {
        let (format, expand) = pixel_format(TextureChannels::Rgb, TextureSampleFormat::Byte);
        assert_eq!(format, wgpu::TextureFormat::Rgba8Unorm);
        assert!(expand);

        let (_, expand) = pixel_format(TextureChannels::Rgba, TextureSampleFormat::Byte);
        assert!(!expand);
    }
}
