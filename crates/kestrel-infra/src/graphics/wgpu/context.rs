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

//! Core wgpu state: instance, surface, device, queue, swap-chain
//! configuration, and the backbuffer depth texture.

use anyhow::{anyhow, Result};
use kestrel_core::gpu::api::GraphicsApi;
use kestrel_core::platform::window::SharedWindowHandle;
use wgpu::SurfaceTargetUnsafe;

/// The depth format used for the backbuffer and offscreen targets.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Maps the engine's API request to the wgpu instance backend bits.
fn backend_bits(api: GraphicsApi) -> wgpu::Backends {
    match api {
        GraphicsApi::OpenGl | GraphicsApi::OpenGlEs => wgpu::Backends::GL,
        GraphicsApi::Direct3D => wgpu::Backends::DX12,
        GraphicsApi::Vulkan => wgpu::Backends::VULKAN,
        GraphicsApi::Metal => wgpu::Backends::METAL,
        GraphicsApi::Auto => wgpu::Backends::all(),
    }
}

/// Holds the wgpu objects that make up the native device/context/swap-chain
/// for one window surface.
pub struct WgpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub depth_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    pub adapter_name: String,
}

impl WgpuContext {
    /// Initializes the context for a window surface.
    ///
    /// Every step here (instance, surface, adapter enumeration, device and
    /// queue creation, swap-chain configuration) is required; any failure
    /// aborts initialization.
    pub async fn new(
        api: GraphicsApi,
        window_handle: SharedWindowHandle,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        log::info!("initializing wgpu context for {api:?}");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backend_bits(api),
            ..Default::default()
        });

        let surface_target = unsafe {
            SurfaceTargetUnsafe::from_window(&window_handle)
                .map_err(|e| anyhow!("failed to create surface target: {e}"))?
        };
        let surface = unsafe { instance.create_surface_unsafe(surface_target)? };
        log::debug!("surface created for the window");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no suitable graphics adapter for {api:?}: {e}"))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "using adapter \"{}\" (backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Kestrel Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("failed to create logical device: {e}"))?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e:?}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "swap chain configured: {}x{} {surface_format:?}",
            surface_config.width,
            surface_config.height
        );

        let (depth_texture, depth_view) =
            Self::create_depth(&device, surface_config.width, surface_config.height);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            depth_view,
            depth_texture,
            adapter_name: adapter_info.name,
        })
    }

    /// Reconfigures the swap chain and rebuilds the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);

        let (texture, view) = Self::create_depth(
            &self.device,
            self.surface_config.width,
            self.surface_config.height,
        );
        self.depth_texture.destroy();
        self.depth_texture = texture;
        self.depth_view = view;
    }

    fn create_depth(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("backbuffer_depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}
