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

//! # Kestrel Runtime
//!
//! Engine bootstrap: configuration, the winit application loop, and the
//! [`Application`] lifecycle. Each frame the loop drains the device's
//! submitted command buffers, runs the application, and presents.

mod config;

pub use config::{BackendChoice, EngineConfig};

use std::sync::Arc;

use anyhow::Result;
use kestrel_core::asset::ShaderRegistry;
use kestrel_core::vfs::FileStore;
use kestrel_core::GraphicsDevice;
use kestrel_infra::{WinitWindow, WinitWindowBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

/// Everything an application interacts with while running.
pub struct EngineContext {
    /// The graphics device. Shared so loader threads can record command
    /// buffers against it.
    pub device: Arc<GraphicsDevice>,
    /// The resource file store.
    pub files: FileStore,
    /// The shader registry.
    pub shaders: ShaderRegistry,
    /// The configuration the engine booted with.
    pub config: EngineConfig,
}

/// The application lifecycle driven by the engine loop.
pub trait Application: Sized + 'static {
    /// Called once, after the window and device exist.
    fn init(context: &mut EngineContext) -> Self;

    /// Called every frame before rendering.
    fn update(&mut self, context: &mut EngineContext);

    /// Called every frame to issue draw calls.
    fn render(&mut self, context: &mut EngineContext);
}

// Field order is drop order: the application and the device (which owns
// the surface) must go before the window the surface was created on.
struct EngineState<A: Application> {
    app: Option<A>,
    context: Option<EngineContext>,
    window: Option<WinitWindow>,
    config: EngineConfig,
}

impl<A: Application> ApplicationHandler for EngineState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("initializing engine systems");

        let window = WinitWindowBuilder::new()
            .with_title(self.config.title.clone())
            .with_dimensions(self.config.width, self.config.height)
            .build(event_loop)
            .expect("window creation failed");

        // Without a graphics device the application cannot proceed.
        let backend = kestrel_infra::create_backend(self.config.graphics_api(), &window)
            .expect("graphics backend initialization failed");
        let device = Arc::new(GraphicsDevice::new(backend));

        let mut files = FileStore::new();
        for directory in &self.config.resource_dirs {
            files.add_directory(directory);
        }

        let mut context = EngineContext {
            device,
            files,
            shaders: ShaderRegistry::new(),
            config: self.config.clone(),
        };
        self.app = Some(A::init(&mut context));

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(window), Some(context)) = (self.window.as_ref(), self.context.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, shutting down");
                window.mark_closed();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                context.device.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                // Drain cross-thread resource work before this frame's
                // draw calls.
                if let Err(e) = context.device.flush_command_buffers() {
                    log::error!("command buffer drain failed: {e}");
                }
                if let Err(e) = context.device.begin_frame() {
                    log::error!("frame acquisition failed: {e}");
                    return;
                }

                if let Some(app) = self.app.as_mut() {
                    app.update(context);
                    app.render(context);
                }

                context.device.present();
                window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Boots the engine and runs `A` until the window closes.
pub fn run<A: Application>(config: EngineConfig) -> Result<()> {
    log::info!(
        "starting '{}' ({}x{}, {:?})",
        config.title,
        config.width,
        config.height,
        config.backend
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut state = EngineState::<A> {
        app: None,
        context: None,
        window: None,
        config,
    };
    event_loop.run_app(&mut state)?;

    if let Some(context) = &state.context {
        context.device.terminate();
    }
    log::info!("engine shut down");
    Ok(())
}
