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

//! Graphics backend implementations.

pub mod wgpu;

use anyhow::Result;
use kestrel_core::gpu::api::GraphicsApi;
use kestrel_core::platform::window::EngineWindow;
use kestrel_core::GraphicsBackend;

/// Creates the native backend for the requested API, bound to `window`'s
/// surface.
///
/// Backend selection happens exactly once, here; the returned object never
/// switches APIs at runtime. Failure is fatal for the caller: without a
/// graphics device the application cannot proceed.
pub fn create_backend(
    api: GraphicsApi,
    window: &dyn EngineWindow,
) -> Result<Box<dyn GraphicsBackend>> {
    let (width, height) = window.inner_size();
    let handle = window.clone_handle();
    let context = pollster::block_on(wgpu::context::WgpuContext::new(api, handle, width, height))?;
    Ok(Box::new(wgpu::backend::WgpuBackend::new(api, context)))
}
