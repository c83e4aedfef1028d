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

//! The wgpu implementation of the graphics backend contract.
//!
//! wgpu is itself the native-API normalization layer: the requested
//! [`GraphicsApi`](kestrel_core::gpu::api::GraphicsApi) selects which
//! native backend (OpenGL family, Direct3D, Vulkan, Metal) the instance is
//! created with, once, at construction.

pub mod backend;
pub mod context;
pub mod conversions;
