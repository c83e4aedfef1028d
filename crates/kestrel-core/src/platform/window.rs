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

//! The window contract a graphics backend needs from the platform layer.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// Combines the raw handle traits graphics backends require, so a single
/// trait object can carry both.
pub trait WindowHandleSource: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> WindowHandleSource for T {}

/// A shareable, thread-safe handle to a live window, used by backends to
/// create a rendering surface.
pub type SharedWindowHandle = Arc<dyn WindowHandleSource + Send + Sync>;

/// Abstracts the behavior of a window.
///
/// Any windowing backend (winit, SDL, ...) can implement this to host a
/// Kestrel device.
pub trait EngineWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Physical dimensions (width, height) of the window's inner area.
    fn inner_size(&self) -> (u32, u32);

    /// The display's scale factor.
    fn scale_factor(&self) -> f64;

    /// Requests a redraw from the platform.
    fn request_redraw(&self);

    /// Returns `false` once the window has been asked to close.
    fn is_alive(&self) -> bool;

    /// Clones a shareable handle for surface creation.
    fn clone_handle(&self) -> SharedWindowHandle;
}
