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

//! Engine configuration, loaded from JSON with sensible defaults.

use std::path::Path;

use anyhow::{Context, Result};
use kestrel_core::gpu::api::GraphicsApi;
use serde::{Deserialize, Serialize};

/// Serializable graphics API choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Desktop OpenGL.
    Opengl,
    /// OpenGL ES / WebGL.
    Opengles,
    /// Microsoft Direct3D.
    Direct3d,
    /// Vulkan.
    Vulkan,
    /// Apple Metal.
    Metal,
    /// Whatever the platform supports best.
    #[default]
    Auto,
}

impl From<BackendChoice> for GraphicsApi {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Opengl => GraphicsApi::OpenGl,
            BackendChoice::Opengles => GraphicsApi::OpenGlEs,
            BackendChoice::Direct3d => GraphicsApi::Direct3D,
            BackendChoice::Vulkan => GraphicsApi::Vulkan,
            BackendChoice::Metal => GraphicsApi::Metal,
            BackendChoice::Auto => GraphicsApi::Auto,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title.
    pub title: String,
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Requested graphics API.
    pub backend: BackendChoice,
    /// Directories registered with the file store, in search order.
    pub resource_dirs: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Kestrel".to_string(),
            width: 1280,
            height: 720,
            backend: BackendChoice::Auto,
            resource_dirs: vec!["res".to_string()],
        }
    }
}

impl EngineConfig {
    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse config '{}'", path.display()))
    }

    /// Loads a configuration file, falling back to defaults when it is
    /// missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e:#}; using default configuration");
                Self::default()
            }
        }
    }

    /// The configured API as the engine enum.
    pub fn graphics_api(&self) -> GraphicsApi {
        self.backend.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.backend, BackendChoice::Auto);
        assert!(config.width > 0 && config.height > 0);
        assert_eq!(config.resource_dirs, vec!["res"]);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "title": "Demo", "backend": "vulkan" }"#).unwrap();
        assert_eq!(config.title, "Demo");
        assert_eq!(config.backend, BackendChoice::Vulkan);
        assert_eq!(config.width, EngineConfig::default().width);
    }

    #[test]
    fn backend_choice_maps_to_the_api_enum() {
        assert_eq!(
            GraphicsApi::from(BackendChoice::Opengl),
            GraphicsApi::OpenGl
        );
        assert_eq!(GraphicsApi::from(BackendChoice::Auto), GraphicsApi::Auto);
    }
}
