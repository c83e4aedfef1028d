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

//! Integration tests for the shader registry's command-buffer loading path.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use kestrel_core::asset::{ShaderRegistry, ShaderSetDescriptor};
use kestrel_core::gpu::{
    BufferKind, BufferUsage, DrawCall, GpuError, GraphicsApi, GraphicsBackend, NativeId,
    PipelineDescriptor, PipelineError, PrimitiveTopology, ProgramDescriptor, ResourceHandle,
    ShaderStage, TextureDescriptor, UniformBlockBinding, UniformBlockDescriptor, VertexAttribute,
    VertexFormat, VertexLayout,
};
use kestrel_core::math::Color;
use kestrel_core::vfs::FileStore;
use kestrel_core::GraphicsDevice;

/// A minimal backend: every operation succeeds against in-memory tables.
struct NullBackend {
    next: u32,
    vertex_modules: HashSet<u32>,
}

impl NullBackend {
    fn new() -> Self {
        Self {
            next: 0,
            vertex_modules: HashSet::new(),
        }
    }

    fn next_native(&mut self) -> NativeId {
        self.next += 1;
        NativeId(self.next)
    }
}

impl GraphicsBackend for NullBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Auto
    }
    fn on_resize(&mut self, _width: u32, _height: u32) {}
    fn set_viewport(&mut self, _width: u32, _height: u32) {}
    fn begin_frame(&mut self) -> Result<(), GpuError> {
        Ok(())
    }
    fn present(&mut self) {}
    fn set_clear_color(&mut self, _color: Color) {}
    fn clear(&mut self, _color: bool, _depth: bool) {}

    fn create_render_target(
        &mut self,
        _width: u32,
        _height: u32,
        _color_textures: &[NativeId],
        _with_depth: bool,
    ) -> Result<NativeId, GpuError> {
        Ok(self.next_native())
    }
    fn destroy_render_target(&mut self, _target: NativeId) {}
    fn bind_render_target(&mut self, _target: Option<NativeId>) {}

    fn compile_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(NativeId, Vec<UniformBlockBinding>), GpuError> {
        let native = self.next_native();
        if descriptor.stage == ShaderStage::Vertex {
            self.vertex_modules.insert(native.raw());
        }
        let bindings = descriptor
            .uniform_blocks
            .iter()
            .enumerate()
            .map(|(i, block)| UniformBlockBinding {
                name: block.name.clone(),
                size: block.size,
                binding: i as u32,
            })
            .collect();
        Ok((native, bindings))
    }
    fn destroy_program(&mut self, _stage: ShaderStage, program: NativeId) {
        self.vertex_modules.remove(&program.raw());
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
        vertex: NativeId,
        _fragment: NativeId,
    ) -> Result<NativeId, GpuError> {
        if !self.vertex_modules.contains(&vertex.raw()) {
            return Err(PipelineError::Creation {
                label: descriptor.label.clone(),
                details: "vertex module not found".to_string(),
            }
            .into());
        }
        Ok(self.next_native())
    }
    fn destroy_pipeline(&mut self, _pipeline: NativeId) {}
    fn bind_pipeline(&mut self, _pipeline: NativeId, _uniforms: &[(u32, NativeId)]) {}

    fn create_buffer(
        &mut self,
        _kind: BufferKind,
        _usage: BufferUsage,
        _size: usize,
    ) -> Result<NativeId, GpuError> {
        Ok(self.next_native())
    }
    fn reallocate_buffer(
        &mut self,
        _buffer: NativeId,
        _kind: BufferKind,
        _usage: BufferUsage,
        _size: usize,
    ) -> Result<(), GpuError> {
        Ok(())
    }
    fn upload_buffer(&mut self, _buffer: NativeId, _data: &[u8]) {}
    fn destroy_buffer(&mut self, _buffer: NativeId) {}

    fn create_texture(
        &mut self,
        _descriptor: &TextureDescriptor,
        _pixels: Option<&[u8]>,
    ) -> Result<NativeId, GpuError> {
        Ok(self.next_native())
    }
    fn destroy_texture(&mut self, _texture: NativeId) {}
    fn bind_texture(&mut self, _texture: NativeId, _slot: u32) {}
    fn draw(&mut self, _call: &DrawCall) {}
}

fn shader_dir(vs: &str, fs: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "kestrel-shaders-{}-{}",
        std::process::id(),
        vs.len() + fs.len()
    ));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("unlit_vs.wgsl"), vs).unwrap();
    fs::write(dir.join("unlit_fs.wgsl"), fs).unwrap();
    dir
}

fn unlit_descriptor() -> ShaderSetDescriptor {
    ShaderSetDescriptor {
        name: "unlit".to_string(),
        vertex_blocks: vec![UniformBlockDescriptor {
            name: "ub_globals".to_string(),
            size: 64,
        }],
        fragment_blocks: Vec::new(),
        layout: VertexLayout::new(vec![VertexAttribute::new(
            "position",
            VertexFormat::Float32x3,
        )]),
        topology: PrimitiveTopology::TriangleList,
    }
}

#[test]
fn loading_on_the_owning_thread_completes_inline() {
    let device = GraphicsDevice::new(Box::new(NullBackend::new()));

    let mut files = FileStore::new();
    files.add_directory(shader_dir("@vertex fn main() {}", "@fragment fn main() {}"));

    let mut registry = ShaderRegistry::new();
    let entry = registry
        .load(&unlit_descriptor(), &files, &device)
        .unwrap();

    assert!(entry.is_ready(), "owner-thread load must execute inline");
    assert!(entry.vertex_program().is_some());
    assert!(entry.fragment_program().is_some());
    let pipeline = entry.pipeline().expect("pipeline must be created");

    // The declared vertex block became a named uniform buffer.
    let globals = device
        .find_uniform_buffer(pipeline, "ub_globals")
        .expect("uniform block buffer must exist");
    assert_eq!(device.with_buffer(globals, |b| b.size), Some(64));
    assert_eq!(
        device.with_buffer(globals, |b| b.kind),
        Some(BufferKind::Uniform)
    );

    // Loading the same set again reuses the entry.
    let again = registry.load(&unlit_descriptor(), &files, &device).unwrap();
    assert!(std::sync::Arc::ptr_eq(&entry, &again));
}

#[test]
fn loading_from_a_worker_thread_becomes_ready_after_the_drain() {
    let device = GraphicsDevice::new(Box::new(NullBackend::new()));

    let mut files = FileStore::new();
    files.add_directory(shader_dir(
        "@vertex fn main() { /* worker */ }",
        "@fragment fn main() { /* worker */ }",
    ));

    let mut registry = ShaderRegistry::new();
    let entry = std::thread::scope(|scope| {
        let device = &device;
        let files = &files;
        let registry = &mut registry;
        scope
            .spawn(move || registry.load(&unlit_descriptor(), files, device).unwrap())
            .join()
            .unwrap()
    });

    assert!(!entry.is_ready(), "worker-thread load stays pending");
    assert!(entry.pipeline().is_none());

    device.flush_command_buffers().unwrap();

    assert!(entry.is_ready());
    assert!(entry.pipeline().is_some());
}

#[test]
fn missing_shader_sources_surface_as_load_errors() {
    let device = GraphicsDevice::new(Box::new(NullBackend::new()));
    let files = FileStore::new();

    let mut registry = ShaderRegistry::new();
    let result = registry.load(&unlit_descriptor(), &files, &device);
    assert!(result.is_err());
}
