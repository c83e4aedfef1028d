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

// Kestrel sandbox: a pulsing triangle drawn through the deferred
// command-buffer path (shader registry) and the immediate mesh path.

use std::sync::Arc;

use kestrel_core::asset::{load_vertex_dump, ShaderPipeline, ShaderSetDescriptor};
use kestrel_core::gpu::api::{
    MeshDescriptor, MeshId, PrimitiveTopology, UniformBlockDescriptor, VertexAttribute,
    VertexFormat, VertexLayout,
};
use kestrel_core::math::Color;
use kestrel_runtime::{Application, EngineConfig, EngineContext};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

fn vertex_layout() -> VertexLayout {
    VertexLayout::new(vec![
        VertexAttribute::new("position", VertexFormat::Float32x3),
        VertexAttribute::new("color", VertexFormat::Float32x3),
    ])
}

struct SandboxApp {
    shader: Arc<ShaderPipeline>,
    triangle: MeshId,
    tick: f32,
}

impl Application for SandboxApp {
    fn init(context: &mut EngineContext) -> Self {
        context
            .device
            .set_clear_color(Color::new(0.05, 0.05, 0.08, 1.0));

        let shader = context
            .shaders
            .load(
                &ShaderSetDescriptor {
                    name: "unlit".to_string(),
                    vertex_blocks: vec![UniformBlockDescriptor {
                        name: "ub_globals".to_string(),
                        size: 16,
                    }],
                    fragment_blocks: Vec::new(),
                    layout: vertex_layout(),
                    topology: PrimitiveTopology::TriangleList,
                },
                &context.files,
                &context.device,
            )
            .expect("failed to load the unlit shader set");

        // Prefer a vertex dump from the resource directories, fall back to
        // the embedded triangle.
        let descriptor = load_vertex_dump(&context.files, "triangle.kvd", &vertex_layout())
            .unwrap_or_else(|e| {
                log::debug!("no vertex dump ({e}), using the embedded triangle");
                MeshDescriptor {
                    label: "triangle".to_string(),
                    layout: vertex_layout(),
                    vertices: bytemuck::cast_slice(VERTICES).to_vec(),
                    indices: None,
                }
            });
        let triangle = context
            .device
            .create_mesh(&descriptor)
            .expect("failed to create the triangle mesh");

        Self {
            shader,
            triangle,
            tick: 0.0,
        }
    }

    fn update(&mut self, context: &mut EngineContext) {
        self.tick += 0.01;
        let pulse = 0.75 + 0.25 * self.tick.sin();
        let tint: [f32; 4] = [pulse, pulse, pulse, 1.0];

        if let Some(pipeline) = self.shader.pipeline() {
            if let Some(globals) = context.device.find_uniform_buffer(pipeline, "ub_globals") {
                if let Err(e) = context
                    .device
                    .stage_buffer(globals, bytemuck::bytes_of(&tint))
                {
                    log::error!("failed to stage globals: {e}");
                }
            }
        }
    }

    fn render(&mut self, context: &mut EngineContext) {
        self.shader.bind(&context.device);
        context.device.draw(self.triangle);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = EngineConfig::load_or_default("demos/sandbox/res/engine.json");
    config.title = "Kestrel Sandbox".to_string();
    if !config
        .resource_dirs
        .iter()
        .any(|d| d.contains("demos/sandbox"))
    {
        config.resource_dirs.push("demos/sandbox/res".to_string());
    }

    kestrel_runtime::run::<SandboxApp>(config)
}
