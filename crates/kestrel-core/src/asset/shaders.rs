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

//! The shader registry: loads shader sets through the device's deferred
//! command-buffer path.
//!
//! A shader set is a vertex + fragment source pair (`<name>_vs.wgsl`,
//! `<name>_fs.wgsl`) compiled into two programs and one pipeline by a
//! single command buffer. The pipeline command references the program
//! commands' output slots, so the whole set can be recorded from a loader
//! thread and resolved on the owning thread in one replay. The entry's
//! ready flag flips in the buffer's completion callback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::asset::AssetError;
use crate::gpu::api::{
    PipelineDescriptor, PipelineId, PrimitiveTopology, ProgramDescriptor, ProgramId, ProgramRef,
    ShaderStage, UniformBlockDescriptor, VertexLayout,
};
use crate::gpu::command::{GpuCommand, OutputSlot};
use crate::gpu::device::GraphicsDevice;
use crate::vfs::FileStore;

/// Describes a shader set to be loaded.
#[derive(Debug, Clone)]
pub struct ShaderSetDescriptor {
    /// Base name; sources are `<name>_vs.wgsl` and `<name>_fs.wgsl`.
    pub name: String,
    /// Uniform blocks consumed by the vertex stage.
    pub vertex_blocks: Vec<UniformBlockDescriptor>,
    /// Uniform blocks consumed by the fragment stage.
    pub fragment_blocks: Vec<UniformBlockDescriptor>,
    /// Expected vertex buffer layout.
    pub layout: VertexLayout,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
}

/// A loaded (or loading) shader set.
///
/// Until [`is_ready`](Self::is_ready) reports `true` the id accessors may
/// return `None`. A ready entry with a `None` pipeline means compilation
/// failed; the log carries the diagnostics.
#[derive(Debug)]
pub struct ShaderPipeline {
    name: String,
    complete: AtomicBool,
    vertex: Arc<OutputSlot>,
    fragment: Arc<OutputSlot>,
    pipeline: Arc<OutputSlot>,
}

impl ShaderPipeline {
    /// The set's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` once the creating command buffer has executed.
    pub fn is_ready(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// The compiled vertex program, if creation succeeded.
    pub fn vertex_program(&self) -> Option<ProgramId> {
        self.vertex.program()
    }

    /// The compiled fragment program, if creation succeeded.
    pub fn fragment_program(&self) -> Option<ProgramId> {
        self.fragment.program()
    }

    /// The created pipeline, if creation succeeded.
    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline.pipeline()
    }

    /// Binds the set's pipeline, if it is ready.
    pub fn bind(&self, device: &GraphicsDevice) {
        match self.pipeline() {
            Some(id) => device.bind_pipeline(id),
            None => log::warn!("shader set '{}' is not ready to bind", self.name),
        }
    }
}

/// Issues program/pipeline creation requests to the device and tracks the
/// resulting shader sets by name.
#[derive(Default)]
pub struct ShaderRegistry {
    entries: HashMap<String, Arc<ShaderPipeline>>,
}

impl ShaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a previously loaded set.
    pub fn get(&self, name: &str) -> Option<Arc<ShaderPipeline>> {
        self.entries.get(name).cloned()
    }

    /// Loads a shader set through one command buffer.
    ///
    /// Recording happens on the calling thread; if that thread is the
    /// device's owning thread the buffer is also executed inline, so the
    /// returned entry is ready immediately. Otherwise it becomes ready
    /// after the owning thread's next drain.
    pub fn load(
        &mut self,
        descriptor: &ShaderSetDescriptor,
        files: &FileStore,
        device: &GraphicsDevice,
    ) -> Result<Arc<ShaderPipeline>, AssetError> {
        if let Some(entry) = self.entries.get(&descriptor.name) {
            return Ok(Arc::clone(entry));
        }

        log::debug!("loading shader set '{}'", descriptor.name);

        let vertex_source = files.load(format!("{}_vs.wgsl", descriptor.name))?;
        let fragment_source = files.load(format!("{}_fs.wgsl", descriptor.name))?;

        let entry = Arc::new(ShaderPipeline {
            name: descriptor.name.clone(),
            complete: AtomicBool::new(false),
            vertex: OutputSlot::new(),
            fragment: OutputSlot::new(),
            pipeline: OutputSlot::new(),
        });

        let buffer = device.acquire_command_buffer();
        device.record_with_output(
            buffer,
            GpuCommand::CreateProgram(ProgramDescriptor {
                label: format!("{}_vs", descriptor.name),
                stage: ShaderStage::Vertex,
                source: vertex_source,
                uniform_blocks: descriptor.vertex_blocks.clone(),
            }),
            Arc::clone(&entry.vertex),
        )?;
        device.record_with_output(
            buffer,
            GpuCommand::CreateProgram(ProgramDescriptor {
                label: format!("{}_fs", descriptor.name),
                stage: ShaderStage::Fragment,
                source: fragment_source,
                uniform_blocks: descriptor.fragment_blocks.clone(),
            }),
            Arc::clone(&entry.fragment),
        )?;
        device.record_with_output(
            buffer,
            GpuCommand::CreatePipeline(PipelineDescriptor {
                label: descriptor.name.clone(),
                vertex: ProgramRef::Deferred(Arc::clone(&entry.vertex)),
                fragment: ProgramRef::Deferred(Arc::clone(&entry.fragment)),
                layout: descriptor.layout.clone(),
                topology: descriptor.topology,
            }),
            Arc::clone(&entry.pipeline),
        )?;

        let ready = Arc::clone(&entry);
        device.set_command_buffer_callback(
            buffer,
            Box::new(move || {
                ready.complete.store(true, Ordering::Release);
            }),
        )?;

        device.submit_command_buffer(buffer)?;
        if device.is_owner_thread() {
            device.execute_command_buffer(buffer)?;
        }

        self.entries
            .insert(descriptor.name.clone(), Arc::clone(&entry));
        Ok(entry)
    }
}
