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

//! The command buffer pool: allocation, recycling, and lifecycle tracking.

use std::collections::VecDeque;
use std::mem;
use std::sync::Mutex;

use super::{Command, CommandBufferId, CommandBufferState, CompletionCallback};
use crate::gpu::error::CommandError;

struct PooledBuffer {
    state: CommandBufferState,
    commands: Vec<Command>,
    callback: Option<CompletionCallback>,
}

impl PooledBuffer {
    fn new() -> Self {
        Self {
            state: CommandBufferState::Available,
            commands: Vec::new(),
            callback: None,
        }
    }
}

struct PoolState {
    buffers: Vec<PooledBuffer>,
    available: VecDeque<u32>,
    recording: Vec<u32>,
    submitted: Vec<u32>,
}

/// Allocates, recycles, and tracks the lifecycle of command buffers.
///
/// All methods take `&self`; a single internal mutex guards the
/// available/recording/submitted bookkeeping and is held only for the
/// duration of the state mutation, never for native work. Growth of the
/// backing storage happens under the same mutex and is therefore mutually
/// exclusive with every other pool operation.
pub struct CommandBufferPool {
    inner: Mutex<PoolState>,
}

impl CommandBufferPool {
    /// Creates an empty pool. Buffers are allocated on first acquire.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolState {
                buffers: Vec::new(),
                available: VecDeque::new(),
                recording: Vec::new(),
                submitted: Vec::new(),
            }),
        }
    }

    /// Acquires a buffer for exclusive recording, growing the pool if the
    /// free list is exhausted.
    pub fn acquire(&self) -> CommandBufferId {
        let mut pool = self.inner.lock().unwrap();

        let index = match pool.available.pop_front() {
            Some(index) => index,
            None => {
                let index = pool.buffers.len() as u32;
                pool.buffers.push(PooledBuffer::new());
                index
            }
        };

        pool.buffers[index as usize].state = CommandBufferState::Recording;
        pool.recording.push(index);
        CommandBufferId(index)
    }

    /// Appends one command. Rejected unless the buffer is recording.
    pub fn record(&self, id: CommandBufferId, command: Command) -> Result<(), CommandError> {
        let mut pool = self.inner.lock().unwrap();
        let buffer = Self::buffer_mut(&mut pool, id)?;
        Self::expect_state(id, buffer.state, CommandBufferState::Recording)?;
        buffer.commands.push(command);
        Ok(())
    }

    /// Attaches the completion callback, replacing any previous one.
    /// Rejected unless the buffer is recording.
    pub fn set_callback(
        &self,
        id: CommandBufferId,
        callback: CompletionCallback,
    ) -> Result<(), CommandError> {
        let mut pool = self.inner.lock().unwrap();
        let buffer = Self::buffer_mut(&mut pool, id)?;
        Self::expect_state(id, buffer.state, CommandBufferState::Recording)?;
        buffer.callback = Some(callback);
        Ok(())
    }

    /// Moves a buffer from recording to the submitted queue. After this the
    /// caller must not touch the buffer again.
    pub fn submit(&self, id: CommandBufferId) -> Result<(), CommandError> {
        let mut pool = self.inner.lock().unwrap();
        {
            let buffer = Self::buffer_mut(&mut pool, id)?;
            Self::expect_state(id, buffer.state, CommandBufferState::Recording)?;
            buffer.state = CommandBufferState::Submitted;
        }
        pool.recording.retain(|&index| index != id.0);
        pool.submitted.push(id.0);
        Ok(())
    }

    /// Detaches a submitted buffer's commands and callback for replay,
    /// marking it executed. Must be balanced with
    /// [`finish_execute`](Self::finish_execute).
    pub fn begin_execute(
        &self,
        id: CommandBufferId,
    ) -> Result<(Vec<Command>, Option<CompletionCallback>), CommandError> {
        let mut pool = self.inner.lock().unwrap();
        let detached = {
            let buffer = Self::buffer_mut(&mut pool, id)?;
            Self::expect_state(id, buffer.state, CommandBufferState::Submitted)?;
            buffer.state = CommandBufferState::Executed;
            (mem::take(&mut buffer.commands), buffer.callback.take())
        };
        pool.submitted.retain(|&index| index != id.0);
        Ok(detached)
    }

    /// Returns an executed buffer to the free list, cleared.
    pub fn finish_execute(&self, id: CommandBufferId) {
        let mut pool = self.inner.lock().unwrap();
        let Some(buffer) = pool.buffers.get_mut(id.0 as usize) else {
            return;
        };
        if buffer.state != CommandBufferState::Executed {
            return;
        }
        buffer.state = CommandBufferState::Available;
        buffer.commands.clear();
        buffer.callback = None;
        pool.available.push_back(id.0);
    }

    /// Snapshot of the submitted queue, in submission order.
    pub fn submitted_ids(&self) -> Vec<CommandBufferId> {
        let pool = self.inner.lock().unwrap();
        pool.submitted.iter().map(|&i| CommandBufferId(i)).collect()
    }

    /// Number of buffers currently awaiting execution.
    pub fn submitted_len(&self) -> usize {
        self.inner.lock().unwrap().submitted.len()
    }

    /// Number of buffers currently on the free list.
    pub fn available_len(&self) -> usize {
        self.inner.lock().unwrap().available.len()
    }

    /// Number of commands currently recorded into a buffer.
    pub fn command_len(&self, id: CommandBufferId) -> usize {
        let pool = self.inner.lock().unwrap();
        pool.buffers
            .get(id.0 as usize)
            .map(|b| b.commands.len())
            .unwrap_or(0)
    }

    fn buffer_mut(
        pool: &mut PoolState,
        id: CommandBufferId,
    ) -> Result<&mut PooledBuffer, CommandError> {
        pool.buffers
            .get_mut(id.0 as usize)
            .ok_or(CommandError::UnknownBuffer { id })
    }

    fn expect_state(
        id: CommandBufferId,
        state: CommandBufferState,
        expected: CommandBufferState,
    ) -> Result<(), CommandError> {
        if state == expected {
            Ok(())
        } else {
            log::error!("command buffer {id:?} is {state:?}, expected {expected:?}");
            Err(CommandError::InvalidState {
                id,
                state,
                expected,
            })
        }
    }
}

impl Default for CommandBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::api::{BufferDescriptor, BufferKind, BufferUsage};
    use crate::gpu::command::GpuCommand;

    fn create_buffer_command() -> Command {
        Command::new(GpuCommand::CreateBuffer(BufferDescriptor {
            label: "test".to_string(),
            kind: BufferKind::Vertex,
            usage: BufferUsage::Static,
            size: 16,
        }))
    }

    #[test]
    fn acquire_grows_when_exhausted() {
        let pool = CommandBufferPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a, b);
        assert_eq!(pool.available_len(), 0);
    }

    #[test]
    fn record_after_submit_is_rejected() {
        let pool = CommandBufferPool::new();
        let id = pool.acquire();
        pool.record(id, create_buffer_command()).unwrap();
        pool.submit(id).unwrap();

        let result = pool.record(id, create_buffer_command());
        assert!(matches!(result, Err(CommandError::InvalidState { .. })));
        assert_eq!(pool.command_len(id), 1, "rejected command must not land");
    }

    #[test]
    fn unknown_buffer_is_rejected() {
        let pool = CommandBufferPool::new();
        let result = pool.record(CommandBufferId(42), create_buffer_command());
        assert!(matches!(result, Err(CommandError::UnknownBuffer { .. })));
    }

    #[test]
    fn executed_buffer_returns_to_the_free_list() {
        let pool = CommandBufferPool::new();
        let id = pool.acquire();
        pool.record(id, create_buffer_command()).unwrap();
        pool.submit(id).unwrap();
        assert_eq!(pool.submitted_len(), 1);

        let (commands, callback) = pool.begin_execute(id).unwrap();
        assert_eq!(commands.len(), 1);
        assert!(callback.is_none());
        pool.finish_execute(id);

        assert_eq!(pool.submitted_len(), 0);
        assert_eq!(pool.available_len(), 1);

        // The same index is handed out again.
        let again = pool.acquire();
        assert_eq!(again, id);
        assert_eq!(pool.command_len(again), 0);
    }

    #[test]
    fn double_execute_is_rejected() {
        let pool = CommandBufferPool::new();
        let id = pool.acquire();
        pool.submit(id).unwrap();
        pool.begin_execute(id).unwrap();

        let result = pool.begin_execute(id);
        assert!(matches!(result, Err(CommandError::InvalidState { .. })));
    }

    #[test]
    fn concurrent_acquire_hands_out_distinct_buffers() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let pool = Arc::new(CommandBufferPool::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                (0..32).map(|_| pool.acquire().0).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(seen.insert(index), "buffer {index} acquired twice");
            }
        }
        assert_eq!(seen.len(), 8 * 32);
    }
}
