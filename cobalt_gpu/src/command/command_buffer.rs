/// Command buffer - native recorder plus the recording state machine
///
/// ```text
/// Initial --command_operator()--> Recording --end_recording()--> Executable
///    ^                                                              |  ^
///    +------------------------- reset() ----------------------------+  |
///                                                     lock()        |  | unlock()
///                                                                   v  |
///                                                                 Pending
/// ```

use std::sync::{Arc, Mutex};
use crate::device::{CommandBufferLevel, CommandBufferUsage, CommandRecorder};
use crate::error::Result;
use crate::utils::SlotAllocator;
use super::CommandOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferState {
    /// Allocated or reset, nothing recorded
    Initial,
    /// A CommandOperator is open (or was leaked)
    Recording,
    /// Recording ended, ready to submit
    Executable,
    /// Submitted; locked until its fence has been waited on
    Pending,
}

pub struct CommandBuffer {
    recorder: Box<dyn CommandRecorder>,
    level: CommandBufferLevel,
    pool_id: u64,
    pool_index: u32,
    pool_slots: Arc<Mutex<SlotAllocator>>,
    state: CommandBufferState,
    recorded: bool,
}

impl CommandBuffer {
    pub(crate) fn new(
        recorder: Box<dyn CommandRecorder>,
        level: CommandBufferLevel,
        pool_id: u64,
        pool_index: u32,
        pool_slots: Arc<Mutex<SlotAllocator>>,
    ) -> Self {
        Self {
            recorder,
            level,
            pool_id,
            pool_index,
            pool_slots,
            state: CommandBufferState::Initial,
            recorded: false,
        }
    }

    /// Open a recording session
    ///
    /// Beginning a new session discards what was previously recorded.
    ///
    /// # Panics
    ///
    /// If a session is already open (a live or leaked operator) or the buffer
    /// is locked by a submission whose fence has not been waited on.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut op = cmd.command_operator(CommandBufferUsage::ONE_TIME_SUBMIT)?;
    /// op.store_render_area(Rect2D::from_extent(extent));
    /// op.begin_rendering(&[RenderingAttachment::color(image, [0.0; 4])], None, None)?;
    /// op.draw(3, 1, 0, 0);
    /// op.end_rendering();
    /// op.end_recording()?;
    /// ```
    pub fn command_operator(&mut self, usage: CommandBufferUsage) -> Result<CommandOperator<'_>> {
        match self.state {
            CommandBufferState::Recording => crate::engine_fatal!(
                "cobalt::CommandBuffer",
                "command_operator() called while buffer {} is already recording",
                self.pool_index
            ),
            CommandBufferState::Pending => crate::engine_fatal!(
                "cobalt::CommandBuffer",
                "command_operator() called while buffer {} is locked by a pending submission",
                self.pool_index
            ),
            CommandBufferState::Initial | CommandBufferState::Executable => {}
        }

        self.recorder.begin(usage)?;
        self.state = CommandBufferState::Recording;
        self.recorded = false;
        Ok(CommandOperator::new(self))
    }

    /// Discard recorded commands and return to `Initial`
    ///
    /// # Panics
    ///
    /// While recording or locked.
    pub fn reset(&mut self) -> Result<()> {
        if matches!(self.state, CommandBufferState::Recording | CommandBufferState::Pending) {
            crate::engine_fatal!(
                "cobalt::CommandBuffer",
                "reset() called on buffer {} in state {:?}",
                self.pool_index,
                self.state
            );
        }
        self.recorder.reset()?;
        self.state = CommandBufferState::Initial;
        self.recorded = false;
        Ok(())
    }

    /// Mark the buffer as owned by a submission
    ///
    /// Called right after the buffer is handed to the queue. Has no effect
    /// unless the buffer is `Executable`.
    pub fn lock(&mut self) {
        if self.state == CommandBufferState::Executable {
            self.state = CommandBufferState::Pending;
            self.recorded = false;
        }
    }

    /// Release the submission lock once its fence has been waited on
    ///
    /// No-op unless the buffer is `Pending`.
    pub fn unlock(&mut self) {
        if self.state == CommandBufferState::Pending {
            self.state = CommandBufferState::Executable;
        }
    }

    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    /// Slot index inside the owning pool
    pub fn pool_index(&self) -> u32 {
        self.pool_index
    }

    pub(crate) fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// Whether a recording session completed since the last submission
    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Backend recorder, for queue submission
    pub fn recorder(&self) -> &dyn CommandRecorder {
        self.recorder.as_ref()
    }

    pub(crate) fn recorder_mut(&mut self) -> &mut dyn CommandRecorder {
        self.recorder.as_mut()
    }

    /// Close the open session (called by CommandOperator)
    pub(crate) fn finish_recording(&mut self) -> Result<()> {
        match self.recorder.end() {
            Ok(()) => {
                self.state = CommandBufferState::Executable;
                self.recorded = true;
                Ok(())
            }
            Err(e) => {
                self.state = CommandBufferState::Initial;
                crate::engine_error!(
                    "cobalt::CommandBuffer",
                    "Failed to end recording of buffer {}: {}",
                    self.pool_index,
                    e
                );
                Err(e)
            }
        }
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        match self.pool_slots.lock() {
            Ok(mut slots) => {
                if !slots.free(self.pool_index) {
                    crate::engine_warn!(
                        "cobalt::CommandBuffer",
                        "Slot {} of pool {} was already free",
                        self.pool_index,
                        self.pool_id
                    );
                }
            }
            Err(_) => crate::engine_error!(
                "cobalt::CommandBuffer",
                "Slot allocator of pool {} poisoned, slot {} leaked",
                self.pool_id,
                self.pool_index
            ),
        }
    }
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
