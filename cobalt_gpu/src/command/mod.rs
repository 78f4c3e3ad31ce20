//! Command buffer allocation and scoped recording

mod command_pool;
mod command_buffer;
mod command_operator;

pub use command_pool::CommandPool;
pub use command_buffer::{CommandBuffer, CommandBufferState};
pub use command_operator::CommandOperator;
