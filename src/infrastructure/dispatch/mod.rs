//! Dispatch Core - 生成任务调度

mod dispatcher;
mod slot;

pub use dispatcher::{DispatcherConfig, TaskDispatcher};
pub use slot::{SlotPool, WorkerSlot};
