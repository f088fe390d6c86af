//! Thread-level building blocks: the SPSC handoff queue, the single-worker
//! chunk processor wrapped around it, and the fixed-size task pool.

pub mod chunk_processor;
pub mod spsc;
pub mod task_pool;

pub use chunk_processor::ThreadedChunkProcessor;
pub use spsc::{SpscReceiver, SpscSender};
pub use task_pool::TaskPool;

use std::any::Any;

/// Renders a panic payload into a printable failure message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
