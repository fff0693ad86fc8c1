//! Training run inspection: traceback extraction and log waiting.

mod log;
mod traceback;
mod waiter;

pub use log::read_log;
pub use traceback::{filter_traceback, filter_traceback_with};
pub use waiter::{
    RunLabel, TrainingWaiter, WaitOutcome, WaitSettings, block_until_training,
};
