//! GPU helpers for training orchestration.
//!
//! Picks the device with the least used memory, pins child processes to it,
//! and releases cached device memory between runs.

mod detect;
mod memory;
mod select;
mod status;

pub use detect::{cuda_library_patterns, is_cuda_available, library_search_paths};
pub use memory::{DeviceRuntime, clear_gpu_memory};
pub use select::{DeviceAssignment, freest_gpu, get_freest_gpu, pin_freest_gpu, set_freest_gpu};
pub use status::{GpuRecord, GpuStatus, StatusCommand, parse_status, query_status};
