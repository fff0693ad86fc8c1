//! Releasing cached device memory.
//!
//! Caching allocators keep freed device blocks around for reuse. Between
//! training runs that cache is dead weight, so the orchestrator asks the
//! runtime to hand it back before launching the next run.

use super::detect::is_cuda_available;
use crate::error::Result;
use tracing::{debug, info};

/// A device runtime whose allocator caches freed memory.
///
/// The trainer that owns the allocator implements this; the CLI has no
/// device allocations of its own, so clearing is a library-only operation.
///
/// ```
/// use trainwatch::Result;
/// use trainwatch::gpu::{DeviceRuntime, clear_gpu_memory};
///
/// /// Freed device buffers kept for reuse.
/// struct BufferPool {
///     free_blocks: Vec<Vec<u8>>,
///     live_handles: Vec<Option<Vec<u8>>>,
/// }
///
/// impl DeviceRuntime for BufferPool {
///     fn is_available(&self) -> bool {
///         true
///     }
///
///     fn empty_cache(&mut self) -> Result<()> {
///         self.free_blocks.clear();
///         self.free_blocks.shrink_to_fit();
///         Ok(())
///     }
///
///     fn collect_garbage(&mut self) {
///         self.live_handles.retain(Option::is_some);
///     }
/// }
///
/// let mut pool = BufferPool {
///     free_blocks: vec![vec![0; 1024]],
///     live_handles: vec![None, Some(vec![1])],
/// };
/// assert!(clear_gpu_memory(&mut pool)?);
/// assert!(pool.free_blocks.is_empty());
/// assert_eq!(pool.live_handles.len(), 1);
/// # Ok::<(), trainwatch::Error>(())
/// ```
pub trait DeviceRuntime {
    /// Whether a GPU runtime is usable in this process.
    ///
    /// Defaults to CUDA runtime library detection.
    fn is_available(&self) -> bool {
        is_cuda_available()
    }

    /// Return cached but unused device allocations to the driver.
    fn empty_cache(&mut self) -> Result<()>;

    /// Drop unreachable host-side handles that still pin device memory.
    fn collect_garbage(&mut self);
}

/// Release cached device memory if a GPU runtime is available.
///
/// Returns `Ok(false)` without touching the runtime when no GPU is present.
pub fn clear_gpu_memory(runtime: &mut dyn DeviceRuntime) -> Result<bool> {
    if !runtime.is_available() {
        debug!("No GPU runtime available, nothing to clear");
        return Ok(false);
    }

    runtime.empty_cache()?;
    runtime.collect_garbage();
    info!("GPU memory cache cleared");
    Ok(true)
}
