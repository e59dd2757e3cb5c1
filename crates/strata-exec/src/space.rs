//! Execution spaces and runtime hardware capabilities.
//!
//! Selection is two-stage: cargo features decide which spaces are
//! compiled at all, and dispatch picks among the compiled ones using the
//! run's [`Capabilities`] at graph-build time.

use std::fmt;

/// The hardware targets a task variant may be compiled for.
///
/// A closed enum: downstream dispatch matches exhaustively and never
/// re-branches per invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionSpace {
    /// Single-threaded execution on the controlling thread.
    Serial,
    /// Shared-memory parallel execution on the worker pool.
    Threads,
    /// Device-offloaded execution (requires the `gpu` feature).
    Device,
}

impl ExecutionSpace {
    /// Whether this space exists in the current build.
    ///
    /// `Serial` and `Threads` are always compiled; `Device` only with
    /// the `gpu` cargo feature.
    pub fn is_compiled(self) -> bool {
        match self {
            Self::Serial | Self::Threads => true,
            Self::Device => cfg!(feature = "gpu"),
        }
    }
}

impl fmt::Display for ExecutionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Threads => write!(f, "threads"),
            Self::Device => write!(f, "device"),
        }
    }
}

/// Hardware capability flags for a run, supplied by the configuration
/// collaborator.
///
/// Consumed once per task at graph-build time; never re-read mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the run should offload to a device where variants allow.
    pub use_device: bool,
    /// Worker-pool width for shared-memory execution.
    pub thread_width: usize,
}

impl Capabilities {
    /// A serial-only configuration: no device, one worker.
    pub fn serial_only() -> Self {
        Self {
            use_device: false,
            thread_width: 1,
        }
    }

    /// Detect host defaults: no device, pool width from available
    /// parallelism.
    pub fn detect() -> Self {
        let width = std::thread::available_parallelism().map_or(1, usize::from);
        Self {
            use_device: false,
            thread_width: width,
        }
    }

    /// Replace the worker-pool width.
    pub fn with_thread_width(mut self, width: usize) -> Self {
        self.thread_width = width.max(1);
        self
    }

    /// Enable or disable device offload.
    pub fn with_device(mut self, use_device: bool) -> Self {
        self.use_device = use_device;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}
