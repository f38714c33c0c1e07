//! Error types for the boot engine.

use bootsim_kernel::KernelError;
use thiserror::Error;

/// Errors surfaced by [`crate::BootEngine`] operations.
///
/// Invalid transitions (pausing while paused, stepping past either end)
/// are silent no-ops, not errors. Only out-of-range requests end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The kernel rejected the command.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
