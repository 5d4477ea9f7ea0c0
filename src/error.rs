// src/error.rs

use thiserror::Error;

/// Failure taxonomy for the editor core.
///
/// Every failure is recovered at the boundary where the operation was issued;
/// nothing in this crate panics on bad input or a sulky audio device.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The input file could not be probed or decoded. The previously loaded
    /// source (if any) stays active.
    #[error("decode failure: {0}")]
    Decode(String),

    /// The platform audio driver rejected a command (device gone, stream
    /// failed to build, ...). State is left unchanged.
    #[error("driver command failure: {0}")]
    DriverCommand(String),

    /// Offline render or file write failed. The destination path is never
    /// left partially written.
    #[error("export failure: {0}")]
    Export(String),

    /// Preset/config manifest could not be read or parsed.
    #[error("manifest failure: {0}")]
    Manifest(String),
}
