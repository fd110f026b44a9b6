use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by library-level operations.
///
/// Per-file failures during a scan are not errors — they are counted in
/// the summary and logged. These variants cover run-level failures.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root failed validation before any work began.
    #[error("invalid scan root '{0}': not an existing directory")]
    InvalidRoot(PathBuf),

    /// Catalog persistence failure.
    #[error("catalog store error: {0}")]
    Store(#[from] rom_warden_db::StoreError),

    /// I/O failure walking the tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the external container-tool seam.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' not found in PATH")]
    NotFound(String),

    #[error("tool failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("no tool handles container format of '{0}'")]
    Unsupported(PathBuf),
}
