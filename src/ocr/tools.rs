//! External tool helpers shared by the extraction and OCR backends.

use std::io;
use std::process::{ExitStatus, Output};

/// Poppler and Tesseract binaries the pipeline shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["pdfinfo", "pdftotext", "pdftoppm", "tesseract"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every required tool, in a stable order.
pub fn check_tools() -> Vec<(&'static str, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (*tool, check_binary(tool)))
        .collect()
}

/// Outcome of running an external command, before it is mapped into a
/// backend-specific error type.
#[derive(Debug)]
pub enum ToolFailure {
    /// The binary is not installed.
    NotFound,
    /// The command ran and exited unsuccessfully.
    Failed(String),
    Io(io::Error),
}

/// Handle command output, extracting stdout on success.
pub fn handle_cmd_output(result: io::Result<Output>, error_prefix: &str) -> Result<String, ToolFailure> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ToolFailure::Failed(format!("{}: {}", error_prefix, stderr.trim())))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ToolFailure::NotFound),
        Err(e) => Err(ToolFailure::Io(e)),
    }
}

/// Check command status.
pub fn check_cmd_status(result: io::Result<ExitStatus>, error_msg: &str) -> Result<(), ToolFailure> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(ToolFailure::Failed(error_msg.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ToolFailure::NotFound),
        Err(e) => Err(ToolFailure::Io(e)),
    }
}
