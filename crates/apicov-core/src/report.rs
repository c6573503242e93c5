//! Invocation of the external report-generation script.
//!
//! The reconciliation logic has no dependency on this; it exists so callers
//! can regenerate the human-readable coverage artifact on demand. The call
//! is blocking and carries no timeout - callers impose their own
//! cancellation policy. A non-zero exit is reported, not raised.

use std::process::Command;

use serde::Serialize;
use tracing::info;

use crate::config::CoverageConfig;
use crate::error::{CoverageError, Result};

/// Shells tried in order when running the script.
const SHELLS: [&str; 2] = ["pwsh", "powershell"];

/// Keep only this many bytes from the tail of captured output.
const OUTPUT_TAIL_BYTES: usize = 4000;

/// Result of one script invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    /// Whether the script exited successfully.
    pub ok: bool,
    /// The script's exit code, if it exited normally.
    pub exit_code: Option<i32>,
    /// Tail of captured stdout.
    pub stdout: String,
    /// Tail of captured stderr.
    pub stderr: String,
    /// Where the regenerated report lives.
    pub coverage_report_path: std::path::PathBuf,
}

/// Run the coverage generator script configured in `config`.
///
/// Tries `pwsh` (PowerShell 7+) first, then falls back to `powershell`
/// (Windows PowerShell 5). The script runs with the config root as its
/// working directory.
///
/// # Errors
///
/// Returns [`CoverageError::ScriptNotFound`] when the script file is
/// absent and [`CoverageError::ShellNotFound`] when neither shell exists
/// on the system.
pub fn run_coverage_script(config: &CoverageConfig) -> Result<ReportOutcome> {
    if !config.coverage_script.exists() {
        return Err(CoverageError::ScriptNotFound(
            config.coverage_script.clone(),
        ));
    }

    let mut tried = Vec::new();
    for shell in SHELLS {
        let mut command = Command::new(shell);
        command
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-File")
            .arg(&config.coverage_script);
        if !config.root.as_os_str().is_empty() {
            command.current_dir(&config.root);
        }

        match command.output() {
            Ok(output) => {
                info!(
                    shell,
                    code = ?output.status.code(),
                    "coverage script finished"
                );
                return Ok(ReportOutcome {
                    ok: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: tail(&output.stdout),
                    stderr: tail(&output.stderr),
                    coverage_report_path: config.coverage_report.clone(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tried.push(shell);
            }
            Err(e) => return Err(CoverageError::Io(e)),
        }
    }

    Err(CoverageError::ShellNotFound {
        tried: tried.join(", "),
    })
}

/// Last [`OUTPUT_TAIL_BYTES`] of captured output, on a char boundary.
fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= OUTPUT_TAIL_BYTES {
        return text.into_owned();
    }
    let mut start = text.len() - OUTPUT_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_owned()
}
