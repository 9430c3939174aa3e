use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::error::{Result, ServiceError};

/// Captured output of a finished command
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    /// stdout and stderr joined for diagnostics
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Run `program` to completion and capture its output.
///
/// A missing program, a spawn error or a non-zero exit all map to
/// [`ServiceError::ControlCommandFailed`] so the caller sees what the
/// command printed.
pub fn run<P, I, S>(program: P, args: I) -> Result<Output>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let args: Vec<_> = args.into_iter().collect();
    let args_str: Vec<_> = args.iter().map(|s| s.as_ref().to_string_lossy()).collect();
    let command_line = format!("{} {}", program.display(), args_str.join(" "));

    tracing::debug!("> {}", command_line);

    let resolved = which::which(program).map_err(|e| ServiceError::ControlCommandFailed {
        command: command_line.clone(),
        code: None,
        output: e.to_string(),
    })?;

    let output = Command::new(&resolved).args(&args).output().map_err(|e| {
        ServiceError::ControlCommandFailed {
            command: command_line.clone(),
            code: None,
            output: e.to_string(),
        }
    })?;

    let captured = Output {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };

    if !output.status.success() {
        return Err(ServiceError::ControlCommandFailed {
            command: command_line,
            code: output.status.code(),
            output: captured.combined(),
        });
    }

    Ok(captured)
}
