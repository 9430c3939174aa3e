//! Upstart job file generation.
//!
//! The job stops with SIGINT when the `kill signal` stanza is available so
//! the program's stop handler gets to run before the process exits.

use std::fmt::Write as _;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};

use super::Capabilities;
use crate::error::{Result, ServiceError};
use crate::service::ServiceDescription;

/// How the final `exec` line launches the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStrategy {
    /// Run as the installing user
    Direct,
    /// `setuid` already dropped privileges
    SetUid,
    /// Wrap in `start-stop-daemon -c <user>`
    StartStopDaemon,
    /// Wrap in `su <user>`, keeping argument boundaries
    Su,
}

impl ExecStrategy {
    pub fn select(desc: &ServiceDescription, caps: &Capabilities) -> Self {
        match (desc.user(), caps.has_setuid, caps.has_start_stop_daemon) {
            (None, _, _) => ExecStrategy::Direct,
            (Some(_), true, _) => ExecStrategy::SetUid,
            (Some(_), false, true) => ExecStrategy::StartStopDaemon,
            (Some(_), false, false) => ExecStrategy::Su,
        }
    }
}

/// Absolute, existing and executable path of the program to run.
///
/// Falls back to the running binary when the description names none.
/// Symlinks are kept as given so the job follows the link if it is retargeted.
pub fn resolve_executable(desc: &ServiceDescription) -> Result<PathBuf> {
    let path = match &desc.executable {
        Some(path) if !path.as_os_str().is_empty() => path.clone(),
        _ => std::env::current_exe().map_err(|e| ServiceError::Render {
            message: format!("cannot determine current executable: {}", e),
        })?,
    };

    let resolved = std::path::absolute(&path).map_err(|e| ServiceError::Render {
        message: format!("executable {} cannot be resolved: {}", path.display(), e),
    })?;

    let metadata = fs::metadata(&resolved).map_err(|e| ServiceError::Render {
        message: format!("executable {} cannot be inspected: {}", resolved.display(), e),
    })?;

    if !metadata.is_file() {
        return Err(ServiceError::Render {
            message: format!("executable {} is not a regular file", resolved.display()),
        });
    }

    if metadata.permissions().mode() & 0o111 == 0 || access(&resolved, AccessFlags::X_OK).is_err()
    {
        return Err(ServiceError::Render {
            message: format!("{} is not executable", resolved.display()),
        });
    }

    Ok(resolved)
}

/// Render the job file for `desc`.
///
/// Pure text production: identical inputs give identical output.
pub fn render(desc: &ServiceDescription, caps: &Capabilities, executable: &Path) -> Result<String> {
    if !executable.is_absolute() {
        return Err(ServiceError::Render {
            message: format!("executable {} is not an absolute path", executable.display()),
        });
    }

    let path = executable.display().to_string();
    let mut script = String::new();

    if desc.description.is_empty() {
        script.push_str("#\n");
    } else {
        for line in desc.description.lines() {
            let _ = writeln!(script, "# {}", line);
        }
    }
    script.push('\n');

    if !desc.display_name.is_empty() {
        let _ = writeln!(script, "description    {}", quote(&desc.display_name));
    }

    if caps.has_kill_stanza {
        script.push_str("kill signal INT\n");
    }
    if let Some(dir) = desc.chroot_dir() {
        let _ = writeln!(script, "chroot {}", dir);
    }
    if let Some(dir) = desc.working_dir() {
        let _ = writeln!(script, "chdir {}", dir);
    }

    script.push_str("start on filesystem or runlevel [2345]\n");
    script.push_str("stop on runlevel [!2345]\n\n");

    let strategy = ExecStrategy::select(desc, caps);

    if let (ExecStrategy::SetUid, Some(user)) = (strategy, desc.user()) {
        let _ = writeln!(script, "setuid {}\n", user);
    }

    script.push_str("respawn\nrespawn limit 10 5\numask 022\n\n");
    script.push_str("console none\n\n");
    let _ = writeln!(
        script,
        "pre-start script\n    test -x {} || {{ stop; exit 0; }}\nend script\n",
        path
    );

    script.push_str("# Start\n");
    let args = quoted_args(&desc.arguments);
    let user = desc.user().unwrap_or_default();
    match strategy {
        ExecStrategy::Direct | ExecStrategy::SetUid => {
            let _ = writeln!(script, "exec {}{}", path, args);
        }
        ExecStrategy::StartStopDaemon => {
            let _ = writeln!(
                script,
                "exec start-stop-daemon --start -c {} --exec {}{}",
                user, path, args
            );
        }
        ExecStrategy::Su => {
            let _ = writeln!(
                script,
                "exec su -s /bin/sh -c 'exec \"$0\" \"$@\"' {} -- {}{}",
                user, path, args
            );
        }
    }

    Ok(script)
}

/// Wrap in double quotes, escaping embedded double quotes
pub fn quote(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\\\""))
}

fn quoted_args(args: &[String]) -> String {
    args.iter().map(|a| format!(" {}", quote(a))).collect()
}
