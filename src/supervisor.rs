//! Foreground execution of the business logic behind a service.
//!
//! [`run`] blocks on a [`CancellationToken`]; OS signals only reach it
//! through [`shutdown_on_signal`], so tests cancel the token directly.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::thread;

use anyhow::{Context, Result as AnyResult};
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal as unix_signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ServiceError};
use crate::init::InitSystem;

/// Business logic started and stopped by a service backend
pub trait Program {
    /// Must return promptly; long-running work belongs on its own thread
    fn start(&mut self, service: &dyn InitSystem) -> AnyResult<()>;

    fn stop(&mut self, service: &dyn InitSystem) -> AnyResult<()>;
}

/// Start `program`, block until `shutdown` fires, then stop it.
///
/// Must not be called from inside a tokio runtime.
pub fn run(
    service: &dyn InitSystem,
    program: &mut dyn Program,
    shutdown: CancellationToken,
) -> Result<()> {
    program.start(service)?;
    tracing::info!("{} running", service.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| ServiceError::io("Failed to build wait runtime", e))?;
    runtime.block_on(shutdown.cancelled());

    tracing::info!("{} shutting down", service.display());
    program.stop(service)?;
    Ok(())
}

/// Token cancelled on the first SIGINT, SIGTERM or SIGQUIT.
///
/// The handlers are in place by the time this returns.
pub fn shutdown_on_signal() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ServiceError::io("Failed to build signal runtime", e))?;

    let signals = {
        let _guard = runtime.enter();
        ShutdownSignals::register()
            .map_err(|e| ServiceError::io("Failed to install signal handlers", e))?
    };

    let cancel = token.clone();
    thread::Builder::new()
        .name("initsvc-signals".into())
        .spawn(move || {
            runtime.block_on(signals.recv());
            cancel.cancel();
        })
        .map_err(|e| ServiceError::io("Failed to spawn signal thread", e))?;

    Ok(token)
}

struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
    sigquit: Signal,
}

impl ShutdownSignals {
    /// Must run inside a runtime context
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            sigint: unix_signal(SignalKind::interrupt())?,
            sigterm: unix_signal(SignalKind::terminate())?,
            sigquit: unix_signal(SignalKind::quit())?,
        })
    }

    async fn recv(mut self) {
        tokio::select! {
            _ = self.sigint.recv() => tracing::debug!("received SIGINT"),
            _ = self.sigterm.recv() => tracing::debug!("received SIGTERM"),
            _ = self.sigquit.recv() => tracing::debug!("received SIGQUIT"),
        }
    }
}

/// Runs the described executable as a child process.
///
/// Stopping sends SIGINT, mirroring the job's `kill signal INT` stanza,
/// and waits for the child to exit.
pub struct ChildProgram {
    executable: PathBuf,
    arguments: Vec<String>,
    working_directory: Option<PathBuf>,
    child: Option<Child>,
}

impl ChildProgram {
    pub fn new(executable: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            working_directory: None,
            child: None,
        }
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Build from the description a service was created with
    pub fn for_service(service: &dyn InitSystem) -> Result<Self> {
        let desc = service.description();
        let executable = crate::init::upstart::resolve_executable(desc)?;
        let mut program = Self::new(executable, desc.arguments.clone());
        if let Some(dir) = desc.working_dir() {
            program = program.working_directory(dir);
        }
        Ok(program)
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

impl Program for ChildProgram {
    fn start(&mut self, service: &dyn InitSystem) -> AnyResult<()> {
        if self.child.is_some() {
            anyhow::bail!("{} is already running", service.display());
        }

        let mut command = Command::new(&self.executable);
        command.args(&self.arguments);
        if let Some(dir) = &self.working_directory {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", self.executable.display()))?;
        tracing::debug!("spawned {} as pid {}", self.executable.display(), child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self, service: &dyn InitSystem) -> AnyResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            let pid = Pid::from_raw(child.id() as i32);
            kill(pid, NixSignal::SIGINT)
                .with_context(|| format!("Failed to signal {}", service.display()))?;
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", service.display()))?;
        tracing::debug!("{} exited with {}", service.display(), status);
        Ok(())
    }
}
