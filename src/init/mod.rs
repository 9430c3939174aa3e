pub mod upstart;

pub use upstart::Upstart;

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::logger::Logger;
use crate::paths::UpstartPaths;
use crate::service::ServiceDescription;
use crate::supervisor::Program;

/// Trait for init system backends (upstart, and whatever plugs in next).
///
/// A backend is bound to one service description for its whole life.
pub trait InitSystem: Send + Sync {
    /// Name of the init system
    fn name(&self) -> &str;

    /// Human-readable service name: display name, or the name when unset
    fn display(&self) -> &str;

    /// The description this backend was created for
    fn description(&self) -> &ServiceDescription;

    /// Write the service definition. Never overwrites an existing one.
    fn install(&self) -> Result<()>;

    /// Remove the service definition
    fn uninstall(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Stop, pause briefly, start. A failed stop aborts the restart.
    fn restart(&self) -> Result<()>;

    fn status(&self) -> Result<ServiceStatus>;

    /// Run `program` in the foreground until `shutdown` is cancelled
    fn run(&self, program: &mut dyn Program, shutdown: CancellationToken) -> Result<()>;

    /// Sink for the program's own messages
    fn logger(&self) -> Box<dyn Logger>;
}

/// Coarse state of an installed service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    NotInstalled,
    Stopped,
    Running,
}

/// Available init system backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitKind {
    Upstart,
}

impl InitKind {
    /// Probe the host once to find its init system
    pub fn detect() -> Option<Self> {
        Self::detect_with(&UpstartPaths::default())
    }

    pub fn detect_with(paths: &UpstartPaths) -> Option<Self> {
        if upstart::is_upstart(paths) {
            return Some(InitKind::Upstart);
        }
        tracing::debug!("no supported init system found");
        None
    }

    pub fn name(self) -> &'static str {
        match self {
            InitKind::Upstart => "upstart",
        }
    }

    pub fn create(self, description: ServiceDescription) -> Box<dyn InitSystem> {
        match self {
            InitKind::Upstart => Box::new(Upstart::new(description)),
        }
    }

    /// Like [`create`](Self::create), reading every host path from under `root`
    pub fn create_rooted(self, description: ServiceDescription, root: &Path) -> Box<dyn InitSystem> {
        match self {
            InitKind::Upstart => Box::new(Upstart::with_paths(
                description,
                UpstartPaths::rooted(root),
            )),
        }
    }
}
