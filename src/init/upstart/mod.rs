//! Upstart backend.
//!
//! Which stanzas a job may use depends on the Upstart release, so every
//! install re-probes the host.

mod capabilities;
mod script;
mod version;

pub use capabilities::Capabilities;
pub use script::{quote, render, resolve_executable, ExecStrategy};
pub use version::{parse_version, probe, Version};

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{InitSystem, ServiceStatus};
use crate::cmd;
use crate::error::{Result, ServiceError};
use crate::logger::{Logger, TracingLogger};
use crate::paths::UpstartPaths;
use crate::service::ServiceDescription;
use crate::supervisor::{self, Program};

/// Pause between stop and start so Upstart can release the job
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(50);

/// True when the host runs Upstart
pub fn is_upstart(paths: &UpstartPaths) -> bool {
    if paths.udev_bridge.exists() {
        return true;
    }
    if !paths.init_binary.exists() {
        return false;
    }
    match cmd::run(&paths.init_binary, ["--version"]) {
        Ok(out) => out.stdout.contains("init (upstart"),
        Err(e) => {
            tracing::debug!("init version check failed: {}", e);
            false
        }
    }
}

pub struct Upstart {
    description: ServiceDescription,
    paths: UpstartPaths,
    restart_delay: Duration,
}

impl Upstart {
    pub fn new(description: ServiceDescription) -> Self {
        Self::with_paths(description, UpstartPaths::default())
    }

    pub fn with_paths(description: ServiceDescription, paths: UpstartPaths) -> Self {
        Self {
            description,
            paths,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn paths(&self) -> &UpstartPaths {
        &self.paths
    }

    /// Job file location. Per-user services and names that would escape
    /// the config directory are refused here.
    pub fn config_path(&self) -> Result<PathBuf> {
        if self.description.is_user_service() {
            return Err(ServiceError::UnsupportedConfiguration {
                reason: "user services are not supported on Upstart".into(),
            });
        }
        self.description.validate()?;
        Ok(self.paths.config_file(&self.description.name))
    }

    /// Probe the host and derive the stanzas it supports
    pub fn capabilities(&self) -> Capabilities {
        let version = probe(&self.paths.init_binary);
        let caps = Capabilities::detect(&version, &self.paths.start_stop_daemon);
        tracing::debug!(
            version = version.as_str().unwrap_or("unknown"),
            kill_stanza = caps.has_kill_stanza,
            setuid = caps.has_setuid,
            start_stop_daemon = caps.has_start_stop_daemon,
            "resolved upstart capabilities"
        );
        caps
    }

    fn control(&self, action: &str) -> Result<()> {
        self.description.validate()?;
        cmd::run(&self.paths.control_command, [action, self.description.name.as_str()])?;
        Ok(())
    }
}

/// Create `path` and fill it, leaving nothing behind on failure
fn write_new(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ServiceError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => ServiceError::io(format!("Failed to create {}", path.display()), e),
        })?;

    if let Err(e) = file.write_all(content.as_bytes()).and_then(|_| file.flush()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!("Failed to remove partial {}: {}", path.display(), cleanup);
        }
        return Err(ServiceError::io(
            format!("Failed to write {}", path.display()),
            e,
        ));
    }

    Ok(())
}

impl InitSystem for Upstart {
    fn name(&self) -> &str {
        "upstart"
    }

    fn display(&self) -> &str {
        if self.description.display_name.is_empty() {
            &self.description.name
        } else {
            &self.description.display_name
        }
    }

    fn description(&self) -> &ServiceDescription {
        &self.description
    }

    fn install(&self) -> Result<()> {
        let conf_path = self.config_path()?;

        if conf_path.exists() {
            return Err(ServiceError::AlreadyExists { path: conf_path });
        }

        let executable = resolve_executable(&self.description)?;
        let caps = self.capabilities();
        let content = render(&self.description, &caps, &executable)?;

        fs::create_dir_all(&self.paths.config_dir).map_err(|e| {
            ServiceError::io(
                format!("Failed to create {}", self.paths.config_dir.display()),
                e,
            )
        })?;
        write_new(&conf_path, &content)?;

        tracing::info!(
            "Installed {} as {}",
            self.description.name,
            conf_path.display()
        );
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        let conf_path = self.config_path()?;

        fs::remove_file(&conf_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServiceError::NotFound {
                path: conf_path.clone(),
            },
            _ => ServiceError::io(format!("Failed to remove {}", conf_path.display()), e),
        })?;

        tracing::info!("Uninstalled {}", self.description.name);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.control("start")?;
        tracing::info!("Started {}", self.description.name);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.control("stop")?;
        tracing::info!("Stopped {}", self.description.name);
        Ok(())
    }

    fn restart(&self) -> Result<()> {
        self.stop()?;
        thread::sleep(self.restart_delay);
        self.start()
    }

    fn status(&self) -> Result<ServiceStatus> {
        if !self.config_path()?.exists() {
            return Ok(ServiceStatus::NotInstalled);
        }

        let out = cmd::run(
            &self.paths.control_command,
            ["status", self.description.name.as_str()],
        )?;

        if out.stdout.contains("start/running") {
            Ok(ServiceStatus::Running)
        } else {
            Ok(ServiceStatus::Stopped)
        }
    }

    fn run(&self, program: &mut dyn Program, shutdown: CancellationToken) -> Result<()> {
        supervisor::run(self, program, shutdown)
    }

    fn logger(&self) -> Box<dyn Logger> {
        Box::new(TracingLogger::new(self.description.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::OPTION_USER_SERVICE;
    use std::os::unix::fs::PermissionsExt;

    fn executable_in(dir: &Path) -> PathBuf {
        let exe = dir.join("daemon");
        fs::write(&exe, "#!/bin/sh\nexec sleep 60\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    fn backend(root: &Path, desc: ServiceDescription) -> Upstart {
        Upstart::with_paths(desc, UpstartPaths::rooted(root))
    }

    #[test]
    fn display_prefers_display_name() {
        let up = Upstart::new(ServiceDescription::new("demo").display_name("Demo Service"));
        assert_eq!(up.display(), "Demo Service");
        let up = Upstart::new(ServiceDescription::new("demo"));
        assert_eq!(up.display(), "demo");
    }

    #[test]
    fn config_path_is_name_under_config_dir() {
        let up = Upstart::new(ServiceDescription::new("demo"));
        assert_eq!(up.config_path().unwrap(), PathBuf::from("/etc/init/demo.conf"));
    }

    #[test]
    fn user_service_fails_before_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let desc = ServiceDescription::new("demo")
            .executable("/nonexistent")
            .option(OPTION_USER_SERVICE, true);
        let up = backend(root.path(), desc);

        assert!(matches!(
            up.install(),
            Err(ServiceError::UnsupportedConfiguration { .. })
        ));
        assert!(!up.paths().config_dir.exists());
    }

    #[test]
    fn install_writes_job_with_unknown_version_defaults() {
        let root = tempfile::tempdir().unwrap();
        let exe = executable_in(root.path());
        let up = backend(
            root.path(),
            ServiceDescription::new("demo").executable(&exe).user_name("svc"),
        );

        up.install().unwrap();

        let content = fs::read_to_string(up.config_path().unwrap()).unwrap();
        assert!(content.contains("kill signal INT"));
        assert!(content.contains("setuid svc"));
        assert!(content.contains(&format!("exec {}\n", exe.display())));
    }

    #[test]
    fn install_uses_start_stop_daemon_when_known_old_release() {
        let root = tempfile::tempdir().unwrap();
        let paths = UpstartPaths::rooted(root.path());
        fs::create_dir_all(paths.init_binary.parent().unwrap()).unwrap();
        fs::write(&paths.init_binary, "#!/bin/sh\necho 'init (upstart 1.3)'\n").unwrap();
        fs::set_permissions(&paths.init_binary, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(&paths.start_stop_daemon, "").unwrap();

        let exe = executable_in(root.path());
        let up = Upstart::with_paths(
            ServiceDescription::new("demo").executable(&exe).user_name("svc"),
            paths,
        );
        up.install().unwrap();

        let content = fs::read_to_string(up.config_path().unwrap()).unwrap();
        assert!(!content.contains("kill signal INT"));
        assert!(!content.contains("setuid"));
        assert!(content.contains("exec start-stop-daemon --start -c svc --exec "));
    }

    #[test]
    fn second_install_keeps_first_file() {
        let root = tempfile::tempdir().unwrap();
        let exe = executable_in(root.path());
        let up = backend(root.path(), ServiceDescription::new("demo").executable(&exe));

        up.install().unwrap();
        let conf = up.config_path().unwrap();
        let before = fs::read(&conf).unwrap();

        let again = backend(
            root.path(),
            ServiceDescription::new("demo")
                .executable(&exe)
                .arguments(["--different"]),
        );
        assert!(matches!(
            again.install(),
            Err(ServiceError::AlreadyExists { .. })
        ));
        assert_eq!(fs::read(&conf).unwrap(), before);
    }

    #[test]
    fn render_failure_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let up = backend(
            root.path(),
            ServiceDescription::new("demo").executable(root.path().join("missing")),
        );

        assert!(matches!(up.install(), Err(ServiceError::Render { .. })));
        assert!(!up.config_path().unwrap().exists());
    }

    #[test]
    fn escaping_name_is_refused_everywhere() {
        let root = tempfile::tempdir().unwrap();
        let paths = UpstartPaths::rooted(root.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        let outside = root.path().join("etc/victim.conf");
        fs::write(&outside, "keep").unwrap();

        let up = Upstart::with_paths(ServiceDescription::new("../victim"), paths);

        assert!(matches!(up.config_path(), Err(ServiceError::Config { .. })));
        assert!(matches!(up.uninstall(), Err(ServiceError::Config { .. })));
        assert!(matches!(up.status(), Err(ServiceError::Config { .. })));
        assert!(matches!(up.start(), Err(ServiceError::Config { .. })));
        assert_eq!(fs::read_to_string(&outside).unwrap(), "keep");
    }

    #[test]
    fn uninstall_missing_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let up = backend(root.path(), ServiceDescription::new("demo"));
        assert!(matches!(up.uninstall(), Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn uninstall_removes_job() {
        let root = tempfile::tempdir().unwrap();
        let exe = executable_in(root.path());
        let up = backend(root.path(), ServiceDescription::new("demo").executable(&exe));

        up.install().unwrap();
        up.uninstall().unwrap();
        assert!(!up.config_path().unwrap().exists());
        assert_eq!(up.status().unwrap(), ServiceStatus::NotInstalled);
    }

    #[test]
    fn write_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.conf");
        fs::write(&path, "original").unwrap();

        assert!(matches!(
            write_new(&path, "replacement"),
            Err(ServiceError::AlreadyExists { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn is_upstart_reads_init_banner() {
        let root = tempfile::tempdir().unwrap();
        let paths = UpstartPaths::rooted(root.path());
        assert!(!is_upstart(&paths));

        fs::create_dir_all(paths.init_binary.parent().unwrap()).unwrap();
        fs::write(&paths.init_binary, "#!/bin/sh\necho 'init (upstart 1.12.1)'\n").unwrap();
        fs::set_permissions(&paths.init_binary, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(is_upstart(&paths));
    }
}
