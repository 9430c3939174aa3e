use std::path::{Path, PathBuf};

/// Directory Upstart reads job definitions from
pub const UPSTART_CONFIG_DIR: &str = "/etc/init";

/// Init binary queried for its version
pub const INIT_BINARY: &str = "/sbin/init";

/// Debian daemon helper used to drop privileges on old Upstart releases
pub const START_STOP_DAEMON: &str = "/sbin/start-stop-daemon";

/// Only shipped by Upstart, so its presence identifies the init system
pub const UPSTART_UDEV_BRIDGE: &str = "/sbin/upstart-udev-bridge";

/// Upstart control command, resolved through PATH
pub const INITCTL: &str = "initctl";

/// Host locations used by the Upstart backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstartPaths {
    pub config_dir: PathBuf,
    pub init_binary: PathBuf,
    pub start_stop_daemon: PathBuf,
    pub udev_bridge: PathBuf,
    pub control_command: PathBuf,
}

impl Default for UpstartPaths {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(UPSTART_CONFIG_DIR),
            init_binary: PathBuf::from(INIT_BINARY),
            start_stop_daemon: PathBuf::from(START_STOP_DAEMON),
            udev_bridge: PathBuf::from(UPSTART_UDEV_BRIDGE),
            control_command: PathBuf::from(INITCTL),
        }
    }
}

impl UpstartPaths {
    /// Rebase every filesystem location under `root`.
    ///
    /// The control command keeps its PATH lookup; override it separately.
    pub fn rooted(root: &Path) -> Self {
        let under = |p: &str| root.join(p.trim_start_matches('/'));
        Self {
            config_dir: under(UPSTART_CONFIG_DIR),
            init_binary: under(INIT_BINARY),
            start_stop_daemon: under(START_STOP_DAEMON),
            udev_bridge: under(UPSTART_UDEV_BRIDGE),
            control_command: PathBuf::from(INITCTL),
        }
    }

    pub fn with_control_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.control_command = command.into();
        self
    }

    /// Job file for a service name
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.conf", name))
    }
}
