use std::path::Path;

use super::Version;

/// Last release that accepts the `kill signal` stanza
const KILL_STANZA_MAX: &str = "0.6.5";

/// First release with the `setuid` stanza
const SETUID_MIN: &str = "1.4";

/// Which optional directives the host's Upstart understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub has_kill_stanza: bool,
    pub has_setuid: bool,
    pub has_start_stop_daemon: bool,
}

impl Capabilities {
    /// Derive the flags from a version and the helper's presence.
    ///
    /// An unknown version enables both version-gated stanzas. Versions are
    /// compared as plain strings, so "1.10" sorts below "1.4".
    pub fn resolve(version: &Version, has_start_stop_daemon: bool) -> Self {
        let (has_kill_stanza, has_setuid) = match version {
            Version::Unknown => (true, true),
            Version::Reported(v) => (v.as_str() <= KILL_STANZA_MAX, v.as_str() >= SETUID_MIN),
        };

        Self {
            has_kill_stanza,
            has_setuid,
            has_start_stop_daemon,
        }
    }

    /// Like [`resolve`](Self::resolve), checking the helper path on disk
    pub fn detect(version: &Version, start_stop_daemon: &Path) -> Self {
        Self::resolve(version, start_stop_daemon.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reported(v: &str) -> Version {
        Version::Reported(v.into())
    }

    #[test]
    fn kill_stanza_up_to_0_6_5() {
        for v in ["0.3.9", "0.6.3", "0.6.5"] {
            assert!(Capabilities::resolve(&reported(v), false).has_kill_stanza, "{v}");
        }
        for v in ["0.6.6", "0.6.5-ubuntu1", "1.4", "1.12.1"] {
            assert!(!Capabilities::resolve(&reported(v), false).has_kill_stanza, "{v}");
        }
    }

    #[test]
    fn setuid_from_1_4() {
        for v in ["1.4", "1.5", "1.4.1", "2.0"] {
            assert!(Capabilities::resolve(&reported(v), false).has_setuid, "{v}");
        }
        for v in ["0.6.5", "1.3", "1.10", "1.12.1"] {
            assert!(!Capabilities::resolve(&reported(v), false).has_setuid, "{v}");
        }
    }

    #[test]
    fn upstart_1_4_drops_kill_keeps_setuid() {
        let caps = Capabilities::resolve(&reported("1.4"), true);
        assert!(!caps.has_kill_stanza);
        assert!(caps.has_setuid);
        assert!(caps.has_start_stop_daemon);
    }

    #[test]
    fn unknown_version_enables_both_stanzas() {
        for helper in [true, false] {
            let caps = Capabilities::resolve(&Version::Unknown, helper);
            assert!(caps.has_kill_stanza);
            assert!(caps.has_setuid);
            assert_eq!(caps.has_start_stop_daemon, helper);
        }
    }

    #[test]
    fn detect_checks_helper_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join("start-stop-daemon");

        assert!(!Capabilities::detect(&Version::Unknown, &helper).has_start_stop_daemon);

        std::fs::write(&helper, "").unwrap();
        assert!(Capabilities::detect(&Version::Unknown, &helper).has_start_stop_daemon);
    }
}
