//! Ambient, per-environment configuration (grounded on the teacher's
//! `config.rs::HypervisorConfig`) — settings a caller typically sets once
//! per host rather than once per VM spec.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment-level defaults applied when a [`crate::spec::VmSpec`] doesn't
/// specify its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HypervisorConfig {
    /// Explicit path to the `firecracker` binary. When absent, resolution
    /// falls back to `FIRECRACKER_PATH` then `~/.firecracker/bin/firecracker`.
    pub firecracker_path: Option<PathBuf>,

    /// Explicit path to the `jailer` binary, same resolution order as
    /// `firecracker_path` but under `JAILER_PATH`.
    pub jailer_path: Option<PathBuf>,

    /// Seconds to wait for the process to report alive before declaring a
    /// startup failure.
    pub launch_timeout_secs: u64,

    /// Grace period after spawn before the first liveness poll.
    pub liveness_poll_interval: std::time::Duration,

    /// Whether `stop` removes auto-generated host artifacts (sockets, FIFOs,
    /// auto-generated config file). The logger's `log_path` is never removed
    /// regardless of this setting.
    pub cleanup_artifacts_on_stop: bool,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            firecracker_path: None,
            jailer_path: None,
            launch_timeout_secs: 3,
            liveness_poll_interval: std::time::Duration::from_millis(100),
            cleanup_artifacts_on_stop: true,
        }
    }
}

impl HypervisorConfig {
    /// Resolve the firecracker binary path: explicit config, then
    /// `FIRECRACKER_PATH` env var, then the conventional default.
    pub fn resolve_firecracker_path(&self) -> PathBuf {
        if let Some(p) = &self.firecracker_path {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FIRECRACKER_PATH") {
            return PathBuf::from(p);
        }
        default_home_bin("firecracker")
    }

    /// Resolve the jailer binary path: explicit config, then `JAILER_PATH`
    /// env var, then the conventional default.
    pub fn resolve_jailer_path(&self) -> PathBuf {
        if let Some(p) = &self.jailer_path {
            return p.clone();
        }
        if let Ok(p) = std::env::var("JAILER_PATH") {
            return PathBuf::from(p);
        }
        default_home_bin("jailer")
    }
}

fn default_home_bin(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    PathBuf::from(home).join(".firecracker/bin").join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_poll_interval() {
        let cfg = HypervisorConfig::default();
        assert_eq!(cfg.liveness_poll_interval.as_millis(), 100);
        assert!(cfg.cleanup_artifacts_on_stop);
    }

    #[test]
    fn explicit_firecracker_path_wins() {
        let cfg = HypervisorConfig {
            firecracker_path: Some(PathBuf::from("/opt/fc/firecracker")),
            ..Default::default()
        };
        assert_eq!(
            cfg.resolve_firecracker_path(),
            PathBuf::from("/opt/fc/firecracker")
        );
    }
}
