//! Command builder (spec §4.2, §6): turns a VM spec's CLI-visible options
//! into argv, an optional on-disk config file, and a dry-run preview.
//! Grounded on the teacher's `components/command_builder.rs`, generalized
//! from a fixed `--api-sock`-only builder into one that emits the full
//! flag table and sorts deterministically (testable property 7).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};

/// Every CLI flag the spec recognizes (spec §6). All optional except where
/// the binary requires one unconditionally (none are — `api_sock`/`id` have
/// spec-level defaults supplied by the caller before reaching here).
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub firecracker_path: Option<PathBuf>,
    pub boot_timer: bool,
    pub no_seccomp: bool,
    pub show_level: bool,
    pub show_log_origin: bool,
    pub enable_pci: bool,
    pub http_api_max_payload_size: Option<u64>,
    pub mmds_size_limit: Option<u64>,
    pub start_time_us: Option<u64>,
    pub start_time_cpu_us: Option<u64>,
    pub parent_cpu_time_us: Option<u64>,
    pub level: Option<String>,
    pub log_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
    pub metadata: Option<String>,
    pub module: Option<String>,
    pub seccomp_filter: Option<PathBuf>,
}

enum Flag {
    Bool(&'static str, bool),
    Value(&'static str, String),
}

impl CliOptions {
    fn flags(&self) -> Vec<Flag> {
        let mut v = Vec::new();
        v.push(Flag::Bool("boot-timer", self.boot_timer));
        v.push(Flag::Bool("no-seccomp", self.no_seccomp));
        v.push(Flag::Bool("show-level", self.show_level));
        v.push(Flag::Bool("show-log-origin", self.show_log_origin));
        v.push(Flag::Bool("enable-pci", self.enable_pci));
        if let Some(n) = self.http_api_max_payload_size {
            v.push(Flag::Value("http-api-max-payload-size", n.to_string()));
        }
        if let Some(n) = self.mmds_size_limit {
            v.push(Flag::Value("mmds-size-limit", n.to_string()));
        }
        if let Some(n) = self.start_time_us {
            v.push(Flag::Value("start-time-us", n.to_string()));
        }
        if let Some(n) = self.start_time_cpu_us {
            v.push(Flag::Value("start-time-cpu-us", n.to_string()));
        }
        if let Some(n) = self.parent_cpu_time_us {
            v.push(Flag::Value("parent-cpu-time-us", n.to_string()));
        }
        if let Some(s) = &self.level {
            v.push(Flag::Value("level", s.clone()));
        }
        if let Some(p) = &self.log_path {
            v.push(Flag::Value("log-path", path_str(p)));
        }
        if let Some(p) = &self.metrics_path {
            v.push(Flag::Value("metrics-path", path_str(p)));
        }
        if let Some(s) = &self.metadata {
            v.push(Flag::Value("metadata", s.clone()));
        }
        if let Some(s) = &self.module {
            v.push(Flag::Value("module", s.clone()));
        }
        if let Some(p) = &self.seccomp_filter {
            v.push(Flag::Value("seccomp-filter", path_str(p)));
        }
        v
    }
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// The materialised result of [`CommandBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuiltCommand {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub api_socket_path: Option<PathBuf>,
    pub config_file_path: Option<PathBuf>,
}

/// Dry-run preview (spec §4.2): what `apply` would send, without spawning
/// anything or touching the disk.
#[derive(Debug, Clone)]
pub struct DryRun {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub api_sock: Option<PathBuf>,
    pub config: Value,
}

pub struct CommandBuilder {
    pub binary: PathBuf,
    pub id: String,
    pub api_socket_path: Option<PathBuf>,
    pub config_file_path: Option<PathBuf>,
    pub no_api: bool,
    pub options: CliOptions,
}

impl CommandBuilder {
    /// Assemble argv. When `include_id` is false the `--id` flag is
    /// omitted — used when this argv becomes the inner Firecracker argv
    /// wrapped by a jailer, which owns `--id` itself (spec §4.9).
    pub fn build_args(&self, include_id: bool) -> Vec<(String, Option<String>)> {
        let mut entries: Vec<(String, Option<String>)> = Vec::new();

        for flag in self.options.flags() {
            match flag {
                Flag::Bool(name, true) => entries.push((name.to_string(), None)),
                Flag::Bool(_, false) => {}
                Flag::Value(name, value) => entries.push((name.to_string(), Some(value))),
            }
        }

        if include_id {
            entries.push(("id".to_string(), Some(self.id.clone())));
        }

        if self.no_api {
            entries.push(("no-api".to_string(), None));
        } else if let Some(sock) = &self.api_socket_path {
            entries.push(("api-sock".to_string(), Some(path_str(sock))));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Build the final `{binary, argv, config_file_path, socket_path}`
    /// tuple (spec §4.2). `config_snapshot` is the pre-boot resource map
    /// used to synthesize an auto-generated config file when `no_api` is
    /// set and no config file was externally supplied.
    pub fn build(&self, config_snapshot: Option<&Value>) -> Result<BuiltCommand> {
        let mut config_file_path = self.config_file_path.clone();

        if self.no_api && config_file_path.is_none() {
            let snapshot = config_snapshot.ok_or_else(|| Error::InvalidOption {
                field: "config_file".into(),
                reason: "no_api requires either an explicit config_file or a resource snapshot to synthesize one".into(),
            })?;
            let path = std::env::temp_dir().join(format!("{}.config.json", self.id));
            let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| Error::Encode(e.to_string()))?;
            std::fs::write(&path, bytes)?;
            config_file_path = Some(path);
        }

        let mut entries = self.build_args(true);
        if let Some(path) = &config_file_path {
            entries.push(("config-file".to_string(), Some(path_str(path))));
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let args = render_args(&entries);

        Ok(BuiltCommand {
            binary: self.binary.clone(),
            args,
            api_socket_path: if self.no_api {
                None
            } else {
                self.api_socket_path.clone()
            },
            config_file_path,
        })
    }

    /// Preview what `build` would produce without touching the filesystem
    /// or requiring a real binary path.
    pub fn dry_run(&self, config: Value) -> DryRun {
        let mut entries = self.build_args(true);
        if let Some(path) = &self.config_file_path {
            entries.push(("config-file".to_string(), Some(path_str(path))));
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        DryRun {
            binary: self.binary.clone(),
            args: render_args(&entries),
            api_sock: self.api_socket_path.clone(),
            config,
        }
    }
}

fn render_args(entries: &[(String, Option<String>)]) -> Vec<String> {
    let mut args = Vec::with_capacity(entries.len() * 2);
    for (name, value) in entries {
        args.push(format!("--{name}"));
        if let Some(v) = value {
            args.push(v.clone());
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CommandBuilder {
        CommandBuilder {
            binary: PathBuf::from("/usr/bin/firecracker"),
            id: "vm-1".into(),
            api_socket_path: Some(PathBuf::from("/tmp/vm-1.sock")),
            config_file_path: None,
            no_api: false,
            options: CliOptions {
                boot_timer: true,
                level: Some("Debug".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn args_are_sorted_by_flag_name() {
        let b = builder();
        let built = b.build(None).unwrap();
        let flag_names: Vec<&str> = built
            .args
            .iter()
            .filter(|a| a.starts_with("--"))
            .map(|a| a.trim_start_matches("--"))
            .collect();
        let mut sorted = flag_names.clone();
        sorted.sort();
        assert_eq!(flag_names, sorted);
    }

    #[test]
    fn id_omitted_when_jailered() {
        let b = builder();
        let entries = b.build_args(false);
        assert!(entries.iter().all(|(name, _)| name != "id"));
    }

    #[test]
    fn no_api_emits_flag_instead_of_socket() {
        let mut b = builder();
        b.no_api = true;
        b.config_file_path = Some(PathBuf::from("/tmp/vm-1.config.json"));
        let built = b.build(None).unwrap();
        assert!(built.args.contains(&"--no-api".to_string()));
        assert!(!built.args.iter().any(|a| a == "--api-sock"));
        assert!(built.api_socket_path.is_none());
    }

    #[test]
    fn no_api_without_config_synthesizes_one() {
        let mut b = builder();
        b.no_api = true;
        let snapshot = serde_json::json!({"boot-source": {"kernel_image_path": "/k"}});
        let built = b.build(Some(&snapshot)).unwrap();
        let path = built.config_file_path.expect("config file synthesized");
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }
}
