//! `VmSpec` (spec §3): the declarative aggregate a caller builds up through
//! `configure`/`add`/`metadata`/`set_option`/`jail` and drives through its
//! lifecycle with `start`/`boot`/`pause`/`resume`/`shutdown`/`stop`.
//!
//! Grounded on the teacher's `machine.rs`/`hypervisor/sync.rs` pairing: one
//! aggregate owns the resource values, the process supervisor, the REST
//! client, and the lifecycle state, and every mutation is a pure value
//! transformation validated against the resource's schema before it lands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::apply;
use crate::client::RestClient;
use crate::command::{CliOptions, CommandBuilder, DryRun};
use crate::config::HypervisorConfig;
use crate::error::{Error, Result};
use crate::jailer::{Jailer, JailerOptions};
use crate::resources::balloon::{Balloon, BalloonOptions};
use crate::resources::boot_source::{BootSource, BootSourceOptions};
use crate::resources::cpu_config::{CpuConfig, CpuConfigOptions};
use crate::resources::drive::{Drive, DriveOptions};
use crate::resources::entropy::{Entropy, EntropyOptions};
use crate::resources::logger::{Logger, LoggerOptions};
use crate::resources::machine_config::{MachineConfig, MachineConfigOptions};
use crate::resources::metrics::{Metrics, MetricsOptions};
use crate::resources::mmds::Mmds;
use crate::resources::mmds_config::{MmdsConfig, MmdsConfigOptions};
use crate::resources::network_interface::{NetworkInterface, NetworkInterfaceOptions};
use crate::resources::pmem::{Pmem, PmemOptions};
use crate::resources::serial::{Serial, SerialOptions};
use crate::resources::vsock::{Vsock, VsockOptions};
use crate::resources::Applied;
use crate::rollback::{Rollback, RollbackStack};
use crate::schema::{validate_patch, FieldMeta};
use crate::snapshot::Snapshot;
use crate::state::{check_transition, require_initial, require_not_exited, Transition, VmState};
use crate::supervisor::Supervisor;

/// One flag from the CLI surface (spec §6), set through [`VmSpec::set_option`].
#[derive(Debug, Clone)]
pub enum SetOption {
    ApiSock(PathBuf),
    Id(String),
    FirecrackerPath(PathBuf),
    ConfigFile(PathBuf),
    NoApi(bool),
    BootTimer(bool),
    NoSeccomp(bool),
    ShowLevel(bool),
    ShowLogOrigin(bool),
    EnablePci(bool),
    HttpApiMaxPayloadSize(u64),
    MmdsSizeLimit(u64),
    StartTimeUs(u64),
    StartTimeCpuUs(u64),
    ParentCpuTimeUs(u64),
    Level(String),
    LogPath(PathBuf),
    MetricsPath(PathBuf),
    Metadata(String),
    Module(String),
    SeccompFilter(PathBuf),
}

/// The declarative VM specification (spec §3).
pub struct VmSpec {
    pub id: String,
    pub api_socket_path: Option<PathBuf>,
    pub binary_path: Option<PathBuf>,
    pub config_file_path: Option<PathBuf>,
    pub no_api: bool,
    pub cli_options: CliOptions,
    pub state: VmState,
    pub config: HypervisorConfig,

    pub client: Option<RestClient>,
    pub supervisor: Option<Supervisor>,
    pub jailer: Option<Jailer>,
    pub errors: Vec<(String, String)>,

    /// Path to the auto-generated config file `start` synthesized, if any —
    /// tracked separately from `config_file_path` (which only ever holds a
    /// caller-supplied path) so `stop` removes only artifacts the SDK
    /// itself created.
    pub auto_config_file_path: Option<PathBuf>,

    pub balloon: Option<Balloon>,
    pub boot_source: Option<BootSource>,
    pub cpu_config: Option<CpuConfig>,
    pub entropy: Option<Entropy>,
    pub logger: Option<Logger>,
    pub machine_config: Option<MachineConfig>,
    pub metrics: Option<Metrics>,
    pub mmds_config: Option<MmdsConfig>,
    pub serial: Option<Serial>,
    pub vsock: Option<Vsock>,

    pub drives: BTreeMap<String, Drive>,
    pub network_interfaces: BTreeMap<String, NetworkInterface>,
    pub pmems: BTreeMap<String, Pmem>,

    pub mmds: Option<Mmds>,
}

impl Default for VmSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl VmSpec {
    /// A fresh spec with spec-level defaults: a random `anonymous-instance-*`
    /// id and a matching per-instance API socket path (spec §6).
    pub fn new() -> Self {
        Self::with_config(HypervisorConfig::default())
    }

    pub fn with_config(config: HypervisorConfig) -> Self {
        let unique = Uuid::new_v4();
        Self {
            id: format!("anonymous-instance-{unique}"),
            api_socket_path: Some(std::env::temp_dir().join(format!("firecracker.{unique}.sock"))),
            binary_path: None,
            config_file_path: None,
            no_api: false,
            cli_options: CliOptions::default(),
            state: VmState::Initial,
            config,
            client: None,
            supervisor: None,
            jailer: None,
            errors: Vec::new(),
            auto_config_file_path: None,
            balloon: None,
            boot_source: None,
            cpu_config: None,
            entropy: None,
            logger: None,
            machine_config: None,
            metrics: None,
            mmds_config: None,
            serial: None,
            vsock: None,
            drives: BTreeMap::new(),
            network_interfaces: BTreeMap::new(),
            pmems: BTreeMap::new(),
            mmds: None,
        }
    }

    // ---- singleton resource mutation -------------------------------------

    pub fn configure_balloon(&mut self, opts: BalloonOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.balloon,
            opts,
            &present,
            crate::resources::balloon::SCHEMA,
            self.state,
            "configure:balloon",
            Balloon::create,
            Balloon::merge,
        )
    }

    pub fn configure_boot_source(&mut self, opts: BootSourceOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.boot_source,
            opts,
            &present,
            crate::resources::boot_source::SCHEMA,
            self.state,
            "configure:boot_source",
            BootSource::create,
            BootSource::merge,
        )
    }

    pub fn configure_cpu_config(&mut self, opts: CpuConfigOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.cpu_config,
            opts,
            &present,
            crate::resources::cpu_config::SCHEMA,
            self.state,
            "configure:cpu_config",
            CpuConfig::create,
            CpuConfig::merge,
        )
    }

    pub fn configure_entropy(&mut self, opts: EntropyOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.entropy,
            opts,
            &present,
            crate::resources::entropy::SCHEMA,
            self.state,
            "configure:entropy",
            Entropy::create,
            Entropy::merge,
        )
    }

    pub fn configure_logger(&mut self, opts: LoggerOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.logger,
            opts,
            &present,
            crate::resources::logger::SCHEMA,
            self.state,
            "configure:logger",
            Logger::create,
            Logger::merge,
        )
    }

    pub fn configure_machine_config(&mut self, opts: MachineConfigOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.machine_config,
            opts,
            &present,
            crate::resources::machine_config::SCHEMA,
            self.state,
            "configure:machine_config",
            MachineConfig::create,
            MachineConfig::merge,
        )
    }

    pub fn configure_metrics(&mut self, opts: MetricsOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.metrics,
            opts,
            &present,
            crate::resources::metrics::SCHEMA,
            self.state,
            "configure:metrics",
            Metrics::create,
            Metrics::merge,
        )
    }

    pub fn configure_mmds_config(&mut self, opts: MmdsConfigOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.mmds_config,
            opts,
            &present,
            crate::resources::mmds_config::SCHEMA,
            self.state,
            "configure:mmds_config",
            MmdsConfig::create,
            MmdsConfig::merge,
        )
    }

    pub fn configure_serial(&mut self, opts: SerialOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.serial,
            opts,
            &present,
            crate::resources::serial::SCHEMA,
            self.state,
            "configure:serial",
            Serial::create,
            Serial::merge,
        )
    }

    pub fn configure_vsock(&mut self, opts: VsockOptions) -> Result<()> {
        let present = opts.present();
        mutate_singleton(
            &mut self.vsock,
            opts,
            &present,
            crate::resources::vsock::SCHEMA,
            self.state,
            "configure:vsock",
            Vsock::create,
            Vsock::merge,
        )
    }

    // ---- collection resource mutation -------------------------------------

    pub fn add_drive(&mut self, opts: DriveOptions) -> Result<()> {
        let key = opts
            .drive_id
            .clone()
            .ok_or_else(|| Error::invalid_option("drive_id", "required to identify the drive"))?;
        let present = opts.present();
        mutate_collection(
            &mut self.drives,
            key,
            opts,
            &present,
            crate::resources::drive::SCHEMA,
            self.state,
            "add:drive",
            Drive::create,
            Drive::merge,
        )
    }

    pub fn add_network_interface(&mut self, opts: NetworkInterfaceOptions) -> Result<()> {
        let key = opts
            .iface_id
            .clone()
            .ok_or_else(|| Error::invalid_option("iface_id", "required to identify the network interface"))?;
        let present = opts.present();
        mutate_collection(
            &mut self.network_interfaces,
            key,
            opts,
            &present,
            crate::resources::network_interface::SCHEMA,
            self.state,
            "add:network_interface",
            NetworkInterface::create,
            NetworkInterface::merge,
        )
    }

    pub fn add_pmem(&mut self, opts: PmemOptions) -> Result<()> {
        let key = opts
            .id
            .clone()
            .ok_or_else(|| Error::invalid_option("id", "required to identify the pmem device"))?;
        let present = opts.present();
        mutate_collection(
            &mut self.pmems,
            key,
            opts,
            &present,
            crate::resources::pmem::SCHEMA,
            self.state,
            "add:pmem",
            Pmem::create,
            Pmem::merge,
        )
    }

    // ---- metadata store (spec §4.8) ---------------------------------------

    pub fn metadata_replace(&mut self, data: Value) -> Result<()> {
        require_not_exited("metadata", self.state)?;
        self.mmds.get_or_insert_with(Mmds::new).replace(data);
        Ok(())
    }

    pub fn metadata_set_key(&mut self, key: &str, value: Value) -> Result<()> {
        require_not_exited("metadata", self.state)?;
        self.mmds.get_or_insert_with(Mmds::new).set_key(key, value);
        Ok(())
    }

    pub fn metadata_update_key_with(
        &mut self,
        key: &str,
        default: Value,
        update_fn: impl FnOnce(Value) -> Value,
    ) -> Result<()> {
        require_not_exited("metadata", self.state)?;
        self.mmds
            .get_or_insert_with(Mmds::new)
            .update_key_with(key, default, update_fn);
        Ok(())
    }

    // ---- ambient options / jailer (spec §4.9, §6) -------------------------

    pub fn set_option(&mut self, option: SetOption) -> Result<()> {
        require_initial("set_option", self.state)?;
        match option {
            SetOption::ApiSock(p) => self.api_socket_path = Some(p),
            SetOption::Id(s) => self.id = s,
            SetOption::FirecrackerPath(p) => self.binary_path = Some(p),
            SetOption::ConfigFile(p) => self.config_file_path = Some(p),
            SetOption::NoApi(b) => self.no_api = b,
            SetOption::BootTimer(b) => self.cli_options.boot_timer = b,
            SetOption::NoSeccomp(b) => self.cli_options.no_seccomp = b,
            SetOption::ShowLevel(b) => self.cli_options.show_level = b,
            SetOption::ShowLogOrigin(b) => self.cli_options.show_log_origin = b,
            SetOption::EnablePci(b) => self.cli_options.enable_pci = b,
            SetOption::HttpApiMaxPayloadSize(n) => self.cli_options.http_api_max_payload_size = Some(n),
            SetOption::MmdsSizeLimit(n) => self.cli_options.mmds_size_limit = Some(n),
            SetOption::StartTimeUs(n) => self.cli_options.start_time_us = Some(n),
            SetOption::StartTimeCpuUs(n) => self.cli_options.start_time_cpu_us = Some(n),
            SetOption::ParentCpuTimeUs(n) => self.cli_options.parent_cpu_time_us = Some(n),
            SetOption::Level(s) => self.cli_options.level = Some(s),
            SetOption::LogPath(p) => self.cli_options.log_path = Some(p),
            SetOption::MetricsPath(p) => self.cli_options.metrics_path = Some(p),
            SetOption::Metadata(s) => self.cli_options.metadata = Some(s),
            SetOption::Module(s) => self.cli_options.module = Some(s),
            SetOption::SeccompFilter(p) => self.cli_options.seccomp_filter = Some(p),
        }
        Ok(())
    }

    pub fn jail(&mut self, opts: JailerOptions) -> Result<()> {
        require_initial("jail", self.state)?;
        let present = opts.present();
        let creating = self.jailer.is_none();
        validate_patch(crate::jailer::SCHEMA, &present, creating, false)?;

        if let Some(j) = self.jailer.as_mut() {
            if let Some(v) = opts.uid {
                j.uid = v;
            }
            if let Some(v) = opts.gid {
                j.gid = v;
            }
            if opts.parent_cgroup.is_some() {
                j.parent_cgroup = opts.parent_cgroup;
            }
            if opts.netns.is_some() {
                j.netns = opts.netns;
            }
            if let Some(v) = opts.daemonize {
                j.daemonize = v;
            }
            if let Some(v) = opts.new_pid_ns {
                j.new_pid_ns = v;
            }
            if opts.jailer_path.is_some() {
                j.jailer_path = opts.jailer_path;
            }
            if let Some(v) = opts.cgroup_version {
                j.cgroup_version = v;
            }
            if let Some(v) = opts.chroot_base_dir {
                j.chroot_base_dir = v;
            }
        } else {
            self.jailer = Some(Jailer::create(opts));
        }
        Ok(())
    }

    pub fn cgroup(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        require_initial("cgroup", self.state)?;
        let jailer = self
            .jailer
            .as_mut()
            .ok_or_else(|| Error::invalid_option("jailer", "jail must be configured before setting cgroups"))?;
        jailer.cgroup(name, value);
        Ok(())
    }

    pub fn resource_limit(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        require_initial("resource_limit", self.state)?;
        let jailer = self.jailer.as_mut().ok_or_else(|| {
            Error::invalid_option("jailer", "jail must be configured before setting resource limits")
        })?;
        jailer.resource_limit(name, value);
        Ok(())
    }

    // ---- lifecycle (spec §4.5) --------------------------------------------

    /// Resolve the binary, build argv (wrapping in the jailer if attached),
    /// spawn the supervisor, wait for the liveness grace window, connect the
    /// REST client, then run `apply` once to push any pre-boot configuration
    /// declared before `start` (spec §4.5).
    pub fn start(&mut self) -> Result<()> {
        if matches!(check_transition("start", self.state)?, Transition::Idempotent) {
            return Ok(());
        }

        let mut rollback = RollbackStack::new();
        let binary = self
            .binary_path
            .clone()
            .unwrap_or_else(|| self.config.resolve_firecracker_path());

        let builder = CommandBuilder {
            binary,
            id: self.id.clone(),
            api_socket_path: self.api_socket_path.clone(),
            config_file_path: self.config_file_path.clone(),
            no_api: self.no_api,
            options: self.cli_options.clone(),
        };

        let snapshot = self.config_snapshot();
        let built = builder.build(Some(&snapshot))?;

        if self.config_file_path.is_none() {
            if let Some(path) = &built.config_file_path {
                self.auto_config_file_path = Some(path.clone());
                rollback.push(Rollback::RemoveFile { path: path.clone() });
            }
        }

        let spawned = if let Some(jailer) = &self.jailer {
            let jailer_binary = jailer
                .jailer_path
                .clone()
                .unwrap_or_else(|| self.config.resolve_jailer_path());
            let inner_argv = strip_id_flag(&built.args);
            let outer = jailer.wrap_argv(&jailer_binary, &self.id, &built.binary, &inner_argv);
            Supervisor::spawn(&outer[0], &outer[1..])
        } else {
            Supervisor::spawn(&built.binary.to_string_lossy(), &built.args)
        };

        let mut supervisor = match spawned {
            Ok(s) => s,
            Err(e) => {
                rollback.rollback_all();
                return Err(e);
            }
        };
        rollback.push(Rollback::StopProcess { pid: supervisor.pid() });

        if let Err(e) = supervisor.wait_for_liveness(self.config.liveness_poll_interval) {
            rollback.rollback_all();
            return Err(e);
        }

        let client = if self.no_api {
            None
        } else if let Some(sock) = &built.api_socket_path {
            match RestClient::connect(sock) {
                Ok(c) => Some(c),
                Err(e) => {
                    rollback.rollback_all();
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.supervisor = Some(supervisor);
        self.client = client;
        self.state = VmState::Started;
        rollback.disarm();

        self.apply()?;
        Ok(())
    }

    pub fn boot(&mut self) -> Result<()> {
        match check_transition("boot", self.state)? {
            Transition::Idempotent => Ok(()),
            Transition::Advance(next) => {
                if let Some(client) = self.client.as_mut() {
                    client.create_sync_action("InstanceStart")?;
                }
                self.state = next;
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match check_transition("pause", self.state)? {
            Transition::Idempotent => Ok(()),
            Transition::Advance(next) => {
                if let Some(client) = self.client.as_mut() {
                    client.patch_vm("Paused")?;
                }
                self.state = next;
                Ok(())
            }
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match check_transition("resume", self.state)? {
            Transition::Idempotent => Ok(()),
            Transition::Advance(next) => {
                if let Some(client) = self.client.as_mut() {
                    client.patch_vm("Resumed")?;
                }
                self.state = next;
                Ok(())
            }
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        match check_transition("shutdown", self.state)? {
            Transition::Idempotent => Ok(()),
            Transition::Advance(next) => {
                if let Some(client) = self.client.as_mut() {
                    client.create_sync_action("SendCtrlAltDel")?;
                }
                self.state = next;
                Ok(())
            }
        }
    }

    /// SIGTERM the external process, remove SDK-owned host artifacts (the
    /// logger's `log_path` is the explicit exception), and advance to
    /// `exited` (spec §4.4, §5).
    pub fn stop(&mut self) -> Result<()> {
        match check_transition("stop", self.state)? {
            Transition::Idempotent => Ok(()),
            Transition::Advance(next) => {
                if let Some(sup) = self.supervisor.as_mut() {
                    sup.stop()?;
                }
                if self.config.cleanup_artifacts_on_stop {
                    self.cleanup_artifacts();
                }
                self.client = None;
                self.state = next;
                Ok(())
            }
        }
    }

    pub fn flush_metrics(&mut self) -> Result<()> {
        check_transition("flush_metrics", self.state)?;
        if let Some(client) = self.client.as_mut() {
            client.create_sync_action("FlushMetrics")?;
        }
        Ok(())
    }

    pub fn snapshot_save(&mut self, snapshot: &Snapshot) -> Result<()> {
        check_transition("snapshot_save", self.state)?;
        if let Some(client) = self.client.as_mut() {
            client.create_snapshot(&snapshot.create_body())?;
        }
        Ok(())
    }

    pub fn snapshot_load(&mut self, snapshot: &Snapshot) -> Result<()> {
        check_transition("snapshot_load", self.state)?;
        if let Some(client) = self.client.as_mut() {
            client.load_snapshot(&snapshot.load_body())?;
        }
        if snapshot.resume_vm {
            self.state = VmState::Running;
        }
        Ok(())
    }

    /// Reconcile every not-yet-applied resource against the live microVM
    /// (spec §4.6). A no-op in `no_api` mode.
    pub fn apply(&mut self) -> Result<()> {
        apply::apply(self)
    }

    /// Preview what `start` + `apply` would do, without spawning anything or
    /// touching the disk (spec §4.2).
    pub fn dry_run(&self) -> DryRun {
        let binary = self
            .binary_path
            .clone()
            .unwrap_or_else(|| self.config.resolve_firecracker_path());
        let builder = CommandBuilder {
            binary,
            id: self.id.clone(),
            api_socket_path: self.api_socket_path.clone(),
            config_file_path: self.config_file_path.clone(),
            no_api: self.no_api,
            options: self.cli_options.clone(),
        };
        builder.dry_run(self.config_snapshot())
    }

    fn cleanup_artifacts(&self) {
        if let Some(sock) = &self.api_socket_path {
            let _ = std::fs::remove_file(sock);
        }
        if let Some(vsock) = &self.vsock {
            let _ = std::fs::remove_file(&vsock.uds_path);
        }
        if let Some(metrics) = &self.metrics {
            let _ = std::fs::remove_file(&metrics.metrics_path);
        }
        if let Some(serial) = &self.serial {
            if let Some(path) = &serial.output_path {
                let _ = std::fs::remove_file(path);
            }
        }
        if let Some(path) = &self.auto_config_file_path {
            let _ = std::fs::remove_file(path);
        }
    }

    /// The REST-path-keyed map of not-yet-applied resources `apply` would
    /// send — consumed by `dry_run` and, when `no_api` is set, synthesized
    /// into the on-disk config file `start` hands the binary (spec §4.2).
    fn config_snapshot(&self) -> Value {
        let mut map = serde_json::Map::new();
        insert_singleton(&mut map, "balloon", &self.balloon);
        insert_singleton(&mut map, "boot-source", &self.boot_source);
        insert_singleton(&mut map, "cpu-config", &self.cpu_config);
        insert_singleton(&mut map, "entropy", &self.entropy);
        insert_singleton(&mut map, "logger", &self.logger);
        insert_singleton(&mut map, "machine-config", &self.machine_config);
        insert_singleton(&mut map, "metrics", &self.metrics);
        insert_singleton(&mut map, "mmds-config", &self.mmds_config);
        insert_singleton(&mut map, "serial", &self.serial);
        insert_singleton(&mut map, "vsock", &self.vsock);
        insert_collection(&mut map, "drives", &self.drives);
        insert_collection(&mut map, "network-interfaces", &self.network_interfaces);
        insert_collection(&mut map, "pmems", &self.pmems);
        if let Some(m) = &self.mmds {
            if !m.is_applied() {
                map.insert("mmds".to_string(), m.data.clone());
            }
        }
        Value::Object(map)
    }
}

fn insert_singleton<T: Serialize + Applied>(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
    slot: &Option<T>,
) {
    if let Some(v) = slot {
        if !v.is_applied() {
            if let Ok(value) = serde_json::to_value(v) {
                map.insert(key.to_string(), value);
            }
        }
    }
}

fn insert_collection<T: Serialize + Applied>(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
    members: &BTreeMap<String, T>,
) {
    let unapplied: Vec<&T> = members.values().filter(|m| !m.is_applied()).collect();
    if !unapplied.is_empty() {
        if let Ok(value) = serde_json::to_value(&unapplied) {
            map.insert(key.to_string(), value);
        }
    }
}

/// Strip a `--id <value>` pair from an argv — used when handing the inner
/// Firecracker argv to a jailer, which owns `--id` itself (spec §4.9).
fn strip_id_flag(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter().cloned();
    while let Some(a) = iter.next() {
        if a == "--id" {
            iter.next();
            continue;
        }
        out.push(a);
    }
    out
}

/// `true` once a resource mutation must be validated against the post-boot
/// schema window rather than the pre-boot one.
fn is_post_boot_window(state: VmState) -> bool {
    matches!(state, VmState::Running | VmState::Paused | VmState::Shutdown)
}

/// Shared validate-then-create-or-merge path for every singleton resource's
/// `configure_*` method.
fn mutate_singleton<V, O>(
    slot: &mut Option<V>,
    opts: O,
    present: &[&'static str],
    schema: &[FieldMeta],
    state: VmState,
    operation: &str,
    create: impl FnOnce(O) -> V,
    merge: impl FnOnce(&mut V, O),
) -> Result<()> {
    require_not_exited(operation, state)?;
    let creating = slot.is_none();
    validate_patch(schema, present, creating, is_post_boot_window(state))?;
    if let Some(v) = slot.as_mut() {
        merge(v, opts);
    } else {
        *slot = Some(create(opts));
    }
    Ok(())
}

/// Shared validate-then-create-or-merge path for every collection resource's
/// `add_*` method, keyed by the member's id field.
fn mutate_collection<V, O>(
    members: &mut BTreeMap<String, V>,
    key: String,
    opts: O,
    present: &[&'static str],
    schema: &[FieldMeta],
    state: VmState,
    operation: &str,
    create: impl FnOnce(O) -> V,
    merge: impl FnOnce(&mut V, O),
) -> Result<()> {
    require_not_exited(operation, state)?;
    let creating = !members.contains_key(&key);
    validate_patch(schema, present, creating, is_post_boot_window(state))?;
    if let Some(v) = members.get_mut(&key) {
        merge(v, opts);
    } else {
        members.insert(key, create(opts));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spec_has_sane_defaults() {
        let spec = VmSpec::new();
        assert_eq!(spec.state, VmState::Initial);
        assert!(spec.id.starts_with("anonymous-instance-"));
        assert!(spec.api_socket_path.is_some());
        assert!(spec.errors.is_empty());
    }

    #[test]
    fn configure_boot_source_then_merge_keeps_prior_fields() {
        let mut spec = VmSpec::new();
        spec.configure_boot_source(BootSourceOptions {
            kernel_image_path: Some("/vmlinux".into()),
            boot_args: Some("console=ttyS0".into()),
            initrd_path: None,
        })
        .unwrap();
        spec.configure_boot_source(BootSourceOptions {
            kernel_image_path: None,
            boot_args: Some("console=ttyS0 reboot=k".into()),
            initrd_path: None,
        })
        .unwrap();
        let bs = spec.boot_source.as_ref().unwrap();
        assert_eq!(bs.kernel_image_path, "/vmlinux");
        assert_eq!(bs.boot_args.as_deref(), Some("console=ttyS0 reboot=k"));
        assert!(!bs.applied);
    }

    #[test]
    fn configure_missing_required_field_fails() {
        let mut spec = VmSpec::new();
        let err = spec
            .configure_boot_source(BootSourceOptions {
                kernel_image_path: None,
                boot_args: Some("x".into()),
                initrd_path: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
    }

    #[test]
    fn add_drive_requires_drive_id() {
        let mut spec = VmSpec::new();
        let err = spec
            .add_drive(DriveOptions {
                is_root_device: Some(true),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref field, .. } if field == "drive_id"));
    }

    #[test]
    fn add_drive_then_apply_with_no_client_is_noop() {
        let mut spec = VmSpec::new();
        spec.add_drive(DriveOptions {
            drive_id: Some("rootfs".into()),
            is_root_device: Some(true),
            path_on_host: Some("/rootfs.ext4".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(spec.client.is_none());
        spec.apply().unwrap();
        assert!(!spec.drives["rootfs"].applied);
        assert!(spec.errors.is_empty());
    }

    #[test]
    fn metadata_set_key_creates_mmds_and_marks_unapplied() {
        let mut spec = VmSpec::new();
        spec.metadata_set_key("hello", Value::String("world".into())).unwrap();
        assert_eq!(spec.mmds.as_ref().unwrap().data["hello"], "world");
        assert!(!spec.mmds.as_ref().unwrap().applied);
    }

    #[test]
    fn jail_requires_initial_state() {
        let mut spec = VmSpec::new();
        spec.state = VmState::Exited;
        let err = spec
            .jail(JailerOptions {
                uid: Some(1),
                gid: Some(1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[test]
    fn dry_run_omits_applied_resources() {
        let mut spec = VmSpec::new();
        spec.configure_boot_source(BootSourceOptions {
            kernel_image_path: Some("/vmlinux".into()),
            boot_args: None,
            initrd_path: None,
        })
        .unwrap();
        let preview = spec.dry_run();
        assert!(preview.config.get("boot-source").is_some());
        spec.boot_source.as_mut().unwrap().applied = true;
        let preview = spec.dry_run();
        assert!(preview.config.get("boot-source").is_none());
    }

    #[test]
    fn strip_id_flag_removes_pair_only() {
        let args = vec!["--api-sock".to_string(), "/s".to_string(), "--id".to_string(), "vm-1".to_string()];
        let stripped = strip_id_flag(&args);
        assert_eq!(stripped, vec!["--api-sock".to_string(), "/s".to_string()]);
    }
}
