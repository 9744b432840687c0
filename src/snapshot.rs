//! Snapshot controller (spec §4.7): builds save/load JSON payloads and
//! enforces the paused-for-save / started-for-load invariants. The binary
//! snapshot file itself is Firecracker's format and stays opaque here —
//! the SDK only marshals the JSON envelope (spec §1).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotType {
    Full,
    Diff,
}

impl SnapshotType {
    fn as_wire(self) -> &'static str {
        match self {
            SnapshotType::Full => "Full",
            SnapshotType::Diff => "Diff",
        }
    }
}

impl Default for SnapshotType {
    fn default() -> Self {
        SnapshotType::Full
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryBackendType {
    File,
    Uffd,
}

impl MemoryBackendType {
    fn as_wire(self) -> &'static str {
        match self {
            MemoryBackendType::File => "File",
            MemoryBackendType::Uffd => "Uffd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBackend {
    pub backend_type: MemoryBackendType,
    pub backend_path: PathBuf,
}

/// A snapshot descriptor, built by `snapshot_save` and mutated before
/// `snapshot_load` replays it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub snapshot_path: PathBuf,
    pub mem_file_path: Option<PathBuf>,
    pub memory_backend: Option<MemoryBackend>,
    pub snapshot_type: SnapshotType,
    pub network_overrides: BTreeMap<String, String>,
    pub resume_vm: bool,
    pub track_dirty_pages: bool,
}

impl Snapshot {
    pub fn new(snapshot_path: PathBuf, mem_file_path: PathBuf) -> Self {
        Self {
            snapshot_path,
            mem_file_path: Some(mem_file_path),
            memory_backend: None,
            snapshot_type: SnapshotType::Full,
            network_overrides: BTreeMap::new(),
            resume_vm: false,
            track_dirty_pages: false,
        }
    }

    pub fn snapshot_type(mut self, kind: SnapshotType) -> Self {
        self.snapshot_type = kind;
        self
    }

    /// Setting a memory backend clears `mem_file_path` — the two are
    /// mutually exclusive ways of telling Firecracker where guest memory
    /// lives (spec §4.7).
    pub fn memory_backend(mut self, backend: MemoryBackend) -> Self {
        self.mem_file_path = None;
        self.memory_backend = Some(backend);
        self
    }

    pub fn network_override(mut self, iface_id: impl Into<String>, host_dev_name: impl Into<String>) -> Self {
        self.network_overrides.insert(iface_id.into(), host_dev_name.into());
        self
    }

    pub fn resume_vm(mut self, resume: bool) -> Self {
        self.resume_vm = resume;
        self
    }

    pub fn track_dirty_pages(mut self, track: bool) -> Self {
        self.track_dirty_pages = track;
        self
    }

    /// Body for `PUT /snapshot/create`.
    pub fn create_body(&self) -> Value {
        let mut body = serde_json::json!({
            "snapshot_path": self.snapshot_path,
            "snapshot_type": self.snapshot_type.as_wire(),
        });
        if let Some(backend) = &self.memory_backend {
            body["mem_backend"] = serde_json::json!({
                "backend_type": backend.backend_type.as_wire(),
                "backend_path": backend.backend_path,
            });
        } else if let Some(mem_file_path) = &self.mem_file_path {
            body["mem_file_path"] = serde_json::json!(mem_file_path);
        }
        body
    }

    /// Body for `PUT /snapshot/load`, flattening `network_overrides` from a
    /// map into the list shape the API expects, dropping empty nested
    /// objects (spec §4.7).
    pub fn load_body(&self) -> Value {
        let mut body = serde_json::json!({
            "snapshot_path": self.snapshot_path,
            "resume_vm": self.resume_vm,
        });
        if let Some(backend) = &self.memory_backend {
            body["mem_backend"] = serde_json::json!({
                "backend_type": backend.backend_type.as_wire(),
                "backend_path": backend.backend_path,
            });
        } else if let Some(mem_file_path) = &self.mem_file_path {
            body["mem_file_path"] = serde_json::json!(mem_file_path);
        }
        if self.track_dirty_pages {
            body["track_dirty_pages"] = serde_json::json!(true);
        }
        if !self.network_overrides.is_empty() {
            let overrides: Vec<Value> = self
                .network_overrides
                .iter()
                .map(|(iface_id, host_dev_name)| {
                    serde_json::json!({ "iface_id": iface_id, "host_dev_name": host_dev_name })
                })
                .collect();
            body["network_overrides"] = Value::Array(overrides);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_uses_wire_snapshot_type() {
        let snap = Snapshot::new("/s".into(), "/m".into()).snapshot_type(SnapshotType::Diff);
        let body = snap.create_body();
        assert_eq!(body["snapshot_type"], "Diff");
        assert_eq!(body["mem_file_path"], "/m");
    }

    #[test]
    fn memory_backend_clears_mem_file_path() {
        let snap = Snapshot::new("/s".into(), "/m".into()).memory_backend(MemoryBackend {
            backend_type: MemoryBackendType::Uffd,
            backend_path: "/uffd.sock".into(),
        });
        assert!(snap.mem_file_path.is_none());
        let body = snap.create_body();
        assert!(body.get("mem_file_path").is_none());
        assert_eq!(body["mem_backend"]["backend_type"], "Uffd");
    }

    #[test]
    fn load_body_flattens_network_overrides() {
        let snap = Snapshot::new("/s".into(), "/m".into())
            .network_override("eth0", "tap0")
            .resume_vm(true);
        let body = snap.load_body();
        assert_eq!(body["network_overrides"][0]["iface_id"], "eth0");
        assert_eq!(body["network_overrides"][0]["host_dev_name"], "tap0");
        assert_eq!(body["resume_vm"], true);
    }

    #[test]
    fn load_body_omits_empty_network_overrides() {
        let snap = Snapshot::new("/s".into(), "/m".into());
        let body = snap.load_body();
        assert!(body.get("network_overrides").is_none());
    }

    #[test]
    fn track_dirty_pages_is_set_on_load_body_not_create_body() {
        let snap = Snapshot::new("/s".into(), "/m".into()).track_dirty_pages(true);
        assert!(snap.create_body().get("track_dirty_pages").is_none());
        assert_eq!(snap.load_body()["track_dirty_pages"], true);
    }
}
