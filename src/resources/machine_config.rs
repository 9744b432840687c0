//! `machine_config` resource (spec §4.1): post-boot allows everything.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/machine-config";

pub const SCHEMA: &[FieldMeta] = &[
    field("vcpu_count", true, true),
    field("mem_size_mib", true, true),
    field("smt", false, true),
    field("track_dirty_pages", false, true),
    field("huge_pages", false, true),
    field("cpu_template", false, true),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum HugePages {
    None,
    #[serde(rename = "2M")]
    Size2M,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineConfig {
    pub vcpu_count: u32,
    pub mem_size_mib: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_dirty_pages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub huge_pages: Option<HugePages>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_template: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MachineConfigOptions {
    pub vcpu_count: Option<u32>,
    pub mem_size_mib: Option<u32>,
    pub smt: Option<bool>,
    pub track_dirty_pages: Option<bool>,
    pub huge_pages: Option<HugePages>,
    pub cpu_template: Option<String>,
}

impl MachineConfigOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.vcpu_count.is_some() {
            v.push("vcpu_count");
        }
        if self.mem_size_mib.is_some() {
            v.push("mem_size_mib");
        }
        if self.smt.is_some() {
            v.push("smt");
        }
        if self.track_dirty_pages.is_some() {
            v.push("track_dirty_pages");
        }
        if self.huge_pages.is_some() {
            v.push("huge_pages");
        }
        if self.cpu_template.is_some() {
            v.push("cpu_template");
        }
        v
    }
}

impl MachineConfig {
    pub fn create(opts: MachineConfigOptions) -> Self {
        Self {
            vcpu_count: opts.vcpu_count.expect("validated by caller"),
            mem_size_mib: opts.mem_size_mib.expect("validated by caller"),
            smt: opts.smt,
            track_dirty_pages: opts.track_dirty_pages,
            huge_pages: opts.huge_pages,
            cpu_template: opts.cpu_template,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: MachineConfigOptions) {
        if let Some(v) = opts.vcpu_count {
            self.vcpu_count = v;
        }
        if let Some(v) = opts.mem_size_mib {
            self.mem_size_mib = v;
        }
        if let Some(v) = opts.smt {
            self.smt = Some(v);
        }
        if let Some(v) = opts.track_dirty_pages {
            self.track_dirty_pages = Some(v);
        }
        if let Some(v) = opts.huge_pages {
            self.huge_pages = Some(v);
        }
        if let Some(v) = opts.cpu_template {
            self.cpu_template = Some(v);
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for MachineConfig {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
