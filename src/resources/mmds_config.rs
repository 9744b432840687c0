//! `mmds_config` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/mmds/config";

pub const SCHEMA: &[FieldMeta] = &[
    field("network_interfaces", true, false),
    field("version", false, false),
    field("ipv4_address", false, false),
    field("imds_compat", false, false),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MmdsVersion {
    V1,
    V2,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MmdsConfig {
    pub network_interfaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<MmdsVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imds_compat: Option<bool>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MmdsConfigOptions {
    pub network_interfaces: Option<Vec<String>>,
    pub version: Option<MmdsVersion>,
    pub ipv4_address: Option<String>,
    pub imds_compat: Option<bool>,
}

impl MmdsConfigOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.network_interfaces.is_some() {
            v.push("network_interfaces");
        }
        if self.version.is_some() {
            v.push("version");
        }
        if self.ipv4_address.is_some() {
            v.push("ipv4_address");
        }
        if self.imds_compat.is_some() {
            v.push("imds_compat");
        }
        v
    }
}

impl MmdsConfig {
    pub fn create(opts: MmdsConfigOptions) -> Self {
        Self {
            network_interfaces: opts.network_interfaces.expect("validated by caller"),
            version: opts.version,
            ipv4_address: opts.ipv4_address,
            imds_compat: opts.imds_compat,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: MmdsConfigOptions) {
        if let Some(v) = opts.network_interfaces {
            self.network_interfaces = v;
        }
        if opts.version.is_some() {
            self.version = opts.version;
        }
        if opts.ipv4_address.is_some() {
            self.ipv4_address = opts.ipv4_address;
        }
        if opts.imds_compat.is_some() {
            self.imds_compat = opts.imds_compat;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for MmdsConfig {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
