//! `pmem` resource (spec §4.1): a collection keyed by `id`, pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT_PREFIX: &str = "/pmem";
pub const ID_FIELD: &str = "id";

pub const SCHEMA: &[FieldMeta] = &[
    field("id", true, false),
    field("path_on_host", true, false),
    field("root_device", false, false),
    field("read_only", false, false),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pmem {
    pub id: String,
    pub path_on_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_device: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PmemOptions {
    pub id: Option<String>,
    pub path_on_host: Option<String>,
    pub root_device: Option<bool>,
    pub read_only: Option<bool>,
}

impl PmemOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.id.is_some() {
            v.push("id");
        }
        if self.path_on_host.is_some() {
            v.push("path_on_host");
        }
        if self.root_device.is_some() {
            v.push("root_device");
        }
        if self.read_only.is_some() {
            v.push("read_only");
        }
        v
    }
}

impl Pmem {
    pub fn create(opts: PmemOptions) -> Self {
        Self {
            id: opts.id.expect("validated by caller"),
            path_on_host: opts.path_on_host.expect("validated by caller"),
            root_device: opts.root_device,
            read_only: opts.read_only,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: PmemOptions) {
        if let Some(v) = opts.id {
            self.id = v;
        }
        if let Some(v) = opts.path_on_host {
            self.path_on_host = v;
        }
        if opts.root_device.is_some() {
            self.root_device = opts.root_device;
        }
        if opts.read_only.is_some() {
            self.read_only = opts.read_only;
        }
        self.applied = false;
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", ENDPOINT_PREFIX, self.id)
    }
}

impl crate::resources::Applied for Pmem {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
