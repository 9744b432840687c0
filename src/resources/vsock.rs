//! `vsock` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/vsock";

pub const SCHEMA: &[FieldMeta] = &[
    field("guest_cid", true, false),
    field("uds_path", true, false),
    field("vsock_id", false, false),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vsock {
    pub guest_cid: u32,
    pub uds_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vsock_id: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VsockOptions {
    pub guest_cid: Option<u32>,
    pub uds_path: Option<String>,
    pub vsock_id: Option<String>,
}

impl VsockOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.guest_cid.is_some() {
            v.push("guest_cid");
        }
        if self.uds_path.is_some() {
            v.push("uds_path");
        }
        if self.vsock_id.is_some() {
            v.push("vsock_id");
        }
        v
    }
}

impl Vsock {
    pub fn create(opts: VsockOptions) -> Self {
        Self {
            guest_cid: opts.guest_cid.expect("validated by caller"),
            uds_path: opts.uds_path.expect("validated by caller"),
            vsock_id: opts.vsock_id,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: VsockOptions) {
        if let Some(v) = opts.guest_cid {
            self.guest_cid = v;
        }
        if let Some(v) = opts.uds_path {
            self.uds_path = v;
        }
        if opts.vsock_id.is_some() {
            self.vsock_id = opts.vsock_id;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for Vsock {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
