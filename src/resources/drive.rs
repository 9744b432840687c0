//! `drive` resource (spec §4.1): a collection keyed by `drive_id`. Post-boot
//! mutation permits only `drive_id`, `path_on_host`, and `rate_limiter`.

use serde::{Deserialize, Serialize};

use super::rate_limiter::RateLimiter;
use crate::schema::{field, FieldMeta};

pub const ENDPOINT_PREFIX: &str = "/drives";
pub const ID_FIELD: &str = "drive_id";

pub const SCHEMA: &[FieldMeta] = &[
    field("drive_id", true, true),
    field("is_root_device", true, false),
    field("path_on_host", false, true),
    field("partuuid", false, false),
    field("cache_type", false, false),
    field("is_read_only", false, false),
    field("rate_limiter", false, true),
    field("io_engine", false, false),
    field("socket", false, false),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Drive {
    pub drive_id: String,
    pub is_root_device: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_on_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partuuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limiter: Option<RateLimiter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DriveOptions {
    pub drive_id: Option<String>,
    pub is_root_device: Option<bool>,
    pub path_on_host: Option<String>,
    pub partuuid: Option<String>,
    pub cache_type: Option<String>,
    pub is_read_only: Option<bool>,
    pub rate_limiter: Option<RateLimiter>,
    pub io_engine: Option<String>,
    pub socket: Option<String>,
}

impl DriveOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.drive_id.is_some() {
            v.push("drive_id");
        }
        if self.is_root_device.is_some() {
            v.push("is_root_device");
        }
        if self.path_on_host.is_some() {
            v.push("path_on_host");
        }
        if self.partuuid.is_some() {
            v.push("partuuid");
        }
        if self.cache_type.is_some() {
            v.push("cache_type");
        }
        if self.is_read_only.is_some() {
            v.push("is_read_only");
        }
        if self.rate_limiter.is_some() {
            v.push("rate_limiter");
        }
        if self.io_engine.is_some() {
            v.push("io_engine");
        }
        if self.socket.is_some() {
            v.push("socket");
        }
        v
    }
}

impl Drive {
    pub fn create(opts: DriveOptions) -> Self {
        Self {
            drive_id: opts.drive_id.expect("validated by caller"),
            is_root_device: opts.is_root_device.expect("validated by caller"),
            path_on_host: opts.path_on_host,
            partuuid: opts.partuuid,
            cache_type: opts.cache_type,
            is_read_only: opts.is_read_only,
            rate_limiter: opts.rate_limiter,
            io_engine: opts.io_engine,
            socket: opts.socket,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: DriveOptions) {
        if let Some(v) = opts.drive_id {
            self.drive_id = v;
        }
        if let Some(v) = opts.is_root_device {
            self.is_root_device = v;
        }
        if opts.path_on_host.is_some() {
            self.path_on_host = opts.path_on_host;
        }
        if opts.partuuid.is_some() {
            self.partuuid = opts.partuuid;
        }
        if opts.cache_type.is_some() {
            self.cache_type = opts.cache_type;
        }
        if opts.is_read_only.is_some() {
            self.is_read_only = opts.is_read_only;
        }
        if opts.rate_limiter.is_some() {
            self.rate_limiter = opts.rate_limiter;
        }
        if opts.io_engine.is_some() {
            self.io_engine = opts.io_engine;
        }
        if opts.socket.is_some() {
            self.socket = opts.socket;
        }
        self.applied = false;
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", ENDPOINT_PREFIX, self.drive_id)
    }
}

impl crate::resources::Applied for Drive {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
