//! `network_interface` resource (spec §4.1): a collection keyed by
//! `iface_id`. Post-boot mutation permits only `iface_id`,
//! `rx_rate_limiter`, and `tx_rate_limiter`.

use serde::{Deserialize, Serialize};

use super::rate_limiter::RateLimiter;
use crate::schema::{field, FieldMeta};

pub const ENDPOINT_PREFIX: &str = "/network-interfaces";
pub const ID_FIELD: &str = "iface_id";

pub const SCHEMA: &[FieldMeta] = &[
    field("iface_id", true, true),
    field("host_dev_name", true, false),
    field("guest_mac", false, false),
    field("rx_rate_limiter", false, true),
    field("tx_rate_limiter", false, true),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkInterface {
    pub iface_id: String,
    pub host_dev_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_rate_limiter: Option<RateLimiter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_rate_limiter: Option<RateLimiter>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkInterfaceOptions {
    pub iface_id: Option<String>,
    pub host_dev_name: Option<String>,
    pub guest_mac: Option<String>,
    pub rx_rate_limiter: Option<RateLimiter>,
    pub tx_rate_limiter: Option<RateLimiter>,
}

impl NetworkInterfaceOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.iface_id.is_some() {
            v.push("iface_id");
        }
        if self.host_dev_name.is_some() {
            v.push("host_dev_name");
        }
        if self.guest_mac.is_some() {
            v.push("guest_mac");
        }
        if self.rx_rate_limiter.is_some() {
            v.push("rx_rate_limiter");
        }
        if self.tx_rate_limiter.is_some() {
            v.push("tx_rate_limiter");
        }
        v
    }
}

impl NetworkInterface {
    pub fn create(opts: NetworkInterfaceOptions) -> Self {
        Self {
            iface_id: opts.iface_id.expect("validated by caller"),
            host_dev_name: opts.host_dev_name.expect("validated by caller"),
            guest_mac: opts.guest_mac,
            rx_rate_limiter: opts.rx_rate_limiter,
            tx_rate_limiter: opts.tx_rate_limiter,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: NetworkInterfaceOptions) {
        if let Some(v) = opts.iface_id {
            self.iface_id = v;
        }
        if let Some(v) = opts.host_dev_name {
            self.host_dev_name = v;
        }
        if opts.guest_mac.is_some() {
            self.guest_mac = opts.guest_mac;
        }
        if opts.rx_rate_limiter.is_some() {
            self.rx_rate_limiter = opts.rx_rate_limiter;
        }
        if opts.tx_rate_limiter.is_some() {
            self.tx_rate_limiter = opts.tx_rate_limiter;
        }
        self.applied = false;
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", ENDPOINT_PREFIX, self.iface_id)
    }
}

impl crate::resources::Applied for NetworkInterface {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
