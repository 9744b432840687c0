//! `balloon` resource (spec §4.1). Post-boot PATCH is split across two
//! endpoints (`/balloon/statistics` then `/balloon`) — that split is
//! implemented by the apply engine ([`crate::apply`]), not here.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/balloon";
pub const STATS_ENDPOINT: &str = "/balloon/statistics";

pub const SCHEMA: &[FieldMeta] = &[
    field("amount_mib", true, true),
    field("deflate_on_oom", true, false),
    field("stats_polling_interval_s", false, true),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balloon {
    pub amount_mib: i64,
    pub deflate_on_oom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_polling_interval_s: Option<i64>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BalloonOptions {
    pub amount_mib: Option<i64>,
    pub deflate_on_oom: Option<bool>,
    pub stats_polling_interval_s: Option<i64>,
}

impl BalloonOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.amount_mib.is_some() {
            v.push("amount_mib");
        }
        if self.deflate_on_oom.is_some() {
            v.push("deflate_on_oom");
        }
        if self.stats_polling_interval_s.is_some() {
            v.push("stats_polling_interval_s");
        }
        v
    }
}

impl Balloon {
    pub fn create(opts: BalloonOptions) -> Self {
        Self {
            amount_mib: opts.amount_mib.expect("validated by caller"),
            deflate_on_oom: opts.deflate_on_oom.expect("validated by caller"),
            stats_polling_interval_s: opts.stats_polling_interval_s,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: BalloonOptions) {
        if let Some(v) = opts.amount_mib {
            self.amount_mib = v;
        }
        if let Some(v) = opts.deflate_on_oom {
            self.deflate_on_oom = v;
        }
        if let Some(v) = opts.stats_polling_interval_s {
            self.stats_polling_interval_s = Some(v);
        }
        self.applied = false;
    }

    /// Body for the `/balloon/statistics` PATCH: just the interval.
    pub fn stats_patch_body(&self) -> serde_json::Value {
        serde_json::json!({ "stats_polling_interval_s": self.stats_polling_interval_s })
    }

    /// Body for the `/balloon` PATCH: just the amount.
    pub fn amount_patch_body(&self) -> serde_json::Value {
        serde_json::json!({ "amount_mib": self.amount_mib })
    }
}

impl crate::resources::Applied for Balloon {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
