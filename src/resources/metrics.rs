//! `metrics` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/metrics";

pub const SCHEMA: &[FieldMeta] = &[field("metrics_path", true, false)];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metrics {
    pub metrics_path: String,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsOptions {
    pub metrics_path: Option<String>,
}

impl MetricsOptions {
    pub fn present(&self) -> Vec<&'static str> {
        if self.metrics_path.is_some() {
            vec!["metrics_path"]
        } else {
            Vec::new()
        }
    }
}

impl Metrics {
    pub fn create(opts: MetricsOptions) -> Self {
        Self {
            metrics_path: opts.metrics_path.expect("validated by caller"),
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: MetricsOptions) {
        if let Some(v) = opts.metrics_path {
            self.metrics_path = v;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for Metrics {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
