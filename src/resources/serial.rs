//! `serial` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/serial";

pub const SCHEMA: &[FieldMeta] = &[field("output_path", false, false)];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Serial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SerialOptions {
    pub output_path: Option<String>,
}

impl SerialOptions {
    pub fn present(&self) -> Vec<&'static str> {
        if self.output_path.is_some() {
            vec!["output_path"]
        } else {
            Vec::new()
        }
    }
}

impl Serial {
    pub fn create(opts: SerialOptions) -> Self {
        Self {
            output_path: opts.output_path,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: SerialOptions) {
        if opts.output_path.is_some() {
            self.output_path = opts.output_path;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for Serial {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
