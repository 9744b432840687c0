//! `boot_source` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/boot-source";

pub const SCHEMA: &[FieldMeta] = &[
    field("kernel_image_path", true, false),
    field("boot_args", false, false),
    field("initrd_path", false, false),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BootSource {
    pub kernel_image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initrd_path: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BootSourceOptions {
    pub kernel_image_path: Option<String>,
    pub boot_args: Option<String>,
    pub initrd_path: Option<String>,
}

impl BootSourceOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.kernel_image_path.is_some() {
            v.push("kernel_image_path");
        }
        if self.boot_args.is_some() {
            v.push("boot_args");
        }
        if self.initrd_path.is_some() {
            v.push("initrd_path");
        }
        v
    }
}

impl BootSource {
    /// Caller must have validated the patch against [`SCHEMA`] first.
    pub fn create(opts: BootSourceOptions) -> Self {
        Self {
            kernel_image_path: opts.kernel_image_path.expect("validated by caller"),
            boot_args: opts.boot_args,
            initrd_path: opts.initrd_path,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: BootSourceOptions) {
        if let Some(v) = opts.kernel_image_path {
            self.kernel_image_path = v;
        }
        if let Some(v) = opts.boot_args {
            self.boot_args = Some(v);
        }
        if let Some(v) = opts.initrd_path {
            self.initrd_path = Some(v);
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for BootSource {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
