//! `cpu_config` resource (spec §4.1): opaque modifier lists, pre-boot only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/cpu-config";

pub const SCHEMA: &[FieldMeta] = &[
    field("cpuid_modifiers", false, false),
    field("msr_modifiers", false, false),
    field("reg_modifiers", false, false),
    field("vcpu_features", false, false),
    field("kvm_capabilities", false, false),
];

/// Opaque modifier lists — the SDK does not interpret their structure, it
/// only carries them through to the REST payload verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpuid_modifiers: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msr_modifiers: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_modifiers: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpu_features: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kvm_capabilities: Option<Vec<Value>>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CpuConfigOptions {
    pub cpuid_modifiers: Option<Vec<Value>>,
    pub msr_modifiers: Option<Vec<Value>>,
    pub reg_modifiers: Option<Vec<Value>>,
    pub vcpu_features: Option<Vec<Value>>,
    pub kvm_capabilities: Option<Vec<Value>>,
}

impl CpuConfigOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.cpuid_modifiers.is_some() {
            v.push("cpuid_modifiers");
        }
        if self.msr_modifiers.is_some() {
            v.push("msr_modifiers");
        }
        if self.reg_modifiers.is_some() {
            v.push("reg_modifiers");
        }
        if self.vcpu_features.is_some() {
            v.push("vcpu_features");
        }
        if self.kvm_capabilities.is_some() {
            v.push("kvm_capabilities");
        }
        v
    }
}

impl CpuConfig {
    pub fn create(opts: CpuConfigOptions) -> Self {
        Self {
            cpuid_modifiers: opts.cpuid_modifiers,
            msr_modifiers: opts.msr_modifiers,
            reg_modifiers: opts.reg_modifiers,
            vcpu_features: opts.vcpu_features,
            kvm_capabilities: opts.kvm_capabilities,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: CpuConfigOptions) {
        if opts.cpuid_modifiers.is_some() {
            self.cpuid_modifiers = opts.cpuid_modifiers;
        }
        if opts.msr_modifiers.is_some() {
            self.msr_modifiers = opts.msr_modifiers;
        }
        if opts.reg_modifiers.is_some() {
            self.reg_modifiers = opts.reg_modifiers;
        }
        if opts.vcpu_features.is_some() {
            self.vcpu_features = opts.vcpu_features;
        }
        if opts.kvm_capabilities.is_some() {
            self.kvm_capabilities = opts.kvm_capabilities;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for CpuConfig {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
