//! `logger` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/logger";

pub const SCHEMA: &[FieldMeta] = &[
    field("level", false, false),
    field("log_path", false, false),
    field("show_level", false, false),
    field("show_log_origin", false, false),
    field("module", false, false),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_level: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_log_origin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LoggerOptions {
    pub level: Option<LogLevel>,
    pub log_path: Option<String>,
    pub show_level: Option<bool>,
    pub show_log_origin: Option<bool>,
    pub module: Option<String>,
}

impl LoggerOptions {
    pub fn present(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.level.is_some() {
            v.push("level");
        }
        if self.log_path.is_some() {
            v.push("log_path");
        }
        if self.show_level.is_some() {
            v.push("show_level");
        }
        if self.show_log_origin.is_some() {
            v.push("show_log_origin");
        }
        if self.module.is_some() {
            v.push("module");
        }
        v
    }
}

impl Logger {
    pub fn create(opts: LoggerOptions) -> Self {
        Self {
            level: opts.level,
            log_path: opts.log_path,
            show_level: opts.show_level,
            show_log_origin: opts.show_log_origin,
            module: opts.module,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: LoggerOptions) {
        if opts.level.is_some() {
            self.level = opts.level;
        }
        if opts.log_path.is_some() {
            self.log_path = opts.log_path;
        }
        if opts.show_level.is_some() {
            self.show_level = opts.show_level;
        }
        if opts.show_log_origin.is_some() {
            self.show_log_origin = opts.show_log_origin;
        }
        if opts.module.is_some() {
            self.module = opts.module;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for Logger {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
