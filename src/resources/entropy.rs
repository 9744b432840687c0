//! `entropy` resource (spec §4.1): pre-boot only.

use serde::{Deserialize, Serialize};

use super::rate_limiter::RateLimiter;
use crate::schema::{field, FieldMeta};

pub const ENDPOINT: &str = "/entropy";

pub const SCHEMA: &[FieldMeta] = &[field("rate_limiter", false, false)];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entropy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limiter: Option<RateLimiter>,
    #[serde(skip)]
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EntropyOptions {
    pub rate_limiter: Option<RateLimiter>,
}

impl EntropyOptions {
    pub fn present(&self) -> Vec<&'static str> {
        if self.rate_limiter.is_some() {
            vec!["rate_limiter"]
        } else {
            Vec::new()
        }
    }
}

impl Entropy {
    pub fn create(opts: EntropyOptions) -> Self {
        Self {
            rate_limiter: opts.rate_limiter,
            applied: false,
        }
    }

    pub fn merge(&mut self, opts: EntropyOptions) {
        if opts.rate_limiter.is_some() {
            self.rate_limiter = opts.rate_limiter;
        }
        self.applied = false;
    }
}

impl crate::resources::Applied for Entropy {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}
