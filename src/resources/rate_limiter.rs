//! Rate limiter and token bucket (spec §4.1 "Rate limiter").

use serde::{Deserialize, Serialize};

/// One token bucket: `{size, refill_time, one_time_burst}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBucket {
    /// Total number of tokens this bucket can hold.
    pub size: i64,
    /// Time in milliseconds to refill the bucket completely.
    pub refill_time: i64,
    /// Number of free initial tokens, counted independently of `size`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_burst: Option<i64>,
}

/// A pair of optional token buckets governing a device's I/O.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimiter {
    pub bandwidth: Option<TokenBucket>,
    pub ops: Option<TokenBucket>,
}
