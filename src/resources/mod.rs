//! Per-resource typed configs (spec §4.1).
//!
//! Every resource follows the same shape: a `*Value` holding the
//! declarative fields plus an `applied` flag, a `*Options` patch bag
//! (`Option<T>` per field) used by `configure`/`add`, and a `SCHEMA` table
//! consumed by [`crate::schema::validate_patch`].

pub mod balloon;
pub mod boot_source;
pub mod cpu_config;
pub mod drive;
pub mod entropy;
pub mod logger;
pub mod machine_config;
pub mod metrics;
pub mod mmds;
pub mod mmds_config;
pub mod network_interface;
pub mod pmem;
pub mod rate_limiter;
pub mod serial;
pub mod vsock;

/// Uniform access to a resource value's `applied` flag, so the apply
/// engine (spec §4.6) can drive every resource through the same
/// put-or-patch dispatch without per-resource-type code.
pub trait Applied {
    fn is_applied(&self) -> bool;
    fn set_applied(&mut self, applied: bool);
}
