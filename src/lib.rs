//! `firecrate`: a host-side SDK for building, launching, and driving
//! Firecracker microVMs through their lifecycle.
//!
//! [`spec::VmSpec`] is the entry point: build one up with `configure_*`/
//! `add_*`/`metadata_*`, then drive it with `start`, `apply`, `pause`,
//! `resume`, `snapshot_save`/`snapshot_load`, and `stop`.

pub mod apply;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod jailer;
pub mod resources;
pub mod rollback;
pub mod schema;
pub mod snapshot;
pub mod spec;
pub mod state;
pub mod supervisor;

pub use error::{Error, Result};
pub use spec::VmSpec;
pub use state::VmState;
