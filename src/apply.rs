//! Reconciliation engine (spec §4.6): walks a [`VmSpec`](crate::spec::VmSpec)
//! in a fixed order and issues the REST calls needed to bring the live
//! microVM in line with whatever has been declared but not yet applied.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::client::RestClient;
use crate::error::Result;
use crate::resources::{
    balloon::{self, Balloon},
    boot_source, cpu_config, drive, entropy, logger, machine_config, metrics,
    mmds::Mmds,
    mmds_config, network_interface, pmem, serial, vsock, Applied,
};
use crate::schema::FieldMeta;
use crate::spec::VmSpec;
use crate::state::VmState;

/// Reconcile every not-yet-applied resource against the live microVM.
///
/// A no-op if the spec has no REST client (`no_api` mode): configuration in
/// that mode went through the generated config file instead.
pub fn apply(spec: &mut VmSpec) -> Result<()> {
    let Some(client) = spec.client.as_mut() else {
        return Ok(());
    };
    let state = spec.state;

    apply_collection(&mut spec.drives, drive::SCHEMA, "drives", state, client, &mut spec.errors, |d| {
        d.endpoint()
    });
    apply_collection(
        &mut spec.network_interfaces,
        network_interface::SCHEMA,
        "network_interfaces",
        state,
        client,
        &mut spec.errors,
        |n| n.endpoint(),
    );
    apply_collection(&mut spec.pmems, pmem::SCHEMA, "pmems", state, client, &mut spec.errors, |p| {
        p.endpoint()
    });
    apply_mmds(&mut spec.mmds, client, &mut spec.errors);

    apply_balloon(&mut spec.balloon, state, client, &mut spec.errors);
    apply_singleton(
        &mut spec.boot_source,
        boot_source::ENDPOINT,
        boot_source::SCHEMA,
        "boot_source",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.cpu_config,
        cpu_config::ENDPOINT,
        cpu_config::SCHEMA,
        "cpu_config",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.entropy,
        entropy::ENDPOINT,
        entropy::SCHEMA,
        "entropy",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.logger,
        logger::ENDPOINT,
        logger::SCHEMA,
        "logger",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.machine_config,
        machine_config::ENDPOINT,
        machine_config::SCHEMA,
        "machine_config",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.metrics,
        metrics::ENDPOINT,
        metrics::SCHEMA,
        "metrics",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.mmds_config,
        mmds_config::ENDPOINT,
        mmds_config::SCHEMA,
        "mmds_config",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.serial,
        serial::ENDPOINT,
        serial::SCHEMA,
        "serial",
        state,
        client,
        &mut spec.errors,
    );
    apply_singleton(
        &mut spec.vsock,
        vsock::ENDPOINT,
        vsock::SCHEMA,
        "vsock",
        state,
        client,
        &mut spec.errors,
    );

    Ok(())
}

/// `true` once a resource must go through PATCH (partial PUT) rather than a
/// full PUT — i.e. every state but the two pre-boot ones.
fn is_patch_window(state: VmState) -> bool {
    !matches!(state, VmState::Initial | VmState::Started)
}

fn apply_singleton<T>(
    slot: &mut Option<T>,
    endpoint: &str,
    schema: &[FieldMeta],
    key: &str,
    state: VmState,
    client: &mut RestClient,
    errors: &mut Vec<(String, String)>,
) where
    T: Serialize + Applied,
{
    let Some(resource) = slot.as_mut() else {
        return;
    };
    if resource.is_applied() {
        return;
    }

    let result = if is_patch_window(state) {
        let full = serde_json::to_value(&*resource).unwrap_or(Value::Null);
        client.patch(endpoint, &filter_post_boot_fields(full, schema))
    } else {
        client.put(endpoint, &*resource)
    };

    match result {
        Ok(()) => resource.set_applied(true),
        Err(e) => errors.insert(0, (key.to_string(), e.to_string())),
    }
}

fn apply_collection<T>(
    members: &mut BTreeMap<String, T>,
    schema: &[FieldMeta],
    key: &str,
    state: VmState,
    client: &mut RestClient,
    errors: &mut Vec<(String, String)>,
    endpoint_for: impl Fn(&T) -> String,
) where
    T: Serialize + Applied,
{
    for resource in members.values_mut() {
        if resource.is_applied() {
            continue;
        }
        let endpoint = endpoint_for(resource);

        let result = if is_patch_window(state) {
            let full = serde_json::to_value(&*resource).unwrap_or(Value::Null);
            client.patch(&endpoint, &filter_post_boot_fields(full, schema))
        } else {
            client.put(&endpoint, &*resource)
        };

        match result {
            Ok(()) => resource.set_applied(true),
            Err(e) => errors.insert(0, (key.to_string(), e.to_string())),
        }
    }
}

/// `mmds` is a whole-document PUT in every state — it has no pre/post-boot
/// schema of its own (spec §4.8).
fn apply_mmds(slot: &mut Option<Mmds>, client: &mut RestClient, errors: &mut Vec<(String, String)>) {
    let Some(m) = slot.as_mut() else {
        return;
    };
    if m.is_applied() {
        return;
    }
    match client.put("/mmds", &m.data) {
        Ok(()) => m.set_applied(true),
        Err(e) => errors.insert(0, ("mmds".to_string(), e.to_string())),
    }
}

/// `balloon` splits a post-boot patch across `/balloon/statistics` and
/// `/balloon` (spec §4.6, testable property 8); a pre-boot PUT sends the
/// whole resource in one call.
fn apply_balloon(
    slot: &mut Option<Balloon>,
    state: VmState,
    client: &mut RestClient,
    errors: &mut Vec<(String, String)>,
) {
    let Some(b) = slot.as_mut() else {
        return;
    };
    if b.is_applied() {
        return;
    }

    let result = if is_patch_window(state) {
        (|| {
            if b.stats_polling_interval_s.is_some() {
                client.patch(balloon::STATS_ENDPOINT, &b.stats_patch_body())?;
            }
            client.patch(balloon::ENDPOINT, &b.amount_patch_body())
        })()
    } else {
        client.put(balloon::ENDPOINT, &*b)
    };

    match result {
        Ok(()) => b.set_applied(true),
        Err(e) => errors.insert(0, ("balloon".to_string(), e.to_string())),
    }
}

/// Keep only the fields a schema marks `post_boot`, for building a PATCH
/// body out of a fully-serialized resource.
fn filter_post_boot_fields(full: Value, schema: &[FieldMeta]) -> Value {
    let Value::Object(map) = full else {
        return Value::Object(Default::default());
    };
    let mut out = serde_json::Map::new();
    for (k, v) in map {
        if schema.iter().any(|f| f.name == k && f.post_boot) {
            out.insert(k, v);
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field;

    const SCHEMA: &[FieldMeta] = &[
        field("amount_mib", true, true),
        field("deflate_on_oom", true, false),
        field("stats_polling_interval_s", false, true),
    ];

    #[test]
    fn filter_post_boot_fields_drops_pre_boot_only_keys() {
        let full = serde_json::json!({
            "amount_mib": 64,
            "deflate_on_oom": true,
            "stats_polling_interval_s": 5,
        });
        let filtered = filter_post_boot_fields(full, SCHEMA);
        assert_eq!(
            filtered,
            serde_json::json!({ "amount_mib": 64, "stats_polling_interval_s": 5 })
        );
    }

    #[test]
    fn filter_post_boot_fields_on_non_object_yields_empty_object() {
        assert_eq!(filter_post_boot_fields(Value::Null, SCHEMA), serde_json::json!({}));
    }
}
