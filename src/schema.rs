//! Generic option-bag validator shared by every resource model (spec §4.1,
//! design note "Option schemas").
//!
//! Each resource exposes a small static table of [`FieldMeta`] describing,
//! per field, whether it is required at construction time and whether it
//! is legal in a post-boot PATCH. The caller-facing `*Options` struct for a
//! resource holds every field as `Option<T>`; [`validate_patch`] walks the
//! table against the set of fields the caller actually supplied and
//! produces the same `InvalidOption` shape for every resource.

use crate::error::{Error, Result};

/// Declares one field of a resource's schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    /// Field name, used verbatim in error messages.
    pub name: &'static str,
    /// Must be present the first time the resource is constructed.
    pub required_on_create: bool,
    /// May be set in a post-boot PATCH.
    pub post_boot: bool,
}

pub const fn field(name: &'static str, required_on_create: bool, post_boot: bool) -> FieldMeta {
    FieldMeta {
        name,
        required_on_create,
        post_boot,
    }
}

/// Validate a patch against a resource's schema.
///
/// * `fields` — the resource's full schema.
/// * `present` — names of fields the caller actually supplied in this call.
/// * `creating` — true if this is the first `configure`/`add` for the
///   resource (no prior value exists).
/// * `post_boot_window` — true if the VM is in a state (`running`,
///   `paused`, `shutdown`) where only post-boot fields are legal.
pub fn validate_patch(
    fields: &[FieldMeta],
    present: &[&str],
    creating: bool,
    post_boot_window: bool,
) -> Result<()> {
    if creating {
        for f in fields {
            if f.required_on_create && !present.contains(&f.name) {
                return Err(Error::invalid_option(f.name, "required field missing"));
            }
        }
    }

    if post_boot_window {
        if creating {
            // A resource with no prior value cannot be created post-boot at
            // all for pre-boot-only resources (post_boot schema empty).
            // Checked before the per-field loop so this is reported
            // distinctly from "field not allowed post-boot".
            let any_post_boot = fields.iter().any(|f| f.post_boot);
            if !any_post_boot {
                return Err(Error::invalid_option(
                    "*",
                    "cannot add a new resource after boot",
                ));
            }
        }
        for name in present {
            match fields.iter().find(|f| &f.name == name) {
                Some(f) if f.post_boot => {}
                Some(_) => {
                    return Err(Error::invalid_option(
                        *name,
                        "field is not part of the post-boot schema",
                    ))
                }
                None => return Err(Error::invalid_option(*name, "unrecognized field")),
            }
        }
    } else {
        // Pre-boot window: every declared field is fair game, but reject
        // names the schema doesn't recognize at all.
        for name in present {
            if !fields.iter().any(|f| &f.name == name) {
                return Err(Error::invalid_option(*name, "unrecognized field"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldMeta] = &[
        field("amount_mib", true, true),
        field("deflate_on_oom", true, false),
        field("stats_polling_interval_s", false, true),
    ];

    #[test]
    fn missing_required_on_create_fails() {
        let err = validate_patch(FIELDS, &["amount_mib"], true, false).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
    }

    #[test]
    fn post_boot_rejects_pre_boot_only_field() {
        let err =
            validate_patch(FIELDS, &["deflate_on_oom"], false, true).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { field, .. } if field == "deflate_on_oom"));
    }

    #[test]
    fn post_boot_allows_permitted_fields() {
        validate_patch(FIELDS, &["amount_mib", "stats_polling_interval_s"], false, true).unwrap();
    }

    #[test]
    fn pre_boot_rejects_unknown_field() {
        let err = validate_patch(FIELDS, &["bogus"], false, false).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { field, .. } if field == "bogus"));
    }

    #[test]
    fn adding_member_post_boot_for_preboot_only_resource_is_distinct() {
        const PRE_ONLY: &[FieldMeta] = &[field("kernel_image_path", true, false)];
        let err = validate_patch(PRE_ONLY, &["kernel_image_path"], true, true).unwrap_err();
        match err {
            Error::InvalidOption { reason, .. } => assert!(reason.contains("cannot add")),
            _ => panic!("wrong error kind"),
        }
    }
}
