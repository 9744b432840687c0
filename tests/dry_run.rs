//! In-process tests that need no Firecracker binary: dry-run previews and
//! schema rejection of illegal post-boot mutations (spec §8 scenarios A, D).

use firecrate::resources::balloon::BalloonOptions;
use firecrate::resources::boot_source::BootSourceOptions;
use firecrate::resources::drive::DriveOptions;
use firecrate::resources::machine_config::MachineConfigOptions;
use firecrate::{Error, VmSpec, VmState};

fn configured_spec() -> VmSpec {
    let mut spec = VmSpec::new();
    spec.configure_machine_config(MachineConfigOptions {
        vcpu_count: Some(1),
        mem_size_mib: Some(128),
        ..Default::default()
    })
    .unwrap();
    spec.configure_boot_source(BootSourceOptions {
        kernel_image_path: Some("/tmp/vmlinux".to_string()),
        boot_args: None,
        initrd_path: None,
    })
    .unwrap();
    spec.add_drive(DriveOptions {
        drive_id: Some("rootfs".to_string()),
        is_root_device: Some(true),
        path_on_host: Some("/tmp/rootfs.ext4".to_string()),
        ..Default::default()
    })
    .unwrap();
    spec
}

#[test]
fn dry_run_reports_every_unapplied_resource_and_sorted_argv() {
    let spec = configured_spec();
    let preview = spec.dry_run();

    assert!(preview.config.get("machine-config").is_some());
    assert!(preview.config.get("boot-source").is_some());
    assert!(preview.config.get("drives").is_some());

    let flags: Vec<&str> = preview
        .args
        .iter()
        .filter(|a| a.starts_with("--"))
        .map(|a| a.trim_start_matches("--"))
        .collect();
    let mut sorted = flags.clone();
    sorted.sort();
    assert_eq!(flags, sorted);
}

#[test]
fn adding_a_drive_after_boot_without_post_boot_fields_is_rejected() {
    let mut spec = configured_spec();
    spec.state = VmState::Running;

    let err = spec
        .add_drive(DriveOptions {
            drive_id: Some("scratch".to_string()),
            is_root_device: Some(false),
            path_on_host: Some("/tmp/scratch.ext4".to_string()),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, Error::InvalidOption { .. }));
}

#[test]
fn patching_a_post_boot_legal_field_on_an_existing_drive_is_allowed() {
    let mut spec = configured_spec();
    spec.state = VmState::Running;

    spec.add_drive(DriveOptions {
        drive_id: Some("rootfs".to_string()),
        path_on_host: Some("/tmp/rootfs-v2.ext4".to_string()),
        ..Default::default()
    })
    .expect("path_on_host is post-boot legal for an existing drive");

    assert_eq!(
        spec.drives["rootfs"].path_on_host.as_deref(),
        Some("/tmp/rootfs-v2.ext4")
    );
}

#[test]
fn balloon_post_boot_amount_change_is_legal_but_deflate_on_oom_is_not() {
    let mut spec = VmSpec::new();
    spec.configure_balloon(BalloonOptions {
        amount_mib: Some(64),
        deflate_on_oom: Some(true),
        stats_polling_interval_s: None,
    })
    .unwrap();
    spec.state = VmState::Running;

    spec.configure_balloon(BalloonOptions {
        amount_mib: Some(128),
        deflate_on_oom: None,
        stats_polling_interval_s: None,
    })
    .expect("amount_mib is post-boot legal");

    let err = spec
        .configure_balloon(BalloonOptions {
            amount_mib: None,
            deflate_on_oom: Some(false),
            stats_polling_interval_s: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOption { .. }));
}

#[test]
fn apply_with_no_rest_client_is_a_noop() {
    let mut spec = configured_spec();
    spec.apply().unwrap();
    assert!(!spec.drives["rootfs"].applied);
    assert!(!spec.boot_source.as_ref().unwrap().applied);
    assert!(spec.errors.is_empty());
}

#[test]
fn mutating_after_exited_is_rejected() {
    let mut spec = configured_spec();
    spec.state = VmState::Exited;

    let err = spec
        .configure_machine_config(MachineConfigOptions {
            vcpu_count: Some(2),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
}
