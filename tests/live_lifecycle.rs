//! End-to-end tests against a real `firecracker` binary (spec §8 scenarios
//! B, C, E, F). Skipped unless `FIRECRACKER_PATH` names a usable binary —
//! mirrors the teacher's own device-gated tests (`basic.rs`'s `FRCK_BIN`
//! env var convention).

use std::path::PathBuf;

use firecrate::resources::balloon::BalloonOptions;
use firecrate::resources::boot_source::BootSourceOptions;
use firecrate::resources::drive::DriveOptions;
use firecrate::resources::machine_config::MachineConfigOptions;
use firecrate::VmSpec;

fn firecracker_path() -> Option<PathBuf> {
    std::env::var_os("FIRECRACKER_PATH").map(PathBuf::from).filter(|p| p.exists())
}

fn base_spec(binary: PathBuf) -> VmSpec {
    let mut spec = VmSpec::new();
    spec.binary_path = Some(binary);
    spec.configure_machine_config(MachineConfigOptions {
        vcpu_count: Some(1),
        mem_size_mib: Some(128),
        ..Default::default()
    })
    .unwrap();
    spec.configure_boot_source(BootSourceOptions {
        kernel_image_path: Some(std::env::var("FIRECRACKER_KERNEL").unwrap_or_else(|_| "/tmp/vmlinux".to_string())),
        boot_args: None,
        initrd_path: None,
    })
    .unwrap();
    spec
}

fn rootfs_path() -> Option<String> {
    Some(std::env::var("FIRECRACKER_ROOTFS").unwrap_or_else(|_| "/tmp/rootfs.ext4".to_string()))
}

#[test]
fn pre_boot_drive_add_then_apply_sends_single_put() {
    let Some(binary) = firecracker_path() else {
        eprintln!("skipping: FIRECRACKER_PATH not set to an existing binary");
        return;
    };
    let mut spec = base_spec(binary);
    spec.add_drive(DriveOptions {
        drive_id: Some("rootfs".to_string()),
        is_root_device: Some(true),
        path_on_host: rootfs_path(),
        ..Default::default()
    })
    .unwrap();

    spec.start().expect("start");
    assert!(spec.drives["rootfs"].applied);
    assert!(spec.errors.is_empty());

    spec.stop().expect("stop");
    assert!(!spec.api_socket_path.as_ref().unwrap().exists());
}

#[test]
fn balloon_post_boot_patch_hits_statistics_then_amount() {
    let Some(binary) = firecracker_path() else {
        eprintln!("skipping: FIRECRACKER_PATH not set to an existing binary");
        return;
    };
    let mut spec = base_spec(binary);
    spec.configure_balloon(BalloonOptions {
        amount_mib: Some(64),
        deflate_on_oom: Some(true),
        stats_polling_interval_s: None,
    })
    .unwrap();
    spec.start().expect("start");
    assert!(spec.balloon.as_ref().unwrap().applied);

    spec.configure_balloon(BalloonOptions {
        amount_mib: Some(96),
        deflate_on_oom: None,
        stats_polling_interval_s: Some(2),
    })
    .unwrap();
    spec.state = firecrate::VmState::Running;
    spec.apply().expect("apply balloon patch");
    assert!(spec.balloon.as_ref().unwrap().applied);

    spec.stop().expect("stop");
}

#[test]
fn stop_removes_vsock_socket_and_transitions_to_exited() {
    use firecrate::resources::vsock::VsockOptions;

    let Some(binary) = firecracker_path() else {
        eprintln!("skipping: FIRECRACKER_PATH not set to an existing binary");
        return;
    };
    let mut spec = base_spec(binary);
    let uds_path = std::env::temp_dir().join(format!("{}.vsock", spec.id));
    spec.configure_vsock(VsockOptions {
        guest_cid: Some(3),
        uds_path: Some(uds_path.to_string_lossy().into_owned()),
        vsock_id: None,
    })
    .unwrap();

    spec.start().expect("start");
    spec.stop().expect("stop");

    assert_eq!(spec.state, firecrate::VmState::Exited);
    assert!(!uds_path.exists());
}

#[test]
fn one_failing_drive_does_not_block_the_other_and_errors_accumulate() {
    let Some(binary) = firecracker_path() else {
        eprintln!("skipping: FIRECRACKER_PATH not set to an existing binary");
        return;
    };
    let mut spec = base_spec(binary);
    spec.add_drive(DriveOptions {
        drive_id: Some("rootfs".to_string()),
        is_root_device: Some(true),
        path_on_host: rootfs_path(),
        ..Default::default()
    })
    .unwrap();
    spec.add_drive(DriveOptions {
        drive_id: Some("scratch".to_string()),
        is_root_device: Some(false),
        path_on_host: Some("/nonexistent/path/that/firecracker/will/reject.ext4".to_string()),
        ..Default::default()
    })
    .unwrap();

    spec.start().expect("start");

    assert!(spec.drives["rootfs"].applied);
    assert!(!spec.drives["scratch"].applied);
    assert_eq!(spec.errors.len(), 1);
    assert_eq!(spec.errors[0].0, "drives");

    spec.stop().expect("stop");
}
