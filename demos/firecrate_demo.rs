//! Minimal end-to-end demo: configure a microVM spec, launch it, flush its
//! metrics once, then stop it. Grounded on the teacher's `bin/jailing_machine.rs`
//! demo shape, stripped of the jailer/network setup since this path only
//! exercises the plain (unjailed) launch.

use firecrate::resources::boot_source::BootSourceOptions;
use firecrate::resources::drive::DriveOptions;
use firecrate::resources::machine_config::MachineConfigOptions;
use firecrate::VmSpec;

fn main() {
    env_logger::init();

    let kernel_image_path = std::env::args().nth(1).unwrap_or_else(|| "/tmp/rustcracker/res/vmlinux".into());
    let rootfs_path = std::env::args().nth(2).unwrap_or_else(|| "/tmp/rustcracker/res/rootfs.ext4".into());

    let mut spec = VmSpec::new();

    spec.configure_machine_config(MachineConfigOptions {
        vcpu_count: Some(2),
        mem_size_mib: Some(256),
        ..Default::default()
    })
    .expect("configure machine_config");

    spec.configure_boot_source(BootSourceOptions {
        kernel_image_path: Some(kernel_image_path),
        boot_args: Some("console=ttyS0 reboot=k panic=1 pci=off".to_string()),
        initrd_path: None,
    })
    .expect("configure boot_source");

    spec.add_drive(DriveOptions {
        drive_id: Some("rootfs".to_string()),
        is_root_device: Some(true),
        path_on_host: Some(rootfs_path),
        ..Default::default()
    })
    .expect("add rootfs drive");

    log::info!("dry run: {:#?}", spec.dry_run());

    match spec.start() {
        Ok(()) => log::info!("vm {} started in state {:?}", spec.id, spec.state),
        Err(e) => {
            log::error!("failed to start vm: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = spec.flush_metrics() {
        log::warn!("flush_metrics failed: {e}");
    }

    if let Err(e) = spec.stop() {
        log::error!("failed to stop vm: {e}");
        std::process::exit(1);
    }
    log::info!("vm {} stopped, {} errors accumulated", spec.id, spec.errors.len());
}
