//! Cleanup-on-failure stack for `start` (spec §4.4, grounded on the
//! teacher's `raii.rs::RollbackStack`). Every partial action `start` takes
//! — spawning the process, creating the API socket's lock file, writing an
//! auto-generated config file — is pushed here; if startup fails partway,
//! the stack unwinds in reverse order.

use std::path::PathBuf;

use log::{error, info, warn};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

pub enum Rollback {
    StopProcess { pid: u32 },
    RemoveFile { path: PathBuf },
}

impl Rollback {
    fn run(self) {
        match self {
            Rollback::StopProcess { pid } => stop_process(pid),
            Rollback::RemoveFile { path } => {
                info!("removing {path:?}");
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

fn stop_process(pid: u32) {
    let pid = Pid::from_raw(pid as i32);
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(_, status)) => {
            warn!("process {pid} already exited with status {status}");
            return;
        }
        Ok(WaitStatus::Signaled(_, signal, _)) => {
            warn!("process {pid} already terminated by {signal}");
            return;
        }
        Err(nix::errno::Errno::ECHILD) => {
            error!("no such process {pid}");
            return;
        }
        _ => {}
    }

    if kill(pid, Signal::SIGTERM).is_err() {
        let _ = kill(pid, Signal::SIGKILL);
    }
    match waitpid(pid, None) {
        Ok(WaitStatus::Exited(_, status)) => info!("process {pid} exited with status {status}"),
        Ok(WaitStatus::Signaled(_, signal, _)) => {
            warn!("process {pid} was killed by {signal}")
        }
        Ok(_) => {}
        Err(e) => error!("waiting for process {pid} to terminate: {e}"),
    }
}

/// Stack of rollback actions; unwound most-recent-first on `rollback_all`,
/// and on drop if never cleared by a successful `start`.
#[derive(Default)]
pub struct RollbackStack {
    actions: Vec<Rollback>,
}

impl RollbackStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Rollback) {
        self.actions.push(action);
    }

    pub fn rollback_all(&mut self) {
        while let Some(action) = self.actions.pop() {
            action.run();
        }
    }

    /// Discard the stack without running any rollback — call on successful
    /// `start`.
    pub fn disarm(mut self) {
        self.actions.clear();
    }
}

impl Drop for RollbackStack {
    fn drop(&mut self) {
        self.rollback_all();
    }
}
