//! Process supervisor (spec §4.4): spawns the resolved binary, polls
//! liveness, delivers signals, and reaps the child. Grounded on the
//! teacher's `hypervisor/sync.rs`, which owns a `std::process::Child`
//! alongside the socket/lock bookkeeping in the same struct.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use log::{info, trace, warn};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::error::{Error, Result};

/// A signal deliverable to the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Term,
    Kill,
}

impl SignalKind {
    fn as_nix(self) -> Signal {
        match self {
            SignalKind::Term => Signal::SIGTERM,
            SignalKind::Kill => Signal::SIGKILL,
        }
    }
}

/// Owns the spawned microVM process.
pub struct Supervisor {
    child: Child,
}

impl Supervisor {
    /// Spawn `binary` with `args`, inheriting stdio the way a foreground
    /// hypervisor process conventionally does.
    pub fn spawn(binary: &str, args: &[String]) -> Result<Self> {
        trace!("spawning {binary} {args:?}");
        let child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::StartupFailure(format!("failed to spawn {binary}: {e}")))?;
        Ok(Self { child })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Sleep the grace period then check liveness once — the heuristic
    /// startup-success signal (spec §4.4, §9 open question: an HTTP
    /// readiness retry loop is also valid and left to the caller to layer
    /// on top of `is_alive`).
    pub fn wait_for_liveness(&mut self, grace_period: Duration) -> Result<()> {
        std::thread::sleep(grace_period);
        if self.is_alive() {
            Ok(())
        } else {
            let status = self.child.try_wait().ok().flatten();
            Err(Error::StartupFailure(format!(
                "process exited during startup grace window (status: {status:?})"
            )))
        }
    }

    /// Deliver a signal without waiting for exit.
    pub fn signal(&self, kind: SignalKind) -> Result<()> {
        let pid = Pid::from_raw(self.child.id() as i32);
        kill(pid, kind.as_nix())
            .map_err(|e| Error::Transport(format!("signaling pid {pid}: {e}")))
    }

    /// SIGTERM then block until the process exits (spec §4.4: expected exit
    /// code 143 on a clean SIGTERM stop).
    pub fn stop(&mut self) -> Result<ExitStatus> {
        self.signal(SignalKind::Term)?;
        self.wait()
    }

    /// Blocking wait for exit.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .map_err(|e| Error::Transport(format!("waiting for process exit: {e}")))
    }

    /// Reap without blocking forever — used by rollback paths that already
    /// know the process is likely dead or dying.
    pub fn try_reap(&self) {
        let pid = Pid::from_raw(self.child.id() as i32);
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, status)) => info!("process {pid} exited with {status}"),
            Ok(WaitStatus::StillAlive) => {}
            Ok(other) => warn!("process {pid} in unexpected wait state: {other:?}"),
            Err(e) => warn!("waitpid({pid}) failed: {e}"),
        }
    }
}
