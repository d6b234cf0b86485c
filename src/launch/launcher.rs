use super::{HandshakeSignal, HandshakeWaiter, LaunchDescriptor, handshake_pipe};
use crate::error::{Error, Result};
use log::trace;
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::sched::unshare;
use nix::unistd::{Pid, dup2};
use std::os::fd::RawFd;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, ExitStatus};

/// A started stage that must be waited on before we exit.
#[derive(Debug)]
pub struct LaunchedChild {
    child: Child,
}

impl LaunchedChild {
    pub fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }

    /// Reaps the child and returns its exit code.
    pub fn wait(mut self) -> Result<i32> {
        let status = self.child.wait().map_err(Error::ChildWait)?;
        trace!("Child {} finished: {}", self.child.id(), status);
        Ok(exit_code(status))
    }
}

/// Stage 0 -> stage 1. Returns as soon as the child has been exec'd; the
/// caller owns the write end and decides when the child may proceed.
pub fn launch_namespaced_child(
    descriptor: &LaunchDescriptor,
) -> Result<(LaunchedChild, HandshakeSignal)> {
    let (waiter, signal) = handshake_pipe()?;
    let child = spawn(descriptor, Some(&waiter))?;
    // Only the child reads, so our copy of the read end goes now
    drop(waiter);
    Ok((child, signal))
}

/// Starts `descriptor` with inherited standard streams, unsharing its
/// namespaces and installing `waiter` at its handshake descriptor.
pub fn spawn(
    descriptor: &LaunchDescriptor,
    waiter: Option<&HandshakeWaiter>,
) -> Result<LaunchedChild> {
    let mut command = descriptor.command();
    let namespaces = descriptor.namespaces;
    let inherit = match (waiter, descriptor.handshake_fd) {
        (Some(waiter), Some(target)) => Some((waiter.as_raw_fd(), target)),
        _ => None,
    };

    // SAFETY: the hook only makes raw syscalls and doesn't allocate
    unsafe {
        command.pre_exec(move || {
            if let Some((source, target)) = inherit {
                install_fd(source, target)?;
            }
            if !namespaces.is_empty() {
                unshare(namespaces)?;
            }
            Ok(())
        });
    }

    trace!("Spawning {}", descriptor);
    let child = command.spawn().map_err(|source| Error::Spawn {
        program: descriptor.program.clone(),
        source,
    })?;
    Ok(LaunchedChild { child })
}

/* Runs between fork and exec. dup2 onto the same number is a no-op that keeps
 * FD_CLOEXEC, so that case clears the flag instead. */
fn install_fd(source: RawFd, target: RawFd) -> nix::Result<()> {
    if source == target {
        let flags = FdFlag::from_bits_truncate(fcntl(target, FcntlArg::F_GETFD)?);
        fcntl(target, FcntlArg::F_SETFD(flags - FdFlag::FD_CLOEXEC))?;
    } else {
        dup2(source, target)?;
    }
    Ok(())
}

/// Exit code as a shell would report it, `128 + signal` for killed children.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}
