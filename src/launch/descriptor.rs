use super::HANDSHAKE_FD;
use nix::sched::CloneFlags;
use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display};
use std::os::fd::RawFd;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

/// Command line token asking for the namespaced launch. Present on stage 0
/// and stage 1, stripped for stage 2.
pub const REEXEC_FLAG: &str = "--unshare";

/// Everything needed to start one stage of ourselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDescriptor {
    pub program: PathBuf,
    pub arg0: OsString,
    pub args: Vec<OsString>,
    /// Namespaces unshared in the child between fork and exec
    pub namespaces: CloneFlags,
    /// Where the child expects the handshake read end, if anywhere
    pub handshake_fd: Option<RawFd>,
}

impl LaunchDescriptor {
    /// The invocation this process was started with.
    pub fn current() -> LaunchDescriptor {
        let mut argv = std::env::args_os();
        let arg0 = argv.next().unwrap_or_else(|| OsString::from("disg"));
        // Falls back to the kernel's view of our binary if it was moved or deleted
        let program = std::env::current_exe()
            .unwrap_or_else(|_| PathBuf::from("/proc/self/exe"));
        LaunchDescriptor::new(program, arg0, argv.collect())
    }

    pub fn new(program: PathBuf, arg0: OsString, args: Vec<OsString>) -> Self {
        LaunchDescriptor {
            program,
            arg0,
            args,
            namespaces: CloneFlags::empty(),
            handshake_fd: None,
        }
    }

    /// Stage 1: same arguments, new user and mount namespaces, handshake pipe
    /// inherited at `HANDSHAKE_FD`.
    pub fn namespaced(&self) -> LaunchDescriptor {
        LaunchDescriptor {
            namespaces: CloneFlags::CLONE_NEWUSER | CloneFlags::CLONE_NEWNS,
            handshake_fd: Some(HANDSHAKE_FD),
            ..self.clone()
        }
    }

    /// Stage 2: plain re-run with the first `flag` token removed.
    pub fn without_flag(&self, flag: &str) -> LaunchDescriptor {
        LaunchDescriptor {
            args: strip_first(&self.args, flag),
            namespaces: CloneFlags::empty(),
            handshake_fd: None,
            ..self.clone()
        }
    }

    /// Base command with inherited standard streams. Namespace and descriptor
    /// setup is added by the launcher.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.arg0(&self.arg0).args(&self.args);
        command
    }
}

impl Display for LaunchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/* Only the first occurrence goes; a repeated flag survives into the next stage */
pub fn strip_first(args: &[OsString], flag: &str) -> Vec<OsString> {
    let mut stripped = args.to_vec();
    if let Some(index) = stripped.iter().position(|arg| arg == OsStr::new(flag)) {
        stripped.remove(index);
    }
    stripped
}
