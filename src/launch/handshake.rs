//! One-shot "mappings are done" signal between the parent and the stage 1
//! child.
//!
//! Nothing is ever written on the pipe. The parent closes its end once both
//! mapping attempts have finished and the child's blocking read returning
//! end-of-file is the signal. The read end crosses the exec boundary at
//! [`HANDSHAKE_FD`], the first descriptor after the standard streams.

use crate::error::{Error, Result};
use log::trace;
use nix::fcntl::OFlag;
use nix::sys::stat::{SFlag, fstat};
use nix::unistd::pipe2;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

pub const HANDSHAKE_FD: RawFd = 3;

/// Parent side. Dropping it (or calling `signal_done`) closes the write end.
#[derive(Debug)]
pub struct HandshakeSignal {
    write_end: OwnedFd,
}

/// Child side, owning the read end.
#[derive(Debug)]
pub struct HandshakeWaiter {
    read_end: File,
}

/// How the wait completed. Either way the parent is finished with mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Closed,
    UnexpectedData(usize),
}

/// Both ends are close-on-exec. The launcher re-installs the read end at
/// `HANDSHAKE_FD` in the child only, so the child never holds the write end.
pub fn handshake_pipe() -> Result<(HandshakeWaiter, HandshakeSignal)> {
    let (read_end, write_end) =
        pipe2(OFlag::O_CLOEXEC).map_err(Error::PipeCreate)?;
    Ok((
        HandshakeWaiter {
            read_end: File::from(read_end),
        },
        HandshakeSignal { write_end },
    ))
}

impl HandshakeSignal {
    pub fn signal_done(self) {
        trace!("Closing handshake pipe fd {}", self.write_end.as_raw_fd());
        drop(self.write_end);
    }
}

impl HandshakeWaiter {
    /// Takes ownership of the descriptor our parent left at `HANDSHAKE_FD`.
    pub fn inherited() -> Result<HandshakeWaiter> {
        let stat = fstat(HANDSHAKE_FD).map_err(|e| Error::HandshakeUnavailable {
            fd: HANDSHAKE_FD,
            reason: e.to_string(),
        })?;
        if SFlag::from_bits_truncate(stat.st_mode) & SFlag::S_IFMT != SFlag::S_IFIFO {
            return Err(Error::HandshakeUnavailable {
                fd: HANDSHAKE_FD,
                reason: "descriptor is not a pipe".to_string(),
            });
        }

        // SAFETY: fd 3 is open and a FIFO, nothing else in this process owns it
        let read_end = unsafe { File::from_raw_fd(HANDSHAKE_FD) };
        Ok(HandshakeWaiter { read_end })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.read_end.as_raw_fd()
    }

    /// Blocks until the write end is closed. Consumes the waiter so the read
    /// end is closed as soon as this returns.
    pub fn await_signal(mut self) -> Result<HandshakeOutcome> {
        let mut buf = [0u8; 1];
        loop {
            match self.read_end.read(&mut buf) {
                Ok(0) => return Ok(HandshakeOutcome::Closed),
                Ok(n) => return Ok(HandshakeOutcome::UnexpectedData(n)),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::PipeRead(e)),
            }
        }
    }
}
