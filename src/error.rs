use crate::idmap::{IdKind, Identity};
use std::os::fd::RawFd;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open id file {}: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid {} map found for <{}:{}>", identity.kind, identity.id, identity.name)]
    NoMappingFound { identity: Identity },

    #[error("unable to resolve {kind} mapping: {source}")]
    MappingResolution {
        kind: IdKind,
        #[source]
        source: Box<Error>,
    },

    #[error("{helper} failed: {reason}")]
    ExternalMappingFailure { helper: String, reason: String },

    #[error("unable to look up {kind} identity: {reason}")]
    IdentityLookup { kind: IdKind, reason: String },

    #[error("unable to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for child: {0}")]
    ChildWait(#[source] std::io::Error),

    #[error("failed to create handshake pipe: {0}")]
    PipeCreate(#[source] nix::Error),

    #[error("handshake pipe not found at fd {fd}: {reason}")]
    HandshakeUnavailable { fd: RawFd, reason: String },

    #[error("failed to read from handshake pipe: {0}")]
    PipeRead(#[source] std::io::Error),

    #[error("workload exited with code {code}")]
    WorkloadExit { code: i32 },
}
