use super::{HandshakeOutcome, HandshakeWaiter, LaunchDescriptor, REEXEC_FLAG, spawn};
use crate::error::{Error, Result};
use log::{debug, info, warn};

/// Stage 1 -> stage 2. Waits for the parent to finish its mapping attempts,
/// then runs ourselves again without the re-exec flag and reports that
/// run's exit code as our own.
///
/// Only a completed read releases us. EOF and stray data both count as the
/// parent being done, but a read error on the pipe aborts this stage with
/// exit code 1 instead of running the workload without knowing whether the
/// mappings were attempted.
pub fn run_second_stage(current: &LaunchDescriptor) -> Result<()> {
    let waiter = HandshakeWaiter::inherited()?;

    info!("Waiting for id mappings on fd {}", waiter.as_raw_fd());
    match waiter.await_signal()? {
        HandshakeOutcome::Closed => debug!("Handshake pipe closed by parent"),
        HandshakeOutcome::UnexpectedData(n) => {
            warn!("Read {} unexpected byte(s) from handshake pipe, continuing", n)
        }
    }

    let final_stage = current.without_flag(REEXEC_FLAG);
    debug!("Re-executing without {}: {}", REEXEC_FLAG, final_stage);
    let code = spawn(&final_stage, None)?.wait()?;
    if code != 0 {
        return Err(Error::WorkloadExit { code });
    }

    Ok(())
}
