use super::{LaunchDescriptor, launch_namespaced_child};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::idmap::{IdKind, IdMapper, Identity};
use log::{debug, error, info};
use nix::unistd::Pid;

/// Stage 0. Starts the namespaced child, attempts the uid then gid mapping
/// against it, releases it and waits for it to finish.
///
/// Mapping failures are logged and otherwise ignored: the child is released
/// either way and whatever it can't do without mappings fails on its own.
pub fn run_parent(config: &Config, current: &LaunchDescriptor) -> Result<()> {
    let first_stage = current.namespaced();
    let (child, signal) = launch_namespaced_child(&first_stage)?;
    let pid = child.pid();
    info!("Started namespaced child {}", pid);

    let mapper = IdMapper::new(config);
    for kind in [IdKind::Uid, IdKind::Gid] {
        match map_identity(&mapper, kind, pid) {
            Ok(()) => info!("Installed {} mapping for pid {}", kind, pid),
            Err(e) => error!("{} mapping error: {}", kind, e),
        }
    }

    signal.signal_done();

    let code = child.wait()?;
    debug!("Namespaced child {} exited with {}", pid, code);
    if code != 0 {
        return Err(Error::WorkloadExit { code });
    }

    Ok(())
}

fn map_identity(mapper: &IdMapper, kind: IdKind, pid: Pid) -> Result<()> {
    let identity = Identity::current(kind)?;
    debug!(
        "Mapping {} {}:{} into pid {}",
        kind, identity.id, identity.name, pid
    );
    mapper.map(kind, pid, &identity)?.run()
}
