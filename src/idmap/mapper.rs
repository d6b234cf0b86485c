use super::{IdKind, Identity, SubordinateRange, resolve_subordinate_range};
use crate::config::Config;
use crate::error::{Error, Result};
use log::{debug, error, info};
use nix::unistd::Pid;
use std::path::Path;
use std::process::{Command, Stdio};

/// Container id that maps back onto the invoker's real id.
pub const CONTAINER_ROOT_ID: u32 = 0;
/// First container id backed by the subordinate range.
pub const CONTAINER_RANGE_START: u32 = 1;

/// Everything needed for one `new{u,g}idmap` invocation:
/// `0 -> host_id (1)` and `1 -> range.start (range.count)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSpec {
    pub kind: IdKind,
    pub target_pid: Pid,
    pub host_id: String,
    pub range: SubordinateRange,
}

impl MappingSpec {
    pub fn args(&self) -> Vec<String> {
        vec![
            self.target_pid.to_string(),
            CONTAINER_ROOT_ID.to_string(),
            self.host_id.clone(),
            "1".to_string(),
            CONTAINER_RANGE_START.to_string(),
            self.range.start.clone(),
            self.range.count.clone(),
        ]
    }
}

/// A resolved mapping waiting to be handed to the external helper. Nothing
/// is executed until `run` is called.
#[derive(Debug)]
pub struct MappingCommand {
    pub spec: MappingSpec,
    pub helper: String,
}

impl MappingCommand {
    /// Name used as the log target for the helper's output
    pub fn helper_name(&self) -> String {
        Path::new(&self.helper)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.helper.clone())
    }

    pub fn run(self) -> Result<()> {
        let helper_name = self.helper_name();
        let args = self.spec.args();
        debug!(
            "Running {} {} for the {} mapping",
            self.helper,
            args.join(" "),
            self.spec.kind
        );

        let output = Command::new(&self.helper)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::ExternalMappingFailure {
                helper: helper_name.clone(),
                reason: format!("unable to execute {}: {}", self.helper, e),
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!(target: helper_name.as_str(), "{}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            error!(target: helper_name.as_str(), "{}", line);
        }

        if !output.status.success() {
            return Err(Error::ExternalMappingFailure {
                helper: helper_name,
                reason: format!(
                    "{} for range {}:{} on pid {}",
                    output.status,
                    self.spec.range.start,
                    self.spec.range.count,
                    self.spec.target_pid
                ),
            });
        }

        Ok(())
    }
}

pub struct IdMapper<'a> {
    config: &'a Config,
}

impl<'a> IdMapper<'a> {
    pub fn new(config: &'a Config) -> Self {
        IdMapper { config }
    }

    pub fn map(
        &self,
        kind: IdKind,
        target_pid: Pid,
        host: &Identity,
    ) -> Result<MappingCommand> {
        let range = resolve_subordinate_range(self.config.subid_file(kind), host)
            .map_err(|e| Error::MappingResolution {
                kind,
                source: Box::new(e),
            })?;

        Ok(MappingCommand {
            spec: MappingSpec {
                kind,
                target_pid,
                host_id: host.id.clone(),
                range,
            },
            helper: self.config.map_helper(kind).to_string(),
        })
    }
}
