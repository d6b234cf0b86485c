use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Where this process sits in the three stage launch. Computed once at
/// startup from the `--unshare` flag and user namespace membership, then
/// passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// No namespacing requested, running on the host
    Unlaunched,
    /// Stage 0: asked to unshare but not yet namespaced
    AwaitingNamespaceCreation,
    /// Stage 1: inside the new namespaces, waiting on the parent's mappings
    AwaitingMapping,
    /// Stage 2: inside the namespaces with the flag stripped
    Ready,
}

impl LaunchState {
    pub fn from_environment(unshare_requested: bool) -> LaunchState {
        LaunchState::derive(unshare_requested, running_in_user_ns())
    }

    pub fn derive(unshare_requested: bool, in_user_ns: bool) -> LaunchState {
        match (unshare_requested, in_user_ns) {
            (true, false) => LaunchState::AwaitingNamespaceCreation,
            (true, true) => LaunchState::AwaitingMapping,
            (false, true) => LaunchState::Ready,
            (false, false) => LaunchState::Unlaunched,
        }
    }

    /// Short label used to attribute log lines to a stage
    pub fn stage_name(&self) -> &'static str {
        match self {
            LaunchState::Unlaunched => "host",
            LaunchState::AwaitingNamespaceCreation => "parent",
            LaunchState::AwaitingMapping => "ns-child",
            LaunchState::Ready => "workload",
        }
    }

    pub fn in_user_ns(&self) -> bool {
        matches!(self, LaunchState::AwaitingMapping | LaunchState::Ready)
    }

    pub fn runs_workload(&self) -> bool {
        matches!(self, LaunchState::Unlaunched | LaunchState::Ready)
    }
}

impl Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stage_name())
    }
}

/// Whether the current process is inside a (non initial) user namespace.
pub fn running_in_user_ns() -> bool {
    // Only exists if the kernel supports user namespaces
    let Ok(file) = File::open("/proc/self/uid_map") else {
        return false;
    };
    let mut first_line = String::new();
    match BufReader::new(file).read_line(&mut first_line) {
        Ok(_) => uid_map_is_namespaced(&first_line),
        Err(_) => false,
    }
}

/* An empty map means we're in a namespace nobody has mapped yet. The initial namespace
 * is the only one that maps the full 0..4294967295 range onto itself. */
pub(crate) fn uid_map_is_namespaced(first_line: &str) -> bool {
    if first_line.trim().is_empty() {
        return true;
    }
    let fields: Vec<u64> = first_line
        .split_whitespace()
        .map_while(|field| field.parse().ok())
        .collect();
    fields[..] != [0, 0, 4294967295]
}
