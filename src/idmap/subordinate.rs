use super::Identity;
use crate::error::{Error, Result};
use log::trace;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A block of ids delegated to an identity by `/etc/subuid` or `/etc/subgid`.
/// Values are kept exactly as written since they're only ever handed on to
/// the mapping helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubordinateRange {
    pub start: String,
    pub count: String,
}

pub fn resolve_subordinate_range(
    path: &Path,
    identity: &Identity,
) -> Result<SubordinateRange> {
    let file = File::open(path).map_err(|source| Error::FileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    trace!("Looking up {} range in {}", identity.kind, path.display());

    read_subordinate_range(BufReader::new(file), path, identity)
}

/* Lines are `reference:start:count`. Anything that doesn't split into exactly three
 * fields is skipped, and the first line naming the identity wins. */
pub fn read_subordinate_range<R: BufRead>(
    reader: R,
    source: &Path,
    identity: &Identity,
) -> Result<SubordinateRange> {
    for line in reader.lines() {
        let line = line.map_err(|e| Error::FileUnavailable {
            path: source.to_path_buf(),
            source: e,
        })?;
        let fields: Vec<&str> = line.split(':').collect();
        if let [reference, start, count] = fields[..] {
            if identity.matches(reference) {
                return Ok(SubordinateRange {
                    start: start.to_string(),
                    count: count.to_string(),
                });
            }
        }
    }

    Err(Error::NoMappingFound {
        identity: identity.clone(),
    })
}
