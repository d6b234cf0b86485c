use super::impls::deserialize_level_filter;
use crate::idmap::IdKind;
use serde::Deserialize;
use std::{collections::HashMap, path::Path, path::PathBuf};

pub const DEFAULT_STORE_PATH: &str = "/tmp/docker-image-store";

#[derive(Deserialize, Default, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(deserialize_with = "deserialize_level_filter", default)]
    pub log_level: Option<log::LevelFilter>,
    pub path: Option<String>,
    pub subuid_file: Option<String>,
    pub subgid_file: Option<String>,
    pub newuidmap: Option<String>,
    pub newgidmap: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: log::LevelFilter,
    pub path: PathBuf,
    pub subuid_file: PathBuf,
    pub subgid_file: PathBuf,
    pub newuidmap: String,
    pub newgidmap: String,
    pub sources: HashMap<String, String>,
}

impl Config {
    /// The allocation source consulted for `kind`
    pub fn subid_file(&self, kind: IdKind) -> &Path {
        match kind {
            IdKind::Uid => &self.subuid_file,
            IdKind::Gid => &self.subgid_file,
        }
    }

    pub fn map_helper(&self, kind: IdKind) -> &str {
        match kind {
            IdKind::Uid => &self.newuidmap,
            IdKind::Gid => &self.newgidmap,
        }
    }
}
