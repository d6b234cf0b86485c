use crate::error::{Error, Result};
use nix::unistd::{Group, User, getuid};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Uid,
    Gid,
}

impl IdKind {
    /// Suffix shared by the allocation file and the helper name,
    /// e.g. `/etc/sub{uid}` and `new{uid}map`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Uid => "uid",
            IdKind::Gid => "gid",
        }
    }
}

impl Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The invoking user's own uid, or its primary gid, as it should appear in
/// the subordinate id files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub kind: IdKind,
    pub id: String,
    pub name: String,
}

impl Identity {
    pub fn new(kind: IdKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Identity {
            kind,
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn current(kind: IdKind) -> Result<Identity> {
        let lookup_error = |reason: String| Error::IdentityLookup { kind, reason };

        let uid = getuid();
        let user = User::from_uid(uid)
            .map_err(|e| lookup_error(e.to_string()))?
            .ok_or_else(|| lookup_error(format!("no passwd entry for uid {}", uid)))?;

        match kind {
            IdKind::Uid => Ok(Identity::new(kind, user.uid.to_string(), user.name)),
            IdKind::Gid => {
                let group = Group::from_gid(user.gid)
                    .map_err(|e| lookup_error(e.to_string()))?
                    .ok_or_else(|| {
                        lookup_error(format!("no group entry for gid {}", user.gid))
                    })?;
                Ok(Identity::new(kind, group.gid.to_string(), group.name))
            }
        }
    }

    pub fn matches(&self, reference: &str) -> bool {
        reference == self.id || reference == self.name
    }
}
