use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a grant confers on a document. Total order: each role implies
/// every capability of the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Editor,
    Administrator,
    Owner,
}

impl Role {
    pub fn priority(self) -> u8 {
        match self {
            Role::Reader => 1,
            Role::Editor => 2,
            Role::Administrator => 3,
            Role::Owner => 4,
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Administrator | Role::Owner)
    }

    pub fn max_of(roles: impl IntoIterator<Item = Role>) -> Option<Role> {
        roles.into_iter().max()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Editor => "editor",
            Role::Administrator => "administrator",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(Role::Reader),
            "editor" => Ok(Role::Editor),
            "administrator" => Ok(Role::Administrator),
            "owner" => Ok(Role::Owner),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Grant subject: a user or a team, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Principal {
    User(Uuid),
    Team(String),
}

impl Principal {
    /// Discriminated key used in API payloads: `user:<id>` / `team:<name>`.
    pub fn target_key(&self) -> String {
        match self {
            Principal::User(id) => format!("user:{id}"),
            Principal::Team(name) => format!("team:{name}"),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::User(id) => Some(*id),
            Principal::Team(_) => None,
        }
    }

    pub fn team(&self) -> Option<&str> {
        match self {
            Principal::User(_) => None,
            Principal::Team(name) => Some(name.as_str()),
        }
    }
}
