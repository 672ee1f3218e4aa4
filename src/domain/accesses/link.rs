use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::accesses::role::Role;

/// Who a share link lets in. Wider reaches include narrower audiences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkReach {
    Restricted,
    Authenticated,
    Public,
}

/// What link-holders may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    Reader,
    Editor,
}

impl LinkReach {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkReach::Restricted => "restricted",
            LinkReach::Authenticated => "authenticated",
            LinkReach::Public => "public",
        }
    }
}

impl LinkRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkRole::Reader => "reader",
            LinkRole::Editor => "editor",
        }
    }

    pub fn as_role(self) -> Role {
        match self {
            LinkRole::Reader => Role::Reader,
            LinkRole::Editor => Role::Editor,
        }
    }
}

impl fmt::Display for LinkReach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkReach {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restricted" => Ok(LinkReach::Restricted),
            "authenticated" => Ok(LinkReach::Authenticated),
            "public" => Ok(LinkReach::Public),
            other => Err(format!("unknown link reach: {other}")),
        }
    }
}

impl FromStr for LinkRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(LinkRole::Reader),
            "editor" => Ok(LinkRole::Editor),
            other => Err(format!("unknown link role: {other}")),
        }
    }
}

/// One document's link policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub reach: LinkReach,
    pub role: LinkRole,
}

impl LinkDefinition {
    pub fn new(reach: LinkReach, role: LinkRole) -> Self {
        Self { reach, role }
    }
}

/// Collapse a root-to-node chain of link policies into the single pair
/// reported to clients: the widest reach in the chain, carrying the
/// highest role granted at that reach.
pub fn equivalent_link(chain: &[LinkDefinition]) -> LinkDefinition {
    let reach = chain
        .iter()
        .map(|l| l.reach)
        .max()
        .unwrap_or(LinkReach::Restricted);
    let role = chain
        .iter()
        .filter(|l| l.reach == reach)
        .map(|l| l.role)
        .max()
        .unwrap_or(LinkRole::Reader);
    LinkDefinition { reach, role }
}

/// Role a caller obtains from the chain's links alone. A restricted link
/// grants nothing; an authenticated link only admits signed-in callers.
pub fn link_grant(chain: &[LinkDefinition], authenticated: bool) -> Option<LinkRole> {
    chain
        .iter()
        .filter(|l| {
            l.reach == LinkReach::Public || (l.reach == LinkReach::Authenticated && authenticated)
        })
        .map(|l| l.role)
        .max()
}

/// Reach/role combinations a document owner may still select given what
/// its ancestors already grant. Selecting below an ancestor's link would
/// silently regress it, so those cells are removed.
pub fn get_select_options(
    ancestors: &[LinkDefinition],
) -> BTreeMap<LinkReach, Vec<LinkRole>> {
    let all_roles = vec![LinkRole::Reader, LinkRole::Editor];
    let mut options: BTreeMap<LinkReach, Vec<LinkRole>> = BTreeMap::from([
        (LinkReach::Restricted, all_roles.clone()),
        (LinkReach::Authenticated, all_roles.clone()),
        (LinkReach::Public, all_roles),
    ]);

    let has = |reach: LinkReach, role: LinkRole| {
        ancestors.iter().any(|l| l.reach == reach && l.role == role)
    };

    if has(LinkReach::Public, LinkRole::Editor) {
        return BTreeMap::from([(LinkReach::Public, vec![LinkRole::Editor])]);
    }
    if has(LinkReach::Authenticated, LinkRole::Editor) {
        for reach in [LinkReach::Authenticated, LinkReach::Public] {
            if let Some(roles) = options.get_mut(&reach) {
                roles.retain(|r| *r != LinkRole::Reader);
            }
        }
    }
    if has(LinkReach::Public, LinkRole::Reader) {
        options.remove(&LinkReach::Restricted);
        options.remove(&LinkReach::Authenticated);
    }
    if has(LinkReach::Authenticated, LinkRole::Reader) {
        options.remove(&LinkReach::Restricted);
    }
    options
}

/// Whether a (reach, role) pair is still selectable under the ancestors'
/// links.
pub fn is_selectable(
    ancestors: &[LinkDefinition],
    reach: LinkReach,
    role: LinkRole,
) -> bool {
    get_select_options(ancestors)
        .get(&reach)
        .is_some_and(|roles| roles.contains(&role))
}
