use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::abilities::{Abilities, AbilityInput};
use crate::domain::accesses::link::{
    LinkDefinition, LinkReach, LinkRole, equivalent_link, get_select_options, link_grant,
};
use crate::domain::accesses::role::Role;
use crate::domain::documents::document::Document;

/// Caller identity. Team membership is resolved upstream (identity
/// provider); anonymous callers carry nothing.
#[derive(Debug, Clone)]
pub enum Actor {
    User { id: uuid::Uuid, teams: Vec<String> },
    Anonymous,
}

impl Actor {
    pub fn user(id: uuid::Uuid) -> Self {
        Actor::User {
            id,
            teams: Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User { .. })
    }

    pub fn user_id(&self) -> Option<uuid::Uuid> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::Anonymous => None,
        }
    }
}

/// AI gating knobs, extracted from configuration by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AiSettings {
    pub enabled: bool,
    pub allow_reach_from: LinkReach,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_reach_from: LinkReach::Public,
        }
    }
}

/// Everything the ability computation and the serializers need about one
/// (actor, document) pair, resolved in two queries.
#[derive(Debug, Clone)]
pub struct ResolvedAccess {
    /// Max role from access rows on the document or a live ancestor.
    pub role: Option<Role>,
    /// Max link role the caller can exercise on the chain (self included).
    pub link_grant: Option<LinkRole>,
    /// Equivalent (reach, role) of the strict ancestors' links.
    pub ancestors_link: LinkDefinition,
    /// Reach/role cells still selectable for this document.
    pub select_options: BTreeMap<LinkReach, Vec<LinkRole>>,
    /// Earliest `created_at` among the caller's chain accesses; floor for
    /// version visibility.
    pub earliest_access: Option<DateTime<Utc>>,
}

impl ResolvedAccess {
    pub fn effective_role(&self) -> Option<Role> {
        Role::max_of(
            self.role
                .into_iter()
                .chain(self.link_grant.map(LinkRole::as_role)),
        )
    }
}

/// Resolve the caller's standing on `doc`: direct + inherited role by
/// path-prefix query, link grants from the ancestor chain's policies.
pub async fn resolve<D, A>(
    docs: &D,
    accesses: &A,
    actor: &Actor,
    doc: &Document,
) -> anyhow::Result<ResolvedAccess>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    let chain = docs.chain(&doc.path).await?;

    // Links participate only from nodes that are not under a soft-deleted
    // ancestor; the target's own link always counts (deletion is handled
    // by the ability predicates, not by dropping the link).
    let links: Vec<LinkDefinition> = chain
        .iter()
        .filter(|d| d.id == doc.id || d.ancestors_deleted_at.is_none())
        .map(Document::link_definition)
        .collect();
    let ancestor_links: Vec<LinkDefinition> = chain
        .iter()
        .filter(|d| d.id != doc.id && d.ancestors_deleted_at.is_none())
        .map(Document::link_definition)
        .collect();

    let (role, earliest_access) = match actor {
        Actor::User { id, teams } => {
            let rows = accesses.accesses_on_chain(&doc.path, *id, teams).await?;
            let role = Role::max_of(rows.iter().map(|r| r.access.role));
            let earliest = rows.iter().map(|r| r.access.created_at).min();
            (role, earliest)
        }
        Actor::Anonymous => (None, None),
    };

    Ok(ResolvedAccess {
        role,
        link_grant: link_grant(&links, actor.is_authenticated()),
        ancestors_link: equivalent_link(&ancestor_links),
        select_options: get_select_options(&ancestor_links),
        earliest_access,
    })
}

pub fn abilities(
    resolved: &ResolvedAccess,
    actor: &Actor,
    doc: &Document,
    ai: AiSettings,
) -> Abilities {
    Abilities::compute(&AbilityInput {
        authenticated: actor.is_authenticated(),
        role: resolved.role,
        link_grant: resolved.link_grant,
        select_options: resolved.select_options.clone(),
        in_deleted_chain: doc.in_deleted_chain(),
        ai_feature_enabled: ai.enabled,
        ai_allow_reach_from: ai.allow_reach_from,
    })
}

/// Whether the chain leaves the document readable for this caller without
/// descending into it from elsewhere: a real access row, or a link the
/// caller can follow.
pub fn readable_per_se(resolved: &ResolvedAccess) -> bool {
    resolved.role.is_some() || resolved.link_grant.is_some()
}

/// Retrieve predicate shared by every gate: some effective role, and the
/// deleted chain is only visible to owners.
pub fn can_retrieve(resolved: &ResolvedAccess, doc: &Document) -> bool {
    let is_owner = resolved.role == Some(Role::Owner);
    let masked = doc.in_deleted_chain() && !is_owner;
    !masked && resolved.effective_role().is_some()
}

/// Validate a link-configuration change against the ancestors' links.
pub fn link_change_allowed(
    resolved: &ResolvedAccess,
    reach: LinkReach,
    role: LinkRole,
) -> bool {
    resolved
        .select_options
        .get(&reach)
        .is_some_and(|roles| roles.contains(&role))
}
