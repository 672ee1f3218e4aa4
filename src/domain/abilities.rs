use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::accesses::link::{LinkReach, LinkRole};
use crate::domain::accesses::role::Role;

/// Everything the capability computation needs, resolved upstream: the
/// caller's direct/inherited role, the link role the caller can actually
/// exercise on the chain, and the document's deletion state.
#[derive(Debug, Clone)]
pub struct AbilityInput {
    pub authenticated: bool,
    /// Max role from access rows on the document or a live ancestor.
    pub role: Option<Role>,
    /// Max link role among chain links reachable by this caller.
    pub link_grant: Option<LinkRole>,
    /// Reach/role cells still selectable under the ancestors' links.
    pub select_options: BTreeMap<LinkReach, Vec<LinkRole>>,
    /// `ancestors_deleted_at` set (the node itself or an ancestor).
    pub in_deleted_chain: bool,
    pub ai_feature_enabled: bool,
    pub ai_allow_reach_from: LinkReach,
}

/// Boolean capability map consulted by every API gate.
/// `link_select_options` is the one non-boolean cell: gates hand it to the
/// share dialog unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Abilities {
    pub accesses_manage: bool,
    pub accesses_view: bool,
    pub ai_transform: bool,
    pub ai_translate: bool,
    pub attachment_upload: bool,
    pub can_edit: bool,
    pub children_create: bool,
    pub children_list: bool,
    pub collaboration_auth: bool,
    pub cors_proxy: bool,
    pub descendants: bool,
    pub destroy: bool,
    pub duplicate: bool,
    pub favorite: bool,
    pub invite_owner: bool,
    pub link_configuration: bool,
    pub link_select_options: BTreeMap<LinkReach, Vec<LinkRole>>,
    pub media_auth: bool,
    pub media_check: bool,
    #[serde(rename = "move")]
    pub move_doc: bool,
    pub partial_update: bool,
    pub restore: bool,
    pub retrieve: bool,
    pub tree: bool,
    pub update: bool,
    pub versions_destroy: bool,
    pub versions_list: bool,
    pub versions_retrieve: bool,
}

impl Abilities {
    pub fn compute(input: &AbilityInput) -> Abilities {
        let role = input.role;
        let effective = Role::max_of(
            role.into_iter()
                .chain(input.link_grant.map(LinkRole::as_role)),
        );

        let is_owner = role == Some(Role::Owner);
        // Owners keep seeing their trashed documents.
        let is_deleted = input.in_deleted_chain && !is_owner;
        let is_owner_or_admin = role.is_some_and(Role::is_privileged) && !is_deleted;

        let can_get = effective.is_some() && !is_deleted;
        let can_update =
            (is_owner_or_admin || effective >= Some(Role::Editor)) && !is_deleted;
        // AI in restricted mode must not be reachable through a link grant.
        let can_update_from_access =
            (is_owner_or_admin || role >= Some(Role::Editor)) && !is_deleted;
        let has_access = role.is_some() && !is_deleted;

        let ai_access = input.ai_feature_enabled
            && match input.ai_allow_reach_from {
                LinkReach::Public => can_update,
                LinkReach::Authenticated => input.authenticated && can_update,
                LinkReach::Restricted => input.authenticated && can_update_from_access,
            };

        Abilities {
            accesses_manage: is_owner_or_admin,
            accesses_view: has_access,
            ai_transform: ai_access,
            ai_translate: ai_access,
            attachment_upload: can_update,
            can_edit: can_update,
            children_create: can_update && input.authenticated,
            children_list: can_get,
            collaboration_auth: can_get,
            cors_proxy: can_get,
            descendants: can_get,
            destroy: is_owner && !input.in_deleted_chain,
            duplicate: can_get && input.authenticated,
            favorite: can_get && input.authenticated,
            invite_owner: is_owner,
            link_configuration: is_owner_or_admin,
            link_select_options: input.select_options.clone(),
            media_auth: can_get,
            media_check: can_get,
            move_doc: is_owner_or_admin && !input.in_deleted_chain,
            partial_update: can_update,
            restore: is_owner,
            retrieve: can_get,
            tree: can_get,
            update: can_update,
            versions_destroy: is_owner_or_admin,
            versions_list: has_access,
            versions_retrieve: has_access,
        }
    }
}
