mod support;

use chrono::{Duration, Utc};
use uuid::Uuid;

use docs_core::application::access::{Actor, AiSettings};
use docs_core::application::errors::DocsError;
use docs_core::application::ports::document_repository::DocumentRepository;
use docs_core::application::use_cases::documents::get_document::GetDocument;
use docs_core::application::use_cases::documents::update_link_configuration::UpdateLinkConfiguration;
use docs_core::domain::accesses::link::{LinkReach, LinkRole};
use docs_core::domain::accesses::role::{Principal, Role};

use support::World;

fn ai() -> AiSettings {
    AiSettings::default()
}

fn cutoff() -> chrono::DateTime<Utc> {
    Utc::now() - Duration::days(30)
}

fn getter<'a>(
    w: &'a World,
) -> GetDocument<'a, support::MemDocs, support::MemAccesses, support::MemTraces> {
    GetDocument {
        docs: w.docs.as_ref(),
        accesses: w.accesses.as_ref(),
        link_traces: w.traces.as_ref(),
        ai: ai(),
    }
}

#[tokio::test]
async fn anonymous_link_upgrade_via_ancestor() {
    // Grand-parent public/editor, intermediate and leaf
    // restricted; anonymous retrieve succeeds with edit abilities and the
    // ancestors' equivalent link reported as public/editor.
    let w = World::new();
    let owner = Uuid::new_v4();

    let grandparent = w.root_owned_by(owner).await;
    let parent = w.child_of(&grandparent).await;
    let leaf = w.child_of(&parent).await;
    w.set_link(&grandparent, LinkReach::Public, LinkRole::Editor)
        .await;

    let view = getter(&w)
        .execute(&Actor::Anonymous, leaf.id, cutoff())
        .await
        .unwrap();

    assert!(view.abilities.retrieve);
    assert!(view.abilities.partial_update);
    assert_eq!(view.ancestors_link.reach, LinkReach::Public);
    assert_eq!(view.ancestors_link.role, LinkRole::Editor);
    // Anonymous callers never see accesses or versions through a link.
    assert!(!view.abilities.accesses_view);
    assert!(!view.abilities.versions_list);
}

#[tokio::test]
async fn restricted_chain_stays_hidden_from_anonymous() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    let leaf = w.child_of(&root).await;

    let err = getter(&w)
        .execute(&Actor::Anonymous, leaf.id, cutoff())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::NotFound));
}

#[tokio::test]
async fn authenticated_link_admits_only_signed_in_callers() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let visitor = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    w.set_link(&root, LinkReach::Authenticated, LinkRole::Reader)
        .await;

    let err = getter(&w)
        .execute(&Actor::Anonymous, root.id, cutoff())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::NotFound));

    let view = getter(&w)
        .execute(&Actor::user(visitor), root.id, cutoff())
        .await
        .unwrap();
    assert!(view.abilities.retrieve);
    assert!(!view.abilities.partial_update);
}

#[tokio::test]
async fn link_reached_view_records_a_single_trace() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let visitor = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    w.set_link(&root, LinkReach::Public, LinkRole::Reader).await;

    getter(&w)
        .execute(&Actor::user(visitor), root.id, cutoff())
        .await
        .unwrap();
    getter(&w)
        .execute(&Actor::user(visitor), root.id, cutoff())
        .await
        .unwrap();

    let traces = w.traces.rows.lock().await;
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].user_id, visitor);
    assert_eq!(traces[0].document_id, root.id);

    // The owner reads through a real access: no trace.
    drop(traces);
    getter(&w)
        .execute(&Actor::user(owner), root.id, cutoff())
        .await
        .unwrap();
    assert_eq!(w.traces.rows.lock().await.len(), 1);
}

#[tokio::test]
async fn deleted_document_is_not_found_for_non_owners_past_trace() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    w.grant(&root, Principal::User(reader), Role::Reader).await;

    let now = Utc::now();
    w.docs
        .soft_delete_subtree(root.id, now)
        .await
        .unwrap();

    // Masked as NotFound for the reader, visible for the owner.
    let err = getter(&w)
        .execute(&Actor::user(reader), root.id, cutoff())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::NotFound));

    let view = getter(&w)
        .execute(&Actor::user(owner), root.id, cutoff())
        .await
        .unwrap();
    assert!(view.abilities.restore);

    // Past the retention window it is gone for everyone.
    {
        let mut docs = w.docs.docs.lock().await;
        let doc = docs.get_mut(&root.id).unwrap();
        let old = Utc::now() - Duration::days(40);
        doc.deleted_at = Some(old);
        doc.ancestors_deleted_at = Some(old);
    }
    let err = getter(&w)
        .execute(&Actor::user(owner), root.id, cutoff())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::NotFound));
}

#[tokio::test]
async fn link_configuration_cannot_regress_ancestors() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    let child = w.child_of(&root).await;
    w.set_link(&root, LinkReach::Public, LinkRole::Reader).await;

    let uc = UpdateLinkConfiguration {
        docs: w.docs.as_ref(),
        accesses: w.accesses.as_ref(),
        collaboration: w.collab.as_ref(),
        ai: ai(),
    };

    // Public/reader upstream collapses the child's options onto public.
    let err = uc
        .execute(
            &Actor::user(owner),
            child.id,
            LinkReach::Restricted,
            LinkRole::Reader,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::Invariant(_)));

    let updated = uc
        .execute(
            &Actor::user(owner),
            child.id,
            LinkReach::Public,
            LinkRole::Editor,
        )
        .await
        .unwrap();
    assert_eq!(updated.link_reach, LinkReach::Public);
    assert_eq!(updated.link_role, LinkRole::Editor);

    // The collaboration server was told to recheck the room.
    let resets = w.collab.resets.lock().await;
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].0, child.id.to_string());
}

#[tokio::test]
async fn link_configuration_requires_privilege() {
    let w = World::new();
    let owner = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let root = w.root_owned_by(owner).await;
    w.grant(&root, Principal::User(editor), Role::Editor).await;

    let uc = UpdateLinkConfiguration {
        docs: w.docs.as_ref(),
        accesses: w.accesses.as_ref(),
        collaboration: w.collab.as_ref(),
        ai: ai(),
    };
    let err = uc
        .execute(
            &Actor::user(editor),
            root.id,
            LinkReach::Public,
            LinkRole::Reader,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocsError::PermissionDenied(_)));
}
