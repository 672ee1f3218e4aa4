//! In-memory fakes for the engine's ports, mirroring the semantics of the
//! sqlx repositories closely enough to drive the use cases end to end.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use docs_core::application::ports::access_repository::AccessRepository;
use docs_core::application::ports::ask_access_repository::{AskForAccess, AskForAccessRepository};
use docs_core::application::ports::cache_port::CachePort;
use docs_core::application::ports::collaboration_port::{CollaborationPort, RoomConnections};
use docs_core::application::ports::document_repository::{DocumentRepository, MovePlan};
use docs_core::application::ports::favorite_repository::FavoriteRepository;
use docs_core::application::ports::invitation_repository::{Invitation, InvitationRepository};
use docs_core::application::ports::link_trace_repository::{LinkTrace, LinkTraceRepository};
use docs_core::application::ports::object_store_port::{
    ObjectMeta, ObjectStorePort, ObjectVersion, PresignedRequest, VersionPage,
};
use docs_core::domain::accesses::access::{ChainAccess, DocumentAccess};
use docs_core::domain::accesses::link::{LinkReach, LinkRole};
use docs_core::domain::accesses::role::{Principal, Role};
use docs_core::domain::documents::document::{Document, DocumentInit, DocumentUpdate};
use docs_core::domain::documents::path::{TreePath, plan_insertion};

pub fn doc_from(init: &DocumentInit, path: TreePath, ancestors_deleted_at: Option<DateTime<Utc>>) -> Document {
    let depth = path.depth() as i32;
    Document {
        id: init.id.unwrap_or_else(Uuid::new_v4),
        title: init.title.clone(),
        excerpt: init.excerpt.clone(),
        link_reach: init.link_reach.unwrap_or(LinkReach::Restricted),
        link_role: init.link_role.unwrap_or(LinkRole::Reader),
        creator_id: init.creator_id,
        deleted_at: None,
        ancestors_deleted_at,
        has_deleted_children: false,
        duplicated_from: init.duplicated_from,
        attachments: init.attachments.clone(),
        path,
        depth,
        numchild: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// One bundle of fakes plus convenience builders, shared by the
/// integration tests.
pub struct World {
    pub docs: Arc<MemDocs>,
    pub accesses: Arc<MemAccesses>,
    pub cache: Arc<MemCache>,
    pub collab: Arc<MemCollab>,
    pub store: Arc<MemStore>,
    pub favorites: Arc<MemFavorites>,
    pub traces: Arc<MemTraces>,
    pub invitations: Arc<MemInvitations>,
    pub asks: Arc<MemAsks>,
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

impl World {
    pub fn new() -> Self {
        init_tracing();
        let docs = MemDocs::new();
        let accesses = MemAccesses::new(docs.clone());
        Self {
            docs,
            accesses,
            cache: MemCache::new(),
            collab: MemCollab::new(Some(RoomConnections {
                count: 0,
                exists: false,
            })),
            store: MemStore::new(),
            favorites: MemFavorites::new(),
            traces: MemTraces::new(),
            invitations: MemInvitations::new(),
            asks: MemAsks::new(),
        }
    }

    /// Create a root owned by `user` through the real use case.
    pub async fn root_owned_by(&self, user: Uuid) -> Document {
        use docs_core::application::access::Actor;
        use docs_core::application::use_cases::documents::create_document::CreateDocument;
        CreateDocument {
            docs: self.docs.as_ref(),
            accesses: self.accesses.as_ref(),
        }
        .execute(&Actor::user(user), DocumentInit::default())
        .await
        .expect("root creation succeeds")
    }

    /// Add a child bypassing permission checks (fixture plumbing).
    pub async fn child_of(&self, parent: &Document) -> Document {
        self.docs
            .add_child(parent.id, DocumentInit::default())
            .await
            .expect("child creation succeeds")
    }

    /// Grant a role directly (fixture plumbing, no gates).
    pub async fn grant(&self, doc: &Document, principal: Principal, role: Role) {
        self.accesses
            .update_or_create(doc.id, &principal, role)
            .await
            .expect("grant succeeds");
    }

    /// Flip a document's link policy directly.
    pub async fn set_link(&self, doc: &Document, reach: LinkReach, role: LinkRole) {
        self.docs
            .update(
                doc.id,
                DocumentUpdate {
                    link_reach: Some(reach),
                    link_role: Some(role),
                    ..Default::default()
                },
            )
            .await
            .expect("link update succeeds");
    }
}

#[derive(Default)]
pub struct MemDocs {
    pub docs: Mutex<HashMap<Uuid, Document>>,
}

impl MemDocs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn get(&self, id: Uuid) -> Document {
        self.docs.lock().await.get(&id).cloned().expect("document exists")
    }

    async fn sorted_children(&self, parent: Option<&TreePath>) -> Vec<TreePath> {
        let docs = self.docs.lock().await;
        let mut out: Vec<TreePath> = docs
            .values()
            .filter(|d| match parent {
                Some(p) => d.path.parent().as_ref() == Some(p),
                None => d.path.is_root(),
            })
            .map(|d| d.path.clone())
            .collect();
        out.sort();
        out
    }
}

#[async_trait]
impl DocumentRepository for MemDocs {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.lock().await.get(&id).cloned())
    }

    async fn chain(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().await;
        let mut out: Vec<Document> = docs
            .values()
            .filter(|d| d.path == *path || d.path.is_ancestor_of(path))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn children(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().await;
        let mut out: Vec<Document> = docs
            .values()
            .filter(|d| d.path.parent().as_ref() == Some(path))
            .filter(|d| d.deleted_at.is_none() && d.ancestors_deleted_at.is_none())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn child_paths(&self, parent: Option<&TreePath>) -> anyhow::Result<Vec<TreePath>> {
        Ok(self.sorted_children(parent).await)
    }

    async fn descendants(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().await;
        let mut out: Vec<Document> = docs
            .values()
            .filter(|d| path.is_ancestor_of(&d.path))
            .filter(|d| d.deleted_at.is_none() && d.ancestors_deleted_at.is_none())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn subtree_ids(&self, path: &TreePath) -> anyhow::Result<Vec<Uuid>> {
        let docs = self.docs.lock().await;
        Ok(docs
            .values()
            .filter(|d| d.path == *path || path.is_ancestor_of(&d.path))
            .map(|d| d.id)
            .collect())
    }

    async fn deleted_subtree_roots(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().await;
        Ok(docs
            .values()
            .filter(|d| {
                d.deleted_at.is_some()
                    && d.deleted_at == d.ancestors_deleted_at
                    && d.deleted_at.unwrap() >= cutoff
            })
            .cloned()
            .collect())
    }

    async fn create_root(&self, init: DocumentInit) -> anyhow::Result<Document> {
        let roots = self.sorted_children(None).await;
        let path = match roots.last() {
            Some(last) => last.next_sibling().map_err(anyhow::Error::msg)?,
            None => TreePath::for_insertion(None, 0).map_err(anyhow::Error::msg)?,
        };
        let doc = doc_from(&init, path, None);
        self.docs.lock().await.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn add_child(&self, parent_id: Uuid, init: DocumentInit) -> anyhow::Result<Document> {
        let parent = self
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("parent not found"))?;
        let children = self.sorted_children(Some(&parent.path)).await;
        let path = match children.last() {
            Some(last) => last.next_sibling().map_err(anyhow::Error::msg)?,
            None => parent.path.child(0).map_err(anyhow::Error::msg)?,
        };
        let doc = doc_from(&init, path, parent.ancestors_deleted_at);
        let mut docs = self.docs.lock().await;
        docs.get_mut(&parent_id).unwrap().numchild += 1;
        docs.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn add_sibling(&self, node_id: Uuid, init: DocumentInit) -> anyhow::Result<Document> {
        let node = self
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("node not found"))?;
        let parent = node.path.parent();
        let siblings = self.sorted_children(parent.as_ref()).await;
        let at = siblings
            .iter()
            .position(|p| *p == node.path)
            .expect("node among siblings");
        let phantom = node.path.child(0).map_err(anyhow::Error::msg)?;
        let (final_path, rewrites) =
            plan_insertion(&siblings, parent.as_ref(), at + 1, &phantom)
                .map_err(anyhow::Error::msg)?;

        let mut docs = self.docs.lock().await;
        for rw in rewrites.iter().filter(|rw| rw.old_prefix != phantom) {
            for d in docs.values_mut() {
                if d.path == rw.old_prefix || rw.old_prefix.is_ancestor_of(&d.path) {
                    d.path = d.path.rebase(&rw.old_prefix, &rw.new_prefix);
                    d.depth += rw.depth_delta;
                }
            }
        }
        let doc = doc_from(&init, final_path, node.ancestors_deleted_at);
        if let Some(p) = parent.as_ref() {
            if let Some(parent_doc) = docs.values_mut().find(|d| d.path == *p) {
                parent_doc.numchild += 1;
            }
        }
        docs.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: Uuid, update: DocumentUpdate) -> anyhow::Result<Option<Document>> {
        let mut docs = self.docs.lock().await;
        let Some(doc) = docs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            doc.title = title;
        }
        if let Some(excerpt) = update.excerpt {
            doc.excerpt = excerpt;
        }
        if let Some(reach) = update.link_reach {
            doc.link_reach = reach;
        }
        if let Some(role) = update.link_role {
            doc.link_role = role;
        }
        if let Some(attachments) = update.attachments {
            doc.attachments = attachments;
        }
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn move_subtree(&self, plan: &MovePlan) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().await;
        for rw in &plan.rewrites {
            for d in docs.values_mut() {
                if d.path == rw.old_prefix || rw.old_prefix.is_ancestor_of(&d.path) {
                    d.path = d.path.rebase(&rw.old_prefix, &rw.new_prefix);
                    d.depth += rw.depth_delta;
                }
            }
        }
        if let Some(old_parent) = plan.old_parent_id {
            if let Some(p) = docs.get_mut(&old_parent) {
                p.numchild -= 1;
            }
            let parent_path = docs.get(&old_parent).unwrap().path.clone();
            let has_deleted = docs.values().any(|d| {
                d.path.parent().as_ref() == Some(&parent_path) && d.deleted_at.is_some()
            });
            docs.get_mut(&old_parent).unwrap().has_deleted_children = has_deleted;
        }
        if let Some(new_parent) = plan.new_parent_id {
            if let Some(p) = docs.get_mut(&new_parent) {
                p.numchild += 1;
            }
        }
        Ok(())
    }

    async fn soft_delete_subtree(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().await;
        let path = docs
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("document not found"))?
            .path
            .clone();
        for d in docs.values_mut() {
            if d.id == id {
                d.deleted_at = Some(now);
                d.ancestors_deleted_at = Some(now);
            } else if path.is_ancestor_of(&d.path) && d.ancestors_deleted_at.is_none() {
                d.ancestors_deleted_at = Some(now);
            }
        }
        if let Some(parent_path) = path.parent() {
            if let Some(parent) = docs.values_mut().find(|d| d.path == parent_path) {
                parent.numchild -= 1;
                parent.has_deleted_children = true;
            }
        }
        Ok(())
    }

    async fn restore_subtree(
        &self,
        id: Uuid,
        prior_deleted_at: DateTime<Utc>,
        new_ancestors_deleted_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().await;
        let path = docs
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("document not found"))?
            .path
            .clone();
        for d in docs.values_mut() {
            if d.id == id {
                d.deleted_at = None;
                d.ancestors_deleted_at = new_ancestors_deleted_at;
            } else if path.is_ancestor_of(&d.path)
                && d.ancestors_deleted_at
                    .is_some_and(|stamp| stamp >= prior_deleted_at)
            {
                d.ancestors_deleted_at = match d.deleted_at {
                    Some(own) => Some(own),
                    None => new_ancestors_deleted_at,
                };
            }
        }
        if let Some(parent_path) = path.parent() {
            let has_deleted = docs.values().any(|d| {
                d.path.parent().as_ref() == Some(&parent_path) && d.deleted_at.is_some()
            });
            if let Some(parent) = docs.values_mut().find(|d| d.path == parent_path) {
                parent.numchild += 1;
                parent.has_deleted_children = has_deleted;
            }
        }
        Ok(())
    }

    async fn documents_with_attachment(&self, key: &str) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().await;
        Ok(docs
            .values()
            .filter(|d| d.attachments.iter().any(|k| k == key))
            .cloned()
            .collect())
    }
}

pub struct MemAccesses {
    pub rows: Mutex<Vec<DocumentAccess>>,
    pub docs: Arc<MemDocs>,
}

impl MemAccesses {
    pub fn new(docs: Arc<MemDocs>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            docs,
        })
    }

    async fn doc_path(&self, document_id: Uuid) -> Option<TreePath> {
        self.docs
            .docs
            .lock()
            .await
            .get(&document_id)
            .map(|d| d.path.clone())
    }

    async fn chain_rows(
        &self,
        path: &TreePath,
        filter: impl Fn(&DocumentAccess) -> bool,
    ) -> Vec<ChainAccess> {
        let docs = self.docs.docs.lock().await;
        let rows = self.rows.lock().await;
        rows.iter()
            .filter(|a| filter(a))
            .filter_map(|a| {
                let doc = docs.get(&a.document_id)?;
                let on_chain = doc.path == *path || doc.path.is_ancestor_of(path);
                let live = doc.path == *path || doc.ancestors_deleted_at.is_none();
                (on_chain && live).then(|| ChainAccess {
                    access: a.clone(),
                    document_path: doc.path.clone(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl AccessRepository for MemAccesses {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<DocumentAccess>> {
        Ok(self.rows.lock().await.iter().find(|a| a.id == id).cloned())
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn accesses_on_chain(
        &self,
        path: &TreePath,
        user_id: Uuid,
        teams: &[String],
    ) -> anyhow::Result<Vec<ChainAccess>> {
        Ok(self
            .chain_rows(path, |a| match &a.principal {
                Principal::User(id) => *id == user_id,
                Principal::Team(team) => teams.iter().any(|t| t == team),
            })
            .await)
    }

    async fn chain_accesses_for_principal(
        &self,
        path: &TreePath,
        principal: &Principal,
    ) -> anyhow::Result<Vec<ChainAccess>> {
        Ok(self.chain_rows(path, |a| a.principal == *principal).await)
    }

    async fn create(&self, access: &DocumentAccess) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|a| a.document_id == access.document_id && a.principal == access.principal)
        {
            anyhow::bail!("duplicate access row");
        }
        rows.push(access.clone());
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<Option<DocumentAccess>> {
        let mut rows = self.rows.lock().await;
        for a in rows.iter_mut() {
            if a.id == id {
                a.role = role;
                return Ok(Some(a.clone()));
            }
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() < before)
    }

    async fn update_or_create(
        &self,
        document_id: Uuid,
        principal: &Principal,
        role: Role,
    ) -> anyhow::Result<DocumentAccess> {
        let mut rows = self.rows.lock().await;
        for a in rows.iter_mut() {
            if a.document_id == document_id && a.principal == *principal {
                a.role = role;
                return Ok(a.clone());
            }
        }
        let row = DocumentAccess::new(document_id, principal.clone(), role);
        rows.push(row.clone());
        Ok(row)
    }

    async fn get_for_principal(
        &self,
        document_id: Uuid,
        principal: &Principal,
    ) -> anyhow::Result<Option<DocumentAccess>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|a| a.document_id == document_id && a.principal == *principal)
            .cloned())
    }

    async fn count_direct(&self, document_id: Uuid) -> anyhow::Result<i64> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.document_id == document_id)
            .count() as i64)
    }

    async fn count_chain(&self, path: &TreePath) -> anyhow::Result<i64> {
        Ok(self.chain_rows(path, |_| true).await.len() as i64)
    }

    async fn owners_of(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.document_id == document_id && a.role == Role::Owner)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemCache {
    pub entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.unwrap().is_some()
    }
}

#[async_trait]
impl CachePort for MemCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        let expired = matches!(entries.get(key), Some((_, Some(expiry))) if *expiry <= Instant::now());
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        self.entries.lock().await.insert(
            key.to_string(),
            (value.to_string(), ttl.map(|t| Instant::now() + t)),
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<bool> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value, Some(ttl)).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

pub struct MemCollab {
    /// None simulates an unreachable or erroring collaboration server.
    pub connections: Mutex<Option<RoomConnections>>,
    pub resets: Mutex<Vec<(String, Option<Uuid>)>>,
}

impl MemCollab {
    pub fn new(connections: Option<RoomConnections>) -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(connections),
            resets: Mutex::new(Vec::new()),
        })
    }

    pub async fn set_connections(&self, connections: Option<RoomConnections>) {
        *self.connections.lock().await = connections;
    }
}

#[async_trait]
impl CollaborationPort for MemCollab {
    async fn get_connections(
        &self,
        _room: &str,
        _session_key: &str,
    ) -> anyhow::Result<RoomConnections> {
        let connections = *self.connections.lock().await;
        connections.ok_or_else(|| anyhow::anyhow!("collaboration server unavailable"))
    }

    async fn reset_connections(&self, room: &str, user_id: Option<Uuid>) -> anyhow::Result<()> {
        self.resets.lock().await.push((room.to_string(), user_id));
        Ok(())
    }
}

pub struct StoredVersion {
    pub version_id: String,
    pub bytes: Vec<u8>,
    pub meta: ObjectMeta,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemStore {
    pub objects: Mutex<HashMap<String, Vec<StoredVersion>>>,
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn put_at(
        &self,
        key: &str,
        bytes: &[u8],
        meta: ObjectMeta,
        last_modified: DateTime<Utc>,
    ) {
        self.objects
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .push(StoredVersion {
                version_id: Uuid::new_v4().to_string(),
                bytes: bytes.to_vec(),
                meta,
                last_modified,
            });
    }

    pub async fn version_count(&self, key: &str) -> usize {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStorePort for MemStore {
    async fn head(&self, key: &str) -> anyhow::Result<Option<ObjectMeta>> {
        Ok(self
            .objects
            .lock()
            .await
            .get(key)
            .and_then(|versions| versions.last())
            .map(|v| v.meta.clone()))
    }

    async fn get(&self, key: &str, version_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
        let objects = self.objects.lock().await;
        let Some(versions) = objects.get(key) else {
            return Ok(None);
        };
        let found = match version_id {
            Some(vid) => versions.iter().find(|v| v.version_id == vid),
            None => versions.last(),
        };
        Ok(found.map(|v| v.bytes.clone()))
    }

    async fn put(&self, key: &str, bytes: &[u8], meta: &ObjectMeta) -> anyhow::Result<()> {
        self.put_at(key, bytes, meta.clone(), Utc::now()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().await.remove(key);
        Ok(())
    }

    async fn delete_version(&self, key: &str, version_id: &str) -> anyhow::Result<bool> {
        let mut objects = self.objects.lock().await;
        let Some(versions) = objects.get_mut(key) else {
            return Ok(false);
        };
        let before = versions.len();
        versions.retain(|v| v.version_id != version_id);
        Ok(versions.len() < before)
    }

    async fn list_versions(
        &self,
        key: &str,
        page_size: i32,
        _marker: Option<&str>,
    ) -> anyhow::Result<VersionPage> {
        let objects = self.objects.lock().await;
        let versions = objects.get(key).map(|v| v.as_slice()).unwrap_or(&[]);
        let latest_idx = versions.len().saturating_sub(1);
        let out: Vec<ObjectVersion> = versions
            .iter()
            .enumerate()
            .rev()
            .take(page_size as usize)
            .map(|(i, v)| ObjectVersion {
                version_id: v.version_id.clone(),
                last_modified: v.last_modified,
                is_latest: i == latest_idx && !versions.is_empty(),
                size: v.bytes.len() as i64,
            })
            .collect();
        Ok(VersionPage {
            versions: out,
            next_marker: None,
        })
    }

    async fn presign_get(
        &self,
        key: &str,
        _expires_in: Duration,
    ) -> anyhow::Result<PresignedRequest> {
        Ok(PresignedRequest {
            url: format!("https://store.test/{key}"),
            headers: vec![
                ("Authorization".into(), "AWS4-HMAC-SHA256 test".into()),
                ("x-amz-date".into(), "20260101T000000Z".into()),
                ("x-amz-content-sha256".into(), "UNSIGNED-PAYLOAD".into()),
            ],
        })
    }
}

#[derive(Default)]
pub struct MemFavorites {
    pub rows: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemFavorites {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl FavoriteRepository for MemFavorites {
    async fn add(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        if rows.contains(&(user_id, document_id)) {
            return Ok(false);
        }
        rows.push((user_id, document_id));
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| *r != (user_id, document_id));
        Ok(rows.len() < before)
    }

    async fn is_favorite(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.rows.lock().await.contains(&(user_id, document_id)))
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, d)| *d)
            .collect())
    }
}

#[derive(Default)]
pub struct MemTraces {
    pub rows: Mutex<Vec<LinkTrace>>,
}

impl MemTraces {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl LinkTraceRepository for MemTraces {
    async fn record(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|t| t.user_id == user_id && t.document_id == document_id)
        {
            return Ok(false);
        }
        rows.push(LinkTrace {
            id: Uuid::new_v4(),
            user_id,
            document_id,
            is_masked: false,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn get(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<Option<LinkTrace>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|t| t.user_id == user_id && t.document_id == document_id)
            .cloned())
    }

    async fn set_masked(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        masked: bool,
    ) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        if let Some(t) = rows
            .iter_mut()
            .find(|t| t.user_id == user_id && t.document_id == document_id)
        {
            if t.is_masked == masked {
                return Ok(false);
            }
            t.is_masked = masked;
            return Ok(true);
        }
        rows.push(LinkTrace {
            id: Uuid::new_v4(),
            user_id,
            document_id,
            is_masked: masked,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<LinkTrace>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemInvitations {
    pub rows: Mutex<Vec<Invitation>>,
}

impl MemInvitations {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl InvitationRepository for MemInvitations {
    async fn create(&self, invitation: &Invitation) -> anyhow::Result<()> {
        self.rows.lock().await.push(invitation.clone());
        Ok(())
    }

    async fn exists_for_email(&self, document_id: Uuid, email: &str) -> anyhow::Result<bool> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .any(|i| i.document_id == document_id && i.email.eq_ignore_ascii_case(email)))
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<Invitation>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|i| i.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn list_valid_for_email(
        &self,
        email: &str,
        issued_after: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Invitation>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|i| i.email.eq_ignore_ascii_case(email) && i.created_at > issued_after)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|i| i.id != id);
        Ok(rows.len() < before)
    }
}

#[derive(Default)]
pub struct MemAsks {
    pub rows: Mutex<Vec<AskForAccess>>,
}

impl MemAsks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl AskForAccessRepository for MemAsks {
    async fn create(&self, ask: &AskForAccess) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|a| a.user_id == ask.user_id && a.document_id == ask.document_id)
        {
            return Ok(false);
        }
        rows.push(ask.clone());
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<AskForAccess>> {
        Ok(self.rows.lock().await.iter().find(|a| a.id == id).cloned())
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<AskForAccess>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() < before)
    }
}
