use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::favorite_repository::FavoriteRepository;

/// Idempotency indicator: `changed` is false when the call was a no-op
/// ("was already favorite" / "was already not favorite").
#[derive(Debug)]
pub struct FavoriteOutcome {
    pub changed: bool,
}

pub struct FavoriteDocument<'a, D, A, F>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    F: FavoriteRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub favorites: &'a F,
    pub ai: AiSettings,
}

impl<'a, D, A, F> FavoriteDocument<'a, D, A, F>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    F: FavoriteRepository + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, document_id: Uuid) -> DocsResult<FavoriteOutcome> {
        let user_id =
            check_favorite_ability(self.docs, self.accesses, actor, document_id, self.ai).await?;
        let changed = self.favorites.add(user_id, document_id).await?;
        Ok(FavoriteOutcome { changed })
    }
}

pub struct UnfavoriteDocument<'a, D, A, F>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    F: FavoriteRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub favorites: &'a F,
    pub ai: AiSettings,
}

impl<'a, D, A, F> UnfavoriteDocument<'a, D, A, F>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    F: FavoriteRepository + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, document_id: Uuid) -> DocsResult<FavoriteOutcome> {
        let user_id =
            check_favorite_ability(self.docs, self.accesses, actor, document_id, self.ai).await?;
        let changed = self.favorites.remove(user_id, document_id).await?;
        Ok(FavoriteOutcome { changed })
    }
}

async fn check_favorite_ability<D, A>(
    docs: &D,
    accesses: &A,
    actor: &Actor,
    document_id: Uuid,
    ai: AiSettings,
) -> DocsResult<Uuid>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    let Some(user_id) = actor.user_id() else {
        return Err(DocsError::Unauthenticated);
    };
    let doc = docs
        .get_by_id(document_id)
        .await?
        .ok_or(DocsError::NotFound)?;
    let resolved = access::resolve(docs, accesses, actor, &doc).await?;
    if !access::can_retrieve(&resolved, &doc) {
        return Err(DocsError::NotFound);
    }
    if !access::abilities(&resolved, actor, &doc, ai).favorite {
        return Err(DocsError::PermissionDenied(
            "you cannot favorite this document".into(),
        ));
    }
    Ok(user_id)
}
