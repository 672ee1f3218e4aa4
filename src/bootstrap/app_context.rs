use std::sync::Arc;

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::ask_access_repository::AskForAccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::favorite_repository::FavoriteRepository;
use crate::application::ports::invitation_repository::InvitationRepository;
use crate::application::ports::link_trace_repository::LinkTraceRepository;
use crate::application::ports::object_store_port::ObjectStorePort;
use crate::application::services::content_cache::ContentCache;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    document_repo: Arc<dyn DocumentRepository>,
    access_repo: Arc<dyn AccessRepository>,
    favorite_repo: Arc<dyn FavoriteRepository>,
    link_trace_repo: Arc<dyn LinkTraceRepository>,
    invitation_repo: Arc<dyn InvitationRepository>,
    ask_access_repo: Arc<dyn AskForAccessRepository>,
    cache: Arc<dyn CachePort>,
    object_store: Arc<dyn ObjectStorePort>,
    collaboration: Arc<dyn CollaborationPort>,
    content_cache: Arc<ContentCache>,
}

impl AppServices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        access_repo: Arc<dyn AccessRepository>,
        favorite_repo: Arc<dyn FavoriteRepository>,
        link_trace_repo: Arc<dyn LinkTraceRepository>,
        invitation_repo: Arc<dyn InvitationRepository>,
        ask_access_repo: Arc<dyn AskForAccessRepository>,
        cache: Arc<dyn CachePort>,
        object_store: Arc<dyn ObjectStorePort>,
        collaboration: Arc<dyn CollaborationPort>,
    ) -> Self {
        Self {
            document_repo,
            access_repo,
            favorite_repo,
            link_trace_repo,
            invitation_repo,
            ask_access_repo,
            cache,
            object_store,
            collaboration,
            content_cache: Arc::new(ContentCache::new()),
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        self.services.document_repo.clone()
    }

    pub fn access_repo(&self) -> Arc<dyn AccessRepository> {
        self.services.access_repo.clone()
    }

    pub fn favorite_repo(&self) -> Arc<dyn FavoriteRepository> {
        self.services.favorite_repo.clone()
    }

    pub fn link_trace_repo(&self) -> Arc<dyn LinkTraceRepository> {
        self.services.link_trace_repo.clone()
    }

    pub fn invitation_repo(&self) -> Arc<dyn InvitationRepository> {
        self.services.invitation_repo.clone()
    }

    pub fn ask_access_repo(&self) -> Arc<dyn AskForAccessRepository> {
        self.services.ask_access_repo.clone()
    }

    pub fn cache(&self) -> Arc<dyn CachePort> {
        self.services.cache.clone()
    }

    pub fn object_store(&self) -> Arc<dyn ObjectStorePort> {
        self.services.object_store.clone()
    }

    pub fn collaboration(&self) -> Arc<dyn CollaborationPort> {
        self.services.collaboration.clone()
    }

    pub fn content_cache(&self) -> Arc<ContentCache> {
        self.services.content_cache.clone()
    }
}
