pub mod access_repository;
pub mod ask_access_repository;
pub mod cache_port;
pub mod collaboration_port;
pub mod document_repository;
pub mod favorite_repository;
pub mod invitation_repository;
pub mod link_trace_repository;
pub mod object_store_port;
