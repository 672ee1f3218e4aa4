pub mod access_repository_sqlx;
pub mod ask_access_repository_sqlx;
pub mod document_repository_sqlx;
pub mod favorite_repository_sqlx;
pub mod invitation_repository_sqlx;
pub mod link_trace_repository_sqlx;
