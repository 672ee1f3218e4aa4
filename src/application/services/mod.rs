pub mod access_count;
pub mod attachments;
pub mod content_cache;
pub mod edit_arbiter;
