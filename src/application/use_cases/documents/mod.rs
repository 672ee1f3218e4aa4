pub mod create_child;
pub mod create_document;
pub mod duplicate_document;
pub mod get_content;
pub mod get_document;
pub mod list_children;
pub mod list_descendants;
pub mod list_trashbin;
pub mod move_document;
pub mod restore_document;
pub mod soft_delete_document;
pub mod update_content;
pub mod update_document;
pub mod update_link_configuration;
