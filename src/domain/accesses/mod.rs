pub mod access;
pub mod link;
pub mod role;
