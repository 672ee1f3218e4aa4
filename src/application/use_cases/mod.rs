pub mod accesses;
pub mod ask_access;
pub mod attachments;
pub mod documents;
pub mod favorites;
pub mod invitations;
pub mod link_traces;
pub mod versions;
