pub mod abilities;
pub mod accesses;
pub mod documents;
