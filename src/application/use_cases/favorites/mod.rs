pub mod favorite_document;
