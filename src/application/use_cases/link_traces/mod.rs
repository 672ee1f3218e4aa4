pub mod mask_document;
