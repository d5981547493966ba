pub mod metadata_ops;
pub mod row_ops;
