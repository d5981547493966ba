//! Collaborator contracts the engine is written against.

mod attachments;
mod metadata;
mod row_store;

pub use attachments::AttachmentStore;
pub use metadata::{SchemaProvider, TableMetadataStore};
pub use row_store::{RowPatch, RowPredicate, RowStore, VersionScope};

/// Everything the engine reads and writes through one database connection.
pub trait SyncDatabase: RowStore + TableMetadataStore + SchemaProvider {}

impl<T: RowStore + TableMetadataStore + SchemaProvider + ?Sized> SyncDatabase for T {}
