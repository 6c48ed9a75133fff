//! # Collection Store
//!
//! The proxy does not talk to a database directly. It drives a [`CollectionStore`], a single
//! collection seen through the four operations the gRPC surface needs. Implementations are
//! shared between concurrent calls and are the only synchronization authority; the proxy adds
//! no locking of its own.
//!
//! * [`memory::MemoryCollection`]: in-process store with MongoDB insert/lookup semantics.
//! * `mongo::MongoCollection` (feature `mongodb`): backed by the official MongoDB driver.
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

use bson::{Bson, Document};
use futures_util::stream::BoxStream;

/// Pull based sequence of documents produced by [`CollectionStore::find`].
///
/// Dropping the cursor releases it.
pub type DocumentCursor = BoxStream<'static, Result<Document, StoreError>>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate key error: {0}")]
    DuplicateKey(String),
    #[error("Store operation failed: {0}")]
    Backend(String),
}

#[tonic::async_trait]
pub trait CollectionStore: Send + Sync + 'static {
    /// Inserts a document and returns its primary key, assigning an ObjectId when `_id` is absent.
    async fn insert_one(&self, document: Document) -> Result<Bson, StoreError>;

    /// Inserts documents and returns their primary keys in input order.
    ///
    /// When `ordered` is true the store stops at the first failure; otherwise it keeps going and
    /// reports the first failure once every document was attempted.
    async fn insert_many(
        &self,
        documents: Vec<Document>,
        ordered: bool,
    ) -> Result<Vec<Bson>, StoreError>;

    /// Returns the first document matching the equality filter.
    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError>;

    /// Opens a cursor over every document matching the equality filter.
    async fn find(&self, filter: Document) -> Result<DocumentCursor, StoreError>;
}
