//! # In-memory Store
//!
//! A [`CollectionStore`] keeping documents in a vector, in insertion order. It mirrors the parts
//! of MongoDB behavior the proxy relies on: generated ObjectId primary keys, unique `_id`,
//! ordered/unordered bulk inserts and key/value equality matching.
use super::{CollectionStore, DocumentCursor, StoreError};
use crate::ID_FIELD;
use bson::{Bson, Document, oid::ObjectId};
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[tonic::async_trait]
impl CollectionStore for MemoryCollection {
    async fn insert_one(&self, document: Document) -> Result<Bson, StoreError> {
        let mut documents = self.documents.write().await;
        insert(&mut documents, document)
    }

    async fn insert_many(
        &self,
        batch: Vec<Document>,
        ordered: bool,
    ) -> Result<Vec<Bson>, StoreError> {
        let mut documents = self.documents.write().await;
        let mut inserted = Vec::with_capacity(batch.len());
        let mut first_failure = None;

        for document in batch {
            match insert(&mut documents, document) {
                Ok(id) => inserted.push(id),
                Err(err) if ordered => return Err(err),
                Err(err) => {
                    first_failure.get_or_insert(err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(inserted),
        }
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| matches(d, &filter)).cloned())
    }

    async fn find(&self, filter: Document) -> Result<DocumentCursor, StoreError> {
        // Snapshot taken under the read lock, the cursor never holds it.
        let found: Vec<Document> = self
            .documents
            .read()
            .await
            .iter()
            .filter(|d| matches(d, &filter))
            .cloned()
            .collect();

        Ok(stream::iter(found.into_iter().map(Ok)).boxed())
    }
}

fn insert(documents: &mut Vec<Document>, document: Document) -> Result<Bson, StoreError> {
    let document = with_primary_key(document);
    let id = document.get(ID_FIELD).cloned().unwrap_or(Bson::Null);

    if documents.iter().any(|d| d.get(ID_FIELD) == Some(&id)) {
        return Err(StoreError::DuplicateKey(format!("{ID_FIELD}: {id}")));
    }

    documents.push(document);
    Ok(id)
}

// Generated keys lead the document, as they do on the server.
fn with_primary_key(document: Document) -> Document {
    if document.contains_key(ID_FIELD) {
        return document;
    }

    let mut keyed = Document::new();
    keyed.insert(ID_FIELD, ObjectId::new());
    for (key, value) in document {
        keyed.insert(key, value);
    }
    keyed
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}
