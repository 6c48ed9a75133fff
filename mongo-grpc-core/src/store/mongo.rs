//! # MongoDB Store
//!
//! [`CollectionStore`] backed by a `mongodb::Collection`. The driver owns connection pooling,
//! retries and timeouts; this module only maps calls and errors.
use super::{CollectionStore, DocumentCursor, StoreError};
use bson::{Bson, Document};
use futures_util::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection,
    error::{Error, ErrorKind, WriteFailure},
};

/// Server error code reported for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoCollection {
    collection: Collection<Document>,
}

impl MongoCollection {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Connects to `uri` and binds `database.collection`.
    ///
    /// The driver connects lazily, so a ping is issued to surface unreachable deployments here
    /// rather than on the first call.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);

        database.run_command(bson::doc! { "ping": 1 }).await?;

        Ok(Self::new(database.collection(collection)))
    }
}

#[tonic::async_trait]
impl CollectionStore for MongoCollection {
    async fn insert_one(&self, document: Document) -> Result<Bson, StoreError> {
        let result = self.collection.insert_one(document).await?;
        Ok(result.inserted_id)
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        ordered: bool,
    ) -> Result<Vec<Bson>, StoreError> {
        let result = self
            .collection
            .insert_many(documents)
            .ordered(ordered)
            .await?;

        // The driver reports ids keyed by input index
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        Ok(self.collection.find_one(filter).await?)
    }

    async fn find(&self, filter: Document) -> Result<DocumentCursor, StoreError> {
        let cursor = self.collection.find(filter).await?;
        Ok(cursor.map_err(StoreError::from).boxed())
    }
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        let duplicate = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
                duplicate_key_message([(write_error.code, write_error.message.as_str())])
            }
            ErrorKind::InsertMany(insert_error) => duplicate_key_message(
                insert_error
                    .write_errors
                    .iter()
                    .flatten()
                    .map(|write_error| (write_error.code, write_error.message.as_str())),
            ),
            _ => None,
        };

        match duplicate {
            Some(message) => StoreError::DuplicateKey(message),
            None => StoreError::Backend(err.to_string()),
        }
    }
}

/// Picks the first unique index violation out of a set of `(code, message)` write errors.
fn duplicate_key_message<'a>(errors: impl IntoIterator<Item = (i32, &'a str)>) -> Option<String> {
    errors
        .into_iter()
        .find(|(code, _)| *code == DUPLICATE_KEY_CODE)
        .map(|(_, message)| message.to_string())
}
