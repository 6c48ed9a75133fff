//! Shared fixtures for the service level tests.
#![allow(dead_code)]

use futures_util::{StreamExt, stream};
use mongo_grpc_core::{
    bson::{Bson, Document, doc},
    proto::{
        CollectionProxyClient, CollectionProxyServer,
        pb::{
            bson::{self as wire, value::Kind},
            mongo::{FindRequest, Query},
        },
    },
    service::CollectionProxyService,
    store::{CollectionStore, DocumentCursor, StoreError, memory::MemoryCollection},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub type TestClient<S> = CollectionProxyClient<CollectionProxyServer<CollectionProxyService<S>>>;

/// In-process client talking to a proxy over a fresh in-memory collection.
pub fn setup() -> (TestClient<MemoryCollection>, MemoryCollection) {
    let store = MemoryCollection::new();
    let client = client_for(store.clone());
    (client, store)
}

pub fn client_for<S: CollectionStore>(store: S) -> TestClient<S> {
    let service = CollectionProxyService::new(Arc::new(store)).with_stream_capacity(2);
    CollectionProxyClient::new(service.into_server())
}

pub fn value(kind: Kind) -> wire::Value {
    wire::Value { kind: Some(kind) }
}

pub fn string(value: &str) -> wire::Value {
    self::value(Kind::String(value.to_string()))
}

pub fn field(key: &str, value: wire::Value) -> wire::Field {
    wire::Field {
        key: key.to_string(),
        value: Some(value),
    }
}

pub fn find_request(fields: Vec<wire::Field>) -> FindRequest {
    FindRequest {
        query: Some(Query { field: fields }),
    }
}

pub fn id_request(id: &wire::ObjectId) -> FindRequest {
    find_request(vec![field("_id", value(Kind::ObjectId(id.clone())))])
}

/// Returns the string stored under `key` in a wire document.
pub fn string_field<'a>(document: &'a wire::Document, key: &str) -> Option<&'a str> {
    document
        .field
        .iter()
        .find(|f| f.key == key)
        .and_then(|f| match f.value.as_ref()?.kind.as_ref()? {
            Kind::String(s) => Some(s.as_str()),
            _ => None,
        })
}

/// Store whose `find` replays a fixed script of cursor items, optionally never ending.
///
/// `released` flips once the cursor has been dropped.
#[derive(Clone)]
pub struct ScriptedStore {
    script: Vec<Result<Document, StoreError>>,
    endless: bool,
    pub released: Arc<AtomicBool>,
}

impl ScriptedStore {
    pub fn new(script: Vec<Result<Document, StoreError>>) -> Self {
        Self {
            script,
            endless: false,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(vec![])
        }
    }
}

struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[mongo_grpc_core::tonic::async_trait]
impl CollectionStore for ScriptedStore {
    async fn insert_one(&self, _document: Document) -> Result<Bson, StoreError> {
        Err(StoreError::Backend("read only".to_string()))
    }

    async fn insert_many(
        &self,
        _documents: Vec<Document>,
        _ordered: bool,
    ) -> Result<Vec<Bson>, StoreError> {
        Err(StoreError::Backend("read only".to_string()))
    }

    async fn find_one(&self, _filter: Document) -> Result<Option<Document>, StoreError> {
        Ok(None)
    }

    async fn find(&self, _filter: Document) -> Result<DocumentCursor, StoreError> {
        let guard = ReleaseGuard(self.released.clone());

        if self.endless {
            let cursor = stream::unfold((0_i64, guard), |(seq, guard)| async move {
                Some((Ok::<_, StoreError>(doc! { "seq": seq }), (seq + 1, guard)))
            });
            return Ok(cursor.boxed());
        }

        let cursor = stream::iter(self.script.clone()).map(move |item| {
            let _guard = &guard;
            item
        });
        Ok(cursor.boxed())
    }
}
