//! # Collection Proxy Service
//!
//! Implements the `mongo.CollectionProxy` gRPC service on top of a [`CollectionStore`].
//!
//! Every call follows the same path: decode the request with the [codec](crate::codec), await the
//! store once, encode the result. `Find` hands its cursor to the [stream bridge](crate::stream).
//! Failures are local to the call and map to a `tonic::Status` through [`ProxyError`]; nothing
//! is retried here.
use crate::{
    codec::{
        DecodeError, decode_document, decode_filter, encode_document, value::encode_object_id,
    },
    store::{CollectionStore, StoreError},
    stream::{self, DEFAULT_STREAM_CAPACITY, DocumentStream},
};
use bson::Bson;
use mongo_grpc_proto::{
    CollectionProxy, CollectionProxyServer,
    pb::{
        bson as wire,
        mongo::{
            FindRequest, InsertManyRequest, InsertManyResponse, InsertOneRequest,
            InsertOneResponse,
        },
    },
};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, error, warn};

/// Errors that can end a proxied call.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid request: {0}")]
    Decode(#[from] DecodeError),
    #[error("No document sent")]
    MissingDocument,
    #[error("Write failed: {0}")]
    StoreWrite(#[source] StoreError),
    #[error("Read failed: {0}")]
    StoreRead(#[source] StoreError),
    #[error("No document matches the query")]
    NotFound,
    #[error("Cursor failed: {0}")]
    Stream(#[source] StoreError),
    #[error("The write was applied but the store assigned a non ObjectId key: {0}")]
    UnrepresentableIdentifier(Bson),
}

impl From<ProxyError> for Status {
    fn from(err: ProxyError) -> Self {
        let message = err.to_string();

        match err {
            ProxyError::Decode(_) | ProxyError::MissingDocument => {
                Status::invalid_argument(message)
            }
            ProxyError::StoreWrite(StoreError::DuplicateKey(_)) => Status::already_exists(message),
            ProxyError::NotFound => Status::not_found(message),
            ProxyError::StoreWrite(_)
            | ProxyError::StoreRead(_)
            | ProxyError::Stream(_)
            | ProxyError::UnrepresentableIdentifier(_) => Status::internal(message),
        }
    }
}

/// The `mongo.CollectionProxy` service bound to one collection.
#[derive(Debug)]
pub struct CollectionProxyService<S> {
    store: Arc<S>,
    stream_capacity: usize,
}

impl<S> Clone for CollectionProxyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            stream_capacity: self.stream_capacity,
        }
    }
}

impl<S: CollectionStore> CollectionProxyService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }

    /// Sets how many encoded documents a `Find` stream may buffer ahead of the consumer.
    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }

    /// Wraps the service into the generated tonic server.
    pub fn into_server(self) -> CollectionProxyServer<Self> {
        CollectionProxyServer::new(self)
    }

    async fn insert_one_document(
        &self,
        request: InsertOneRequest,
    ) -> Result<InsertOneResponse, ProxyError> {
        let document = request.document.ok_or(ProxyError::MissingDocument)?;
        let document = decode_document(document)?;
        debug!(fields = document.len(), "InsertOne");

        let inserted_id = self
            .store
            .insert_one(document)
            .await
            .map_err(ProxyError::StoreWrite)?;

        Ok(InsertOneResponse {
            acknowledged: true,
            inserted_id: Some(inserted_object_id(inserted_id)?),
        })
    }

    async fn insert_many_documents(
        &self,
        request: InsertManyRequest,
    ) -> Result<InsertManyResponse, ProxyError> {
        let documents = request
            .document
            .into_iter()
            .map(decode_document)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            documents = documents.len(),
            ordered = request.ordered,
            "InsertMany"
        );

        let inserted_ids = self
            .store
            .insert_many(documents, request.ordered)
            .await
            .map_err(ProxyError::StoreWrite)?;

        Ok(InsertManyResponse {
            acknowledged: true,
            inserted_id: inserted_ids
                .into_iter()
                .map(inserted_object_id)
                .collect::<Result<_, _>>()?,
        })
    }

    async fn find_one_document(&self, request: FindRequest) -> Result<wire::Document, ProxyError> {
        let filter = decode_filter(request.query)?;
        debug!(%filter, "FindOne");

        self.store
            .find_one(filter)
            .await
            .map_err(ProxyError::StoreRead)?
            .map(encode_document)
            .ok_or(ProxyError::NotFound)
    }

    async fn open_stream(&self, request: FindRequest) -> Result<DocumentStream, ProxyError> {
        let filter = decode_filter(request.query)?;
        debug!(%filter, "Find");

        let cursor = self
            .store
            .find(filter)
            .await
            .map_err(ProxyError::StoreRead)?;

        Ok(stream::bridge(cursor, self.stream_capacity))
    }
}

fn inserted_object_id(id: Bson) -> Result<wire::ObjectId, ProxyError> {
    match id {
        Bson::ObjectId(id) => Ok(encode_object_id(id)),
        other => Err(ProxyError::UnrepresentableIdentifier(other)),
    }
}

/// Logs a failed call and converts it to a status.
fn reject(method: &str, err: ProxyError) -> Status {
    match &err {
        ProxyError::NotFound => debug!(method, "{err}"),
        ProxyError::Decode(_) | ProxyError::MissingDocument => warn!(method, "{err}"),
        _ => error!(method, "{err}"),
    }

    Status::from(err)
}

#[tonic::async_trait]
impl<S: CollectionStore> CollectionProxy for CollectionProxyService<S> {
    type FindStream = DocumentStream;

    async fn insert_one(
        &self,
        request: Request<InsertOneRequest>,
    ) -> Result<Response<InsertOneResponse>, Status> {
        self.insert_one_document(request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| reject("InsertOne", err))
    }

    async fn insert_many(
        &self,
        request: Request<InsertManyRequest>,
    ) -> Result<Response<InsertManyResponse>, Status> {
        self.insert_many_documents(request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| reject("InsertMany", err))
    }

    async fn find_one(
        &self,
        request: Request<FindRequest>,
    ) -> Result<Response<wire::Document>, Status> {
        self.find_one_document(request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| reject("FindOne", err))
    }

    async fn find(
        &self,
        request: Request<FindRequest>,
    ) -> Result<Response<Self::FindStream>, Status> {
        self.open_stream(request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| reject("Find", err))
    }
}
