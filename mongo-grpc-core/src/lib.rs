//! # Mongo gRPC Core
//!
//! `mongo-grpc-core` is the library behind the `mongo-grpc-proxy` binary. It exposes a single
//! MongoDB collection over gRPC, translating between schema-free BSON documents and the closed
//! `bson.Value` Protobuf union defined in `mongo-grpc-proto`.
//!
//! ## Key Components
//!
//! * **[`codec`]:** The recursive BSON <-> Protobuf value codec and the document codec built on top
//!   of it. Decoding rejects malformed input with a [`codec::DecodeError`]; encoding is total and
//!   degrades values with no wire representation to `null`.
//! * **[`store::CollectionStore`]:** The seam to the document store. The proxy only needs
//!   `insert_one`, `insert_many`, `find_one` and a cursor producing `find`.
//!   [`store::memory::MemoryCollection`] is an in-process implementation; with the `mongodb`
//!   feature enabled, `store::mongo::MongoCollection` talks to a real deployment.
//! * **[`service::CollectionProxyService`]:** The `mongo.CollectionProxy` gRPC service.
//! * **[`stream`]:** The bridge turning a pull based store cursor into a server stream with
//!   backpressure and cancellation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mongo_grpc_core::{service::CollectionProxyService, store::memory::MemoryCollection};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryCollection::default());
//! let server = CollectionProxyService::new(store).into_server();
//!
//! mongo_grpc_core::tonic::transport::Server::builder()
//!     .add_service(server)
//!     .serve("127.0.0.1:50051".parse()?)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! * `mongodb`: Enables the MongoDB driver backed store.
pub mod codec;
pub mod service;
pub mod store;
pub mod stream;

// Re-exports
pub use bson;
pub use mongo_grpc_proto as proto;
pub use tonic;

/// Name of the primary key field of every stored document.
pub const ID_FIELD: &str = "_id";
