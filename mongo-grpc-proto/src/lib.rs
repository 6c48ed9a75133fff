//! # Mongo gRPC Proto
//!
//! Generated Protobuf messages and gRPC bindings for the collection proxy.
//!
//! * [`pb::bson`]: the self-describing value union (`Value`) and the document shape
//!   (`Document`) used to carry schema-free BSON over the wire.
//! * [`pb::mongo`]: the `CollectionProxy` service, its request/response messages, and
//!   both the generated server trait and client.
//!
//! Ordered mappings (objects, documents, queries) are carried as `repeated Field`
//! rather than Protobuf `map`, so key order survives the round trip.

pub mod pb {
    pub mod bson {
        include!(concat!(env!("OUT_DIR"), "/bson.rs"));
    }

    pub mod mongo {
        include!(concat!(env!("OUT_DIR"), "/mongo.rs"));
    }
}

pub use pb::mongo::collection_proxy_client::CollectionProxyClient;
pub use pb::mongo::collection_proxy_server::{CollectionProxy, CollectionProxyServer};
