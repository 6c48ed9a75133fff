//! # Document Codec
//!
//! Converts whole documents and query filters. The wire document keeps the `_id` primary key in
//! its own `id` field whenever it is an ObjectId; every other field goes through the
//! [value codec](super::value) in document order.
use super::{
    DecodeError,
    value::{decode_fields, decode_object_id, encode_fields, encode_object_id},
};
use crate::ID_FIELD;
use bson::Document;
use mongo_grpc_proto::pb::{bson as wire, mongo::Query};
use tracing::debug;

/// Decodes a wire document.
///
/// The identifier, when present, becomes the leading `_id` field and wins over an `_id` entry
/// found in the generic fields.
pub fn decode_document(document: wire::Document) -> Result<Document, DecodeError> {
    let mut native = Document::new();

    if let Some(id) = document.id {
        native.insert(ID_FIELD, decode_object_id(id)?);
    }

    for (key, value) in decode_fields(document.field)? {
        if key == ID_FIELD && native.contains_key(ID_FIELD) {
            debug!("Ignoring '_id' field shadowed by the document identifier");
            continue;
        }

        native.insert(key, value);
    }

    Ok(native)
}

/// Encodes a native document.
///
/// An ObjectId `_id` is moved to the wire identifier. Any other `_id` cannot be carried there
/// and is kept as a regular field.
pub fn encode_document(mut document: Document) -> wire::Document {
    let id = match document.get_object_id(ID_FIELD) {
        Ok(id) => {
            document.remove(ID_FIELD);
            Some(encode_object_id(id))
        }
        Err(_) => None,
    };

    wire::Document {
        id,
        field: encode_fields(document),
    }
}

/// Decodes a flat equality filter. A missing query matches every document.
pub fn decode_filter(query: Option<Query>) -> Result<Document, DecodeError> {
    match query {
        Some(query) => decode_fields(query.field),
        None => Ok(Document::new()),
    }
}
