//! # BSON <-> Protobuf Codec
//!
//! Conversion between the native BSON data model ([`bson::Bson`], [`bson::Document`]) and the
//! wire representation generated from `bson.proto`.
//!
//! The wire `Value` is a closed `oneof`: exactly one case is set and the case is found by
//! presence, there is no separate discriminant. BSON on the other hand is an open set of element
//! types, so the two directions are not symmetric:
//!
//! * **Decoding** is fallible. An identifier that is not 24 hex characters, an unknown regex flag
//!   or a repeated key is rejected with a [`DecodeError`].
//! * **Encoding** never fails. BSON types without a wire case are logged and sent as `null`.
pub mod document;
pub mod value;

pub use document::{decode_document, decode_filter, encode_document};
pub use value::{decode_value, encode_value};

/// Errors raised while turning wire values into BSON.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid ObjectId '{value}': {source}")]
    InvalidIdentifier {
        value: String,
        source: bson::oid::Error,
    },
    #[error("Invalid regular expression options '{0}', expected flags out of 'ilmsux' in alphabetical order")]
    InvalidRegexOptions(String),
    #[error("Duplicate key '{0}'")]
    DuplicateKey(String),
}
