//! # Value Codec
//!
//! Converts a single value between `bson.Value` and [`Bson`], recursing into objects and arrays.
use super::DecodeError;
use bson::{Binary, Bson, DateTime, Document, Regex, Timestamp, oid::ObjectId, spec::BinarySubtype};
use mongo_grpc_proto::pb::bson as wire;
use tracing::warn;
use wire::value::Kind;

/// Regular expression flags accepted by the BSON regex type.
const REGEX_FLAGS: &[char] = &['i', 'l', 'm', 's', 'u', 'x'];

/// Decodes a wire value into its native BSON counterpart.
///
/// A value with no case set is read as [`Bson::Null`].
pub fn decode_value(value: wire::Value) -> Result<Bson, DecodeError> {
    let Some(kind) = value.kind else {
        return Ok(Bson::Null);
    };

    let bson = match kind {
        Kind::Double(v) => Bson::Double(v),
        Kind::String(v) => Bson::String(v),
        Kind::Object(object) => Bson::Document(decode_fields(object.field)?),
        Kind::Array(array) => Bson::Array(
            array
                .element
                .into_iter()
                .map(decode_value)
                .collect::<Result<_, _>>()?,
        ),
        Kind::BinData(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }),
        Kind::ObjectId(id) => Bson::ObjectId(decode_object_id(id)?),
        Kind::Bool(v) => Bson::Boolean(v),
        Kind::Date(date) => Bson::DateTime(DateTime::from_millis(date.milliseconds)),
        Kind::Regex(regex) => Bson::RegularExpression(decode_regex(regex)?),
        Kind::Int(v) => Bson::Int32(v),
        Kind::Timestamp(timestamp) => Bson::Timestamp(Timestamp {
            time: timestamp.seconds,
            increment: timestamp.ordinal,
        }),
        Kind::Long(v) => Bson::Int64(v),
        Kind::Null(_) => Bson::Null,
    };

    Ok(bson)
}

/// Encodes a native BSON value.
///
/// The match arms follow a fixed priority: strings, numbers, booleans, null, binary, arrays,
/// dates, identifiers, embedded documents, then the remaining kinds with a wire case. Anything
/// left has no wire representation and becomes `null`.
pub fn encode_value(value: Bson) -> wire::Value {
    let kind = match value {
        Bson::String(v) => Kind::String(v),
        Bson::Double(v) => Kind::Double(v),
        Bson::Int32(v) => Kind::Int(v),
        Bson::Int64(v) => Kind::Long(v),
        Bson::Boolean(v) => Kind::Bool(v),
        Bson::Null | Bson::Undefined => Kind::Null(wire::Null {}),
        Bson::Binary(binary) => Kind::BinData(binary.bytes),
        Bson::Array(elements) => Kind::Array(wire::Array {
            element: elements.into_iter().map(encode_value).collect(),
        }),
        Bson::DateTime(date) => Kind::Date(wire::Date {
            milliseconds: date.timestamp_millis(),
        }),
        Bson::ObjectId(id) => Kind::ObjectId(encode_object_id(id)),
        Bson::Document(document) => Kind::Object(wire::Object {
            field: encode_fields(document),
        }),
        Bson::RegularExpression(regex) => Kind::Regex(wire::Regex {
            pattern: regex.pattern,
            options: regex.options,
        }),
        Bson::Timestamp(timestamp) => Kind::Timestamp(wire::Timestamp {
            seconds: timestamp.time,
            ordinal: timestamp.increment,
        }),
        unrepresentable => {
            warn!(
                element_type = ?unrepresentable.element_type(),
                value = %unrepresentable,
                "Value has no wire representation, encoding it as null"
            );
            Kind::Null(wire::Null {})
        }
    };

    wire::Value { kind: Some(kind) }
}

/// Parses the canonical hex form of an ObjectId.
pub fn decode_object_id(id: wire::ObjectId) -> Result<ObjectId, DecodeError> {
    ObjectId::parse_str(&id.id)
        .map_err(|source| DecodeError::InvalidIdentifier { value: id.id, source })
}

pub fn encode_object_id(id: ObjectId) -> wire::ObjectId {
    wire::ObjectId { id: id.to_hex() }
}

/// Decodes an ordered list of fields, rejecting repeated keys.
///
/// A field without a value is read as [`Bson::Null`].
pub(crate) fn decode_fields(fields: Vec<wire::Field>) -> Result<Document, DecodeError> {
    let mut document = Document::new();

    for field in fields {
        if document.contains_key(&field.key) {
            return Err(DecodeError::DuplicateKey(field.key));
        }

        let value = field
            .value
            .map(decode_value)
            .transpose()?
            .unwrap_or(Bson::Null);

        document.insert(field.key, value);
    }

    Ok(document)
}

pub(crate) fn encode_fields(document: Document) -> Vec<wire::Field> {
    document
        .into_iter()
        .map(|(key, value)| wire::Field {
            key,
            value: Some(encode_value(value)),
        })
        .collect()
}

// BSON stores regex options in alphabetical order; anything else would not survive a write.
fn decode_regex(regex: wire::Regex) -> Result<Regex, DecodeError> {
    let flags: Vec<char> = regex.options.chars().collect();

    let known = flags.iter().all(|flag| REGEX_FLAGS.contains(flag));
    let ascending = flags.windows(2).all(|pair| pair[0] < pair[1]);

    if !known || !ascending {
        return Err(DecodeError::InvalidRegexOptions(regex.options));
    }

    Ok(Regex {
        pattern: regex.pattern,
        options: regex.options,
    })
}
