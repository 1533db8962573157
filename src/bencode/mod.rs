//! Bencode codec: a tagged value tree, a streaming-compatible decoder and
//! encoder over that tree, and a schema-driven binder that maps the tree onto
//! typed records.
//!
//! Bencode is the BitTorrent binary encoding (BEP-3): integers `i<n>e`, byte
//! strings `<len>:<bytes>`, lists `l<items>e`, and dictionaries `d<pairs>e`
//! with keys sorted in ascending byte-lexicographic order.
use std::collections::BTreeMap;
use thiserror::Error;

pub mod decoder;
pub mod encoder;
pub mod schema;

pub use decoder::decode;
pub use encoder::encode;
pub use schema::{marshal, unmarshal, BencodeRecord, BencodeSchema};

/// A decoded (or to-be-encoded) bencode value.
///
/// `Dict` is a `BTreeMap` rather than a `HashMap` so that ascending
/// byte-lexicographic key order — the canonicality invariant BEP-3 requires
/// of dictionaries — falls out of the type rather than needing to be
/// reasserted at every call site that builds one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum BencodeValue {
    Integer(i64),
    ByteString(Vec<u8>),
    List(Vec<BencodeValue>),
    Dict(BTreeMap<Vec<u8>, BencodeValue>),
}

impl BencodeValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BencodeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_byte_string(&self) -> Option<&[u8]> {
        match self {
            BencodeValue::ByteString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BencodeValue]> {
        match self {
            BencodeValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, BencodeValue>> {
        match self {
            BencodeValue::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// Error taxonomy shared by the decoder, encoder, and schema binder.
///
/// Kinds follow the bencode wire format boundary (`EmptyInput` through
/// `DictMalformed`) and the schema/torrent boundary (`TypeMismatch` and
/// `InvalidTarget`); `UnsupportedType`/`NullValue` belong to the encoder's
/// contract over a fully generic value, which `BencodeValue` never actually
/// produces, but the binder's `Marshal` can hit them when fed a target whose
/// shape doesn't fit the model.
#[derive(Debug, Error)]
pub enum BencodeError {
    #[error("empty input")]
    EmptyInput,

    #[error("malformed integer: {0}")]
    IntegerMalformed(String),

    #[error("malformed string: {0}")]
    StringMalformed(String),

    #[error("malformed list: {0}")]
    ListMalformed(String),

    #[error("malformed dict: {0}")]
    DictMalformed(String),

    #[error("type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unmarshal/marshal target is not a record")]
    InvalidTarget,

    #[error("unsupported type for encoding")]
    UnsupportedType,

    #[error("no value to encode")]
    NullValue,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BencodeResult<T> = std::result::Result<T, BencodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        assert_eq!(BencodeValue::Integer(5).as_integer(), Some(5));
        assert_eq!(
            BencodeValue::ByteString(b"hi".to_vec()).as_byte_string(),
            Some(&b"hi"[..])
        );
        assert!(BencodeValue::Integer(5).as_byte_string().is_none());
    }
}
