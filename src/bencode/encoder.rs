//! Bencode encoder: total over well-formed `BencodeValue`s, canonical by
//! construction since `BencodeValue::Dict` is a `BTreeMap` and iterating it
//! already yields ascending byte-lexicographic key order.
use super::{BencodeResult, BencodeValue};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::instrument;

#[instrument(skip(writer, s), level = "trace")]
fn encode_string<W: Write>(writer: &mut W, s: &[u8]) -> BencodeResult<()> {
    write!(writer, "{}:", s.len())?;
    writer.write_all(s)?;
    Ok(())
}

#[instrument(skip(writer), level = "trace")]
fn encode_integer<W: Write>(writer: &mut W, i: i64) -> BencodeResult<()> {
    write!(writer, "i{i}e")?;
    Ok(())
}

#[instrument(skip(writer, list), level = "trace")]
fn encode_list<W: Write>(writer: &mut W, list: &[BencodeValue]) -> BencodeResult<()> {
    writer.write_all(b"l")?;
    for item in list {
        encode_value(writer, item)?;
    }
    writer.write_all(b"e")?;
    Ok(())
}

#[instrument(skip(writer, dict), level = "trace")]
fn encode_dict<W: Write>(writer: &mut W, dict: &BTreeMap<Vec<u8>, BencodeValue>) -> BencodeResult<()> {
    writer.write_all(b"d")?;
    for (key, value) in dict {
        encode_string(writer, key)?;
        encode_value(writer, value)?;
    }
    writer.write_all(b"e")?;
    Ok(())
}

#[instrument(skip(writer), level = "trace")]
fn encode_value<W: Write>(writer: &mut W, value: &BencodeValue) -> BencodeResult<()> {
    match value {
        BencodeValue::Integer(i) => encode_integer(writer, *i),
        BencodeValue::ByteString(s) => encode_string(writer, s),
        BencodeValue::List(list) => encode_list(writer, list),
        BencodeValue::Dict(dict) => encode_dict(writer, dict),
    }
}

/// Encodes `value` into canonical bencoded bytes.
#[instrument(skip(value), level = "debug")]
pub fn encode(value: &BencodeValue) -> BencodeResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_value(&mut buffer, value)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::decoder::decode;

    #[test]
    fn encodes_each_variant() {
        assert_eq!(encode(&BencodeValue::Integer(42)).unwrap(), b"i42e");
        assert_eq!(
            encode(&BencodeValue::ByteString(b"spam".to_vec())).unwrap(),
            b"4:spam"
        );
        assert_eq!(
            encode(&BencodeValue::List(vec![
                BencodeValue::Integer(1),
                BencodeValue::ByteString(b"hi".to_vec())
            ]))
            .unwrap(),
            b"li1e2:hie"
        );
    }

    #[test]
    fn dict_keys_are_emitted_in_ascending_order() {
        let mut dict = BTreeMap::new();
        dict.insert(b"zebra".to_vec(), BencodeValue::Integer(1));
        dict.insert(b"apple".to_vec(), BencodeValue::Integer(2));
        let encoded = encode(&BencodeValue::Dict(dict)).unwrap();
        assert_eq!(encoded, b"d5:applei2e5:zebrai1ee");
    }

    #[test]
    fn round_trips_decode_then_encode_on_canonical_input() {
        let input = b"d8:announce14:http://tracker3:foo5:hello4:infod5:filesld6:lengthi12345e4:pathl8:filenameeee4:name8:testfile12:piece lengthi16384e6:pieces20:12345678901234567890ee";
        let value = decode(input).unwrap();
        let round_tripped = encode(&value).unwrap();
        assert_eq!(round_tripped, input);
    }

    #[test]
    fn round_trips_encode_then_decode() {
        let mut inner = BTreeMap::new();
        inner.insert(b"a".to_vec(), BencodeValue::Integer(1));
        let value = BencodeValue::List(vec![BencodeValue::Dict(inner), BencodeValue::Integer(-7)]);
        let encoded = encode(&value).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, value);
    }
}
