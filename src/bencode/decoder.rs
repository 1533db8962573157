//! Single-pass, index-threaded bencode decoder.
//!
//! Each sub-parser takes `(input: &[u8], pos: usize)` and returns the index
//! just past the element it consumed together with the decoded value. This
//! keeps the decoder allocation-light and makes the recursive descent over
//! nested lists/dicts straightforward: a container just keeps re-feeding the
//! returned `pos` back into `decode_value`.
use super::{BencodeError, BencodeResult, BencodeValue};
use std::collections::BTreeMap;
use tracing::instrument;

/// Decodes a complete bencoded value from `input`.
///
/// A bare top-level `Integer` or `ByteString` must consume the entire input;
/// anything left over is reported as a malformed string (length/body
/// mismatch) to match the wire-level contract in spec §4.1. Containers
/// (`List`/`Dict`) terminate at their own matching `'e'` and likewise may not
/// leave unconsumed trailing bytes — bencode has no "documents" concept, one
/// top-level element is the whole input.
#[instrument(skip(input), level = "debug")]
pub fn decode(input: &[u8]) -> BencodeResult<BencodeValue> {
    if input.is_empty() {
        return Err(BencodeError::EmptyInput);
    }

    let (pos, value) = decode_value(input, 0)?;
    if pos != input.len() {
        return Err(BencodeError::StringMalformed(
            "trailing bytes after top-level value".to_string(),
        ));
    }
    Ok(value)
}

#[instrument(skip(input), level = "trace")]
fn decode_value(input: &[u8], pos: usize) -> BencodeResult<(usize, BencodeValue)> {
    match input.get(pos) {
        Some(b'i') => {
            let (next, v) = decode_integer(input, pos)?;
            Ok((next, BencodeValue::Integer(v)))
        }
        Some(b'l') => {
            let (next, v) = decode_list(input, pos)?;
            Ok((next, BencodeValue::List(v)))
        }
        Some(b'd') => {
            let (next, v) = decode_dict(input, pos)?;
            Ok((next, BencodeValue::Dict(v)))
        }
        Some(b'0'..=b'9') => {
            let (next, v) = decode_string(input, pos)?;
            Ok((next, BencodeValue::ByteString(v)))
        }
        Some(other) => Err(BencodeError::StringMalformed(format!(
            "unexpected leading byte {:?} at offset {pos}",
            *other as char
        ))),
        None => Err(BencodeError::EmptyInput),
    }
}

/// Decodes `<len>:<bytes>` starting at `pos`.
#[instrument(skip(input), level = "trace")]
fn decode_string(input: &[u8], pos: usize) -> BencodeResult<(usize, Vec<u8>)> {
    let colon = find(input, pos, b':').ok_or_else(|| {
        BencodeError::StringMalformed(format!("no length prefix (missing ':') at offset {pos}"))
    })?;

    let len_str = std::str::from_utf8(&input[pos..colon])
        .map_err(|_| BencodeError::StringMalformed("length prefix is not ASCII".to_string()))?;
    let length: usize = len_str
        .parse()
        .map_err(|_| BencodeError::StringMalformed(format!("length prefix not numeric: {len_str:?}")))?;

    let start = colon + 1;
    let end = start
        .checked_add(length)
        .ok_or_else(|| BencodeError::StringMalformed("declared length overflows".to_string()))?;
    if end > input.len() {
        return Err(BencodeError::StringMalformed(format!(
            "declared length {length} exceeds remaining input"
        )));
    }

    Ok((end, input[start..end].to_vec()))
}

/// Decodes `i<decimal>e` starting at `pos`. Rejects leading zeros, `-0`, a
/// leading `+`, and empty bodies per BEP-3 (the source this spec was
/// distilled from accepted all of these; see DESIGN.md).
#[instrument(skip(input), level = "trace")]
fn decode_integer(input: &[u8], pos: usize) -> BencodeResult<(usize, i64)> {
    if input.get(pos) != Some(&b'i') {
        return Err(BencodeError::IntegerMalformed(format!(
            "expected 'i' at offset {pos}"
        )));
    }
    let end = find(input, pos + 1, b'e')
        .ok_or_else(|| BencodeError::IntegerMalformed("missing terminating 'e'".to_string()))?;

    let body = &input[pos + 1..end];
    if body.len() < 1 {
        return Err(BencodeError::IntegerMalformed("empty integer body".to_string()));
    }
    let digits = if body[0] == b'-' { &body[1..] } else { body };
    if digits.is_empty() {
        return Err(BencodeError::IntegerMalformed("missing digits".to_string()));
    }
    if digits[0] == b'0' && digits.len() > 1 {
        return Err(BencodeError::IntegerMalformed(
            "leading zeros are not permitted".to_string(),
        ));
    }
    if body == b"-0" {
        return Err(BencodeError::IntegerMalformed(
            "negative zero is not permitted".to_string(),
        ));
    }
    if body[0] == b'+' {
        return Err(BencodeError::IntegerMalformed(
            "explicit '+' sign is not permitted".to_string(),
        ));
    }

    let body_str = std::str::from_utf8(body)
        .map_err(|_| BencodeError::IntegerMalformed("integer body is not ASCII".to_string()))?;
    let value = body_str
        .parse::<i64>()
        .map_err(|_| BencodeError::IntegerMalformed(format!("not a valid i64: {body_str:?}")))?;

    Ok((end + 1, value))
}

/// Decodes `l<elements>e` starting at `pos`.
#[instrument(skip(input), level = "trace")]
fn decode_list(input: &[u8], pos: usize) -> BencodeResult<(usize, Vec<BencodeValue>)> {
    if input.get(pos) != Some(&b'l') {
        return Err(BencodeError::ListMalformed(format!(
            "expected 'l' at offset {pos}"
        )));
    }
    let mut cursor = pos + 1;
    let mut items = Vec::new();

    loop {
        match input.get(cursor) {
            Some(b'e') => return Ok((cursor + 1, items)),
            Some(_) => {
                let (next, value) = decode_value(input, cursor)
                    .map_err(|e| BencodeError::ListMalformed(format!("element at offset {cursor}: {e}")))?;
                items.push(value);
                cursor = next;
            }
            None => {
                return Err(BencodeError::ListMalformed(
                    "unterminated list (ran out of input before 'e')".to_string(),
                ))
            }
        }
    }
}

/// Decodes `d(<key><value>)*e` starting at `pos`.
///
/// Keys must be byte strings, unique, and appear in strictly ascending
/// byte-lexicographic order; any violation is reported as `DictMalformed`
/// (spec §4.1 resolves the "is ordering enforced?" open question in favor of
/// yes — see DESIGN.md).
#[instrument(skip(input), level = "trace")]
fn decode_dict(input: &[u8], pos: usize) -> BencodeResult<(usize, BTreeMap<Vec<u8>, BencodeValue>)> {
    if input.get(pos) != Some(&b'd') {
        return Err(BencodeError::DictMalformed(format!(
            "expected 'd' at offset {pos}"
        )));
    }
    let mut cursor = pos + 1;
    let mut dict = BTreeMap::new();
    let mut last_key: Option<Vec<u8>> = None;

    loop {
        match input.get(cursor) {
            Some(b'e') => return Ok((cursor + 1, dict)),
            Some(b'0'..=b'9') => {
                let (after_key, key) = decode_string(input, cursor)
                    .map_err(|e| BencodeError::DictMalformed(format!("invalid key at offset {cursor}: {e}")))?;
                if let Some(prev) = &last_key {
                    if key <= *prev {
                        return Err(BencodeError::DictMalformed(format!(
                            "keys out of order or duplicated: {:?} did not strictly follow {:?}",
                            String::from_utf8_lossy(&key),
                            String::from_utf8_lossy(prev)
                        )));
                    }
                }
                let (after_value, value) = decode_value(input, after_key).map_err(|e| {
                    BencodeError::DictMalformed(format!(
                        "invalid value for key {:?}: {e}",
                        String::from_utf8_lossy(&key)
                    ))
                })?;
                dict.insert(key.clone(), value);
                last_key = Some(key);
                cursor = after_value;
            }
            Some(other) => {
                return Err(BencodeError::DictMalformed(format!(
                    "dict key must be a byte string, found {:?} at offset {cursor}",
                    *other as char
                )))
            }
            None => {
                return Err(BencodeError::DictMalformed(
                    "unterminated dict (ran out of input before 'e')".to_string(),
                ))
            }
        }
    }
}

fn find(input: &[u8], from: usize, needle: u8) -> Option<usize> {
    input[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integer() {
        assert_eq!(decode(b"i128e").unwrap(), BencodeValue::Integer(128));
        assert_eq!(decode(b"i0e").unwrap(), BencodeValue::Integer(0));
        assert_eq!(decode(b"i-42e").unwrap(), BencodeValue::Integer(-42));
    }

    #[test]
    fn rejects_malformed_integers() {
        assert!(decode(b"i128").is_err());
        assert!(decode(b"i-0e").is_err());
        assert!(decode(b"i03e").is_err());
        assert!(decode(b"i+1e").is_err());
        assert!(decode(b"ie").is_err());
    }

    #[test]
    fn decodes_strings_including_disambiguated_leading_bytes() {
        assert_eq!(
            decode(b"4:spam").unwrap(),
            BencodeValue::ByteString(b"spam".to_vec())
        );
        assert_eq!(decode(b"0:").unwrap(), BencodeValue::ByteString(vec![]));
        assert_eq!(
            decode(b"1:i").unwrap(),
            BencodeValue::ByteString(b"i".to_vec())
        );
        assert!(decode(b"3:spam").is_err());
        assert!(decode(b"5:spam").is_err());
    }

    #[test]
    fn decodes_lists() {
        assert_eq!(decode(b"le").unwrap(), BencodeValue::List(vec![]));
        assert_eq!(
            decode(b"li1ei2ei3ee").unwrap(),
            BencodeValue::List(vec![
                BencodeValue::Integer(1),
                BencodeValue::Integer(2),
                BencodeValue::Integer(3)
            ])
        );
        assert_eq!(
            decode(b"l4:spam4:eggse").unwrap(),
            BencodeValue::List(vec![
                BencodeValue::ByteString(b"spam".to_vec()),
                BencodeValue::ByteString(b"eggs".to_vec()),
            ])
        );
    }

    #[test]
    fn decodes_dicts_and_rejects_duplicate_or_unordered_keys() {
        let dict = decode(b"d3:bar4:spam3:fooi42ee").unwrap();
        match dict {
            BencodeValue::Dict(map) => {
                assert_eq!(map.get(&b"bar".to_vec()).unwrap().as_byte_string(), Some(&b"spam"[..]));
                assert_eq!(map.get(&b"foo".to_vec()).unwrap().as_integer(), Some(42));
            }
            _ => panic!("expected dict"),
        }

        assert!(decode(b"d3:foo4:spam3:bar4:eggs3:foo4:teste").is_err());
    }

    #[test]
    fn full_torrent_round_trip_shape() {
        let input = b"d8:announce14:http://tracker3:foo5:hello4:infod5:filesld6:lengthi12345e4:pathl8:filenameeee4:name8:testfile12:piece lengthi16384e6:pieces20:12345678901234567890ee";
        let value = decode(input).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(
            dict.get(&b"announce".to_vec()).unwrap().as_byte_string(),
            Some(&b"http://tracker"[..])
        );
        let info = dict.get(&b"info".to_vec()).unwrap().as_dict().unwrap();
        assert_eq!(
            info.get(&b"pieces".to_vec()).unwrap().as_byte_string(),
            Some(&b"12345678901234567890"[..])
        );
    }

    #[test]
    fn a_failing_child_surfaces_as_the_container_s_own_error_kind() {
        match decode(b"li1eXe").unwrap_err() {
            BencodeError::ListMalformed(_) => {}
            other => panic!("expected ListMalformed, got {other:?}"),
        }
        match decode(b"d3:fooXe").unwrap_err() {
            BencodeError::DictMalformed(_) => {}
            other => panic!("expected DictMalformed, got {other:?}"),
        }
    }

    #[test]
    fn totality_never_panics() {
        for input in [
            &b""[..],
            b"i",
            b"l",
            b"d",
            b"9999999999999999999999:",
            b"\x00\x01\x02",
            b"d1:",
        ] {
            let _ = decode(input);
        }
    }
}
