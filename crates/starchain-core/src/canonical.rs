//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 seconds)
//!
//! Block hashes are computed over these bytes, so the encoding of a given
//! block must never change. Persisted ledgers depend on it byte-for-byte.

use ciborium::value::Value;

use crate::block::{Block, BlockBody, Star, StarRecord};
use crate::error::{CoreError, Result};
use crate::types::BlockHash;

/// Block field keys (integer keys for compact encoding).
mod keys {
    pub const HEIGHT: u64 = 0;
    pub const TIMESTAMP: u64 = 1;
    pub const PREVIOUS_HASH: u64 = 2;
    pub const BODY: u64 = 3;
    pub const HASH: u64 = 4;
}

mod body_keys {
    pub const KIND: u64 = 0;
    pub const CONTENT: u64 = 1;
}

mod star_keys {
    pub const ADDRESS: u64 = 0;
    pub const RA: u64 = 1;
    pub const DEC: u64 = 2;
    pub const STORY: u64 = 3;
    pub const MAGNITUDE: u64 = 4;
    pub const CONSTELLATION: u64 = 5;
}

/// Body kind discriminators.
const KIND_NOTE: u64 = 1;
const KIND_STAR: u64 = 2;

/// Encode a finalized block to canonical bytes. This is what the store holds.
pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    let value = block_to_cbor_value(block, Some(&block.hash));
    encode_cbor_value_canonical(&value)
}

/// Encode a block with its hash field blanked (empty byte string).
///
/// The block hash is SHA-256 over these bytes.
pub fn digest_bytes(block: &Block) -> Vec<u8> {
    let value = block_to_cbor_value(block, None);
    encode_cbor_value_canonical(&value)
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

fn opt_text(s: &Option<String>) -> Value {
    match s {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

/// Convert a block to a CBOR Value (map with integer keys).
fn block_to_cbor_value(block: &Block, hash: Option<&BlockHash>) -> Value {
    let previous_hash = match &block.previous_hash {
        Some(h) => Value::Bytes(h.0.to_vec()),
        None => Value::Null,
    };
    let hash = match hash {
        Some(h) => Value::Bytes(h.0.to_vec()),
        None => Value::Bytes(Vec::new()),
    };

    Value::Map(vec![
        (key(keys::HEIGHT), Value::Integer(block.height.into())),
        (key(keys::TIMESTAMP), Value::Integer(block.timestamp.into())),
        (key(keys::PREVIOUS_HASH), previous_hash),
        (key(keys::BODY), body_to_cbor_value(&block.body)),
        (key(keys::HASH), hash),
    ])
}

fn body_to_cbor_value(body: &BlockBody) -> Value {
    let (kind, content) = match body {
        BlockBody::Note(text) => (KIND_NOTE, Value::Text(text.clone())),
        BlockBody::Star(record) => (KIND_STAR, star_to_cbor_value(record)),
    };
    Value::Map(vec![
        (key(body_keys::KIND), Value::Integer(kind.into())),
        (key(body_keys::CONTENT), content),
    ])
}

fn star_to_cbor_value(record: &StarRecord) -> Value {
    let star = &record.star;
    Value::Map(vec![
        (key(star_keys::ADDRESS), Value::Text(record.address.clone())),
        (key(star_keys::RA), Value::Text(star.ra.clone())),
        (key(star_keys::DEC), Value::Text(star.dec.clone())),
        (key(star_keys::STORY), Value::Text(star.story.clone())),
        (key(star_keys::MAGNITUDE), opt_text(&star.magnitude)),
        (key(star_keys::CONSTELLATION), opt_text(&star.constellation)),
    ])
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => panic!("floats not supported in canonical encoding"),
        _ => panic!("unsupported CBOR value type"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Decode a block from its stored bytes.
pub fn decode_block(bytes: &[u8]) -> Result<Block> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let map = as_map(&value, "block")?;

    let height = uint(field(map, keys::HEIGHT, "height")?, "height")?;
    let timestamp = match field(map, keys::TIMESTAMP, "timestamp")? {
        Value::Integer(i) => i64::try_from(*i)
            .map_err(|_| CoreError::MalformedBlock("timestamp out of range".into()))?,
        _ => return Err(CoreError::MalformedBlock("invalid timestamp".into())),
    };
    let previous_hash = match get(map, keys::PREVIOUS_HASH) {
        Some(Value::Null) | None => None,
        Some(v) => Some(hash_value(v, "previous_hash")?),
    };
    let body = cbor_value_to_body(field(map, keys::BODY, "body")?)?;
    let hash = hash_value(field(map, keys::HASH, "hash")?, "hash")?;

    Ok(Block {
        height,
        timestamp,
        previous_hash,
        body,
        hash,
    })
}

fn cbor_value_to_body(value: &Value) -> Result<BlockBody> {
    let map = as_map(value, "body")?;
    let kind = uint(field(map, body_keys::KIND, "body kind")?, "body kind")?;
    let content = field(map, body_keys::CONTENT, "body content")?;

    match kind {
        KIND_NOTE => Ok(BlockBody::Note(text(content, "note")?)),
        KIND_STAR => {
            let star = as_map(content, "star")?;
            let text_field = |k: u64, name: &str| -> Result<String> {
                text(field(star, k, name)?, name)
            };
            let opt_field = |k: u64, name: &str| -> Result<Option<String>> {
                match get(star, k) {
                    Some(Value::Null) | None => Ok(None),
                    Some(v) => text(v, name).map(Some),
                }
            };
            Ok(BlockBody::Star(StarRecord {
                address: text_field(star_keys::ADDRESS, "address")?,
                star: Star {
                    ra: text_field(star_keys::RA, "ra")?,
                    dec: text_field(star_keys::DEC, "dec")?,
                    story: text_field(star_keys::STORY, "story")?,
                    magnitude: opt_field(star_keys::MAGNITUDE, "magnitude")?,
                    constellation: opt_field(star_keys::CONSTELLATION, "constellation")?,
                },
            }))
        }
        other => Err(CoreError::MalformedBlock(format!("unknown body kind: {}", other))),
    }
}

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(CoreError::MalformedBlock(format!("{} is not a map", what))),
    }
}

fn get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
        .map(|(_, v)| v)
}

fn field<'a>(map: &'a [(Value, Value)], key: u64, name: &str) -> Result<&'a Value> {
    get(map, key).ok_or_else(|| CoreError::MalformedBlock(format!("missing {}", name)))
}

fn uint(value: &Value, name: &str) -> Result<u64> {
    match value {
        Value::Integer(i) => u64::try_from(*i)
            .map_err(|_| CoreError::MalformedBlock(format!("{} out of range", name))),
        _ => Err(CoreError::MalformedBlock(format!("invalid {}", name))),
    }
}

fn text(value: &Value, name: &str) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        _ => Err(CoreError::MalformedBlock(format!("invalid {}", name))),
    }
}

fn hash_value(value: &Value, name: &str) -> Result<BlockHash> {
    match value {
        Value::Bytes(b) => BlockHash::try_from(b.as_slice())
            .map_err(|_| CoreError::MalformedBlock(format!("{} must be 32 bytes", name))),
        _ => Err(CoreError::MalformedBlock(format!("invalid {}", name))),
    }
}
