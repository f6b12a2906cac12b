use std::io::Cursor;

use bytes::Buf;

use super::markers;
use super::value::{Value, ValueMap};
use super::{PackStreamError, PackStreamResult};

/// Decodes exactly one value from `cur`, advancing the cursor past it.
pub fn decode_value(cur: &mut Cursor<&[u8]>) -> PackStreamResult<Value> {
    let marker = peek_u8(cur)?;

    match marker {
        markers::NULL => {
            cur.advance(1);
            Ok(Value::Null)
        }
        markers::FALSE => {
            cur.advance(1);
            Ok(Value::Boolean(false))
        }
        markers::TRUE => {
            cur.advance(1);
            Ok(Value::Boolean(true))
        }
        markers::FLOAT64 => {
            require(cur, 9)?;
            cur.advance(1);
            Ok(Value::Float(cur.get_f64()))
        }
        markers::INT8 => {
            require(cur, 2)?;
            cur.advance(1);
            Ok(Value::Integer(cur.get_i8() as i64))
        }
        markers::INT16 => {
            require(cur, 3)?;
            cur.advance(1);
            Ok(Value::Integer(cur.get_i16() as i64))
        }
        markers::INT32 => {
            require(cur, 5)?;
            cur.advance(1);
            Ok(Value::Integer(cur.get_i32() as i64))
        }
        markers::INT64 => {
            require(cur, 9)?;
            cur.advance(1);
            Ok(Value::Integer(cur.get_i64()))
        }
        markers::BYTES8 => {
            require(cur, 2)?;
            cur.advance(1);
            let len = cur.get_u8() as usize;
            decode_bytes(cur, len)
        }
        markers::BYTES16 => {
            require(cur, 3)?;
            cur.advance(1);
            let len = cur.get_u16() as usize;
            decode_bytes(cur, len)
        }
        markers::BYTES32 => {
            require(cur, 5)?;
            cur.advance(1);
            let len = cur.get_u32() as usize;
            decode_bytes(cur, len)
        }
        markers::STRING8 => {
            require(cur, 2)?;
            cur.advance(1);
            let len = cur.get_u8() as usize;
            decode_string(cur, len)
        }
        markers::STRING16 => {
            require(cur, 3)?;
            cur.advance(1);
            let len = cur.get_u16() as usize;
            decode_string(cur, len)
        }
        markers::STRING32 => {
            require(cur, 5)?;
            cur.advance(1);
            let len = cur.get_u32() as usize;
            decode_string(cur, len)
        }
        markers::LIST8 => {
            require(cur, 2)?;
            cur.advance(1);
            let len = cur.get_u8() as usize;
            decode_list(cur, len)
        }
        markers::LIST16 => {
            require(cur, 3)?;
            cur.advance(1);
            let len = cur.get_u16() as usize;
            decode_list(cur, len)
        }
        markers::LIST32 => {
            require(cur, 5)?;
            cur.advance(1);
            let len = cur.get_u32() as usize;
            decode_list(cur, len)
        }
        markers::MAP8 => {
            require(cur, 2)?;
            cur.advance(1);
            let len = cur.get_u8() as usize;
            decode_map(cur, len)
        }
        markers::MAP16 => {
            require(cur, 3)?;
            cur.advance(1);
            let len = cur.get_u16() as usize;
            decode_map(cur, len)
        }
        markers::MAP32 => {
            require(cur, 5)?;
            cur.advance(1);
            let len = cur.get_u32() as usize;
            decode_map(cur, len)
        }
        markers::STRUCT8 => {
            require(cur, 3)?;
            cur.advance(1);
            let size = cur.get_u8() as usize;
            let tag = cur.get_u8();
            decode_structure(cur, tag, size)
        }
        markers::STRUCT16 => {
            require(cur, 4)?;
            cur.advance(1);
            let size = cur.get_u16() as usize;
            let tag = cur.get_u8();
            decode_structure(cur, tag, size)
        }
        b if (0x80..=0x8F).contains(&b) => {
            cur.advance(1);
            decode_string(cur, (b & 0x0F) as usize)
        }
        b if (0x90..=0x9F).contains(&b) => {
            cur.advance(1);
            decode_list(cur, (b & 0x0F) as usize)
        }
        b if (0xA0..=0xAF).contains(&b) => {
            cur.advance(1);
            decode_map(cur, (b & 0x0F) as usize)
        }
        b if (0xB0..=0xBF).contains(&b) => {
            require(cur, 2)?;
            cur.advance(1);
            let size = (b & 0x0F) as usize;
            let tag = cur.get_u8();
            decode_structure(cur, tag, size)
        }
        // tiny-int: 0x00-0x7F (positive) and 0xF0-0xFF (negative, two's complement)
        b if b <= 0x7F || b >= 0xF0 => {
            cur.advance(1);
            Ok(Value::Integer(b as i8 as i64))
        }
        other => Err(PackStreamError::UnknownMarker(other)),
    }
}

fn peek_u8(cur: &Cursor<&[u8]>) -> PackStreamResult<u8> {
    let pos = cur.position() as usize;
    cur.get_ref()
        .get(pos)
        .copied()
        .ok_or(PackStreamError::Incomplete)
}

fn require(cur: &Cursor<&[u8]>, n: usize) -> PackStreamResult<()> {
    if cur.remaining() < n {
        Err(PackStreamError::Incomplete)
    } else {
        Ok(())
    }
}

fn decode_bytes(cur: &mut Cursor<&[u8]>, len: usize) -> PackStreamResult<Value> {
    if cur.remaining() < len {
        return Err(PackStreamError::Incomplete);
    }
    let mut out = vec![0u8; len];
    cur.copy_to_slice(&mut out);
    Ok(Value::Bytes(out))
}

fn decode_string(cur: &mut Cursor<&[u8]>, len: usize) -> PackStreamResult<Value> {
    if cur.remaining() < len {
        return Err(PackStreamError::Incomplete);
    }
    let mut out = vec![0u8; len];
    cur.copy_to_slice(&mut out);
    let s = String::from_utf8(out).map_err(|_| PackStreamError::InvalidUtf8)?;
    Ok(Value::String(s))
}

fn decode_list(cur: &mut Cursor<&[u8]>, len: usize) -> PackStreamResult<Value> {
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(decode_value(cur)?);
    }
    Ok(Value::List(items))
}

fn decode_map(cur: &mut Cursor<&[u8]>, len: usize) -> PackStreamResult<Value> {
    let mut map = ValueMap::new();
    for _ in 0..len {
        let key = match decode_value(cur)? {
            Value::String(s) => s,
            _ => return Err(PackStreamError::NonStringMapKey),
        };
        let value = decode_value(cur)?;
        map.insert(key, value);
    }
    Ok(Value::Map(map))
}

fn decode_structure(cur: &mut Cursor<&[u8]>, tag: u8, size: usize) -> PackStreamResult<Value> {
    if size > markers::MAX_STRUCT_FIELDS {
        return Err(PackStreamError::StructureTooLarge(size));
    }
    let mut fields = Vec::with_capacity(size);
    for _ in 0..size {
        fields.push(decode_value(cur)?);
    }
    Ok(Value::Structure { tag, fields })
}

/// Decodes a top-level message body: a structure header (tag + fields),
/// consuming the whole cursor.
pub fn decode_message(cur: &mut Cursor<&[u8]>) -> PackStreamResult<(u8, Vec<Value>)> {
    match decode_value(cur)? {
        Value::Structure { tag, fields } => Ok((tag, fields)),
        _ => Err(PackStreamError::UnknownMarker(peek_u8(cur).unwrap_or(0))),
    }
}
