use bytes::{BufMut, BytesMut};

use super::markers;
use super::value::Value;

pub fn encode(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Null => buf.put_u8(markers::NULL),
        Value::Boolean(false) => buf.put_u8(markers::FALSE),
        Value::Boolean(true) => buf.put_u8(markers::TRUE),
        Value::Integer(i) => encode_integer(*i, buf),
        Value::Float(f) => {
            buf.put_u8(markers::FLOAT64);
            buf.put_f64(*f);
        }
        Value::Bytes(b) => encode_bytes(b, buf),
        Value::String(s) => encode_string(s, buf),
        Value::List(items) => encode_list(items, buf),
        Value::Map(map) => encode_map(map, buf),
        Value::Structure { tag, fields } => {
            super::encode_structure(*tag, fields, buf);
        }
    }
}

fn encode_integer(i: i64, buf: &mut BytesMut) {
    if (-16..=127).contains(&i) {
        buf.put_u8(i as i8 as u8);
    } else if (i8::MIN as i64..=i8::MAX as i64).contains(&i) {
        buf.put_u8(markers::INT8);
        buf.put_i8(i as i8);
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&i) {
        buf.put_u8(markers::INT16);
        buf.put_i16(i as i16);
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&i) {
        buf.put_u8(markers::INT32);
        buf.put_i32(i as i32);
    } else {
        buf.put_u8(markers::INT64);
        buf.put_i64(i);
    }
}

fn encode_bytes(b: &[u8], buf: &mut BytesMut) {
    let len = b.len();
    if len <= u8::MAX as usize {
        buf.put_u8(markers::BYTES8);
        buf.put_u8(len as u8);
    } else if len <= u16::MAX as usize {
        buf.put_u8(markers::BYTES16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(markers::BYTES32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(b);
}

fn encode_string(s: &str, buf: &mut BytesMut) {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if len <= 15 {
        buf.put_u8(markers::TINY_STRING_BASE | len as u8);
    } else if len <= u8::MAX as usize {
        buf.put_u8(markers::STRING8);
        buf.put_u8(len as u8);
    } else if len <= u16::MAX as usize {
        buf.put_u8(markers::STRING16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(markers::STRING32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(bytes);
}

fn encode_list(items: &[Value], buf: &mut BytesMut) {
    let len = items.len();
    if len <= 15 {
        buf.put_u8(markers::TINY_LIST_BASE | len as u8);
    } else if len <= u8::MAX as usize {
        buf.put_u8(markers::LIST8);
        buf.put_u8(len as u8);
    } else if len <= u16::MAX as usize {
        buf.put_u8(markers::LIST16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(markers::LIST32);
        buf.put_u32(len as u32);
    }
    for item in items {
        encode(item, buf);
    }
}

fn encode_map(map: &super::ValueMap, buf: &mut BytesMut) {
    let len = map.len();
    if len <= 15 {
        buf.put_u8(markers::TINY_MAP_BASE | len as u8);
    } else if len <= u8::MAX as usize {
        buf.put_u8(markers::MAP8);
        buf.put_u8(len as u8);
    } else if len <= u16::MAX as usize {
        buf.put_u8(markers::MAP16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(markers::MAP32);
        buf.put_u32(len as u32);
    }
    for (key, value) in map.iter() {
        encode_string(key, buf);
        encode(value, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::ValueMap;

    fn encoded(v: Value) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode(&v, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn encodes_null() {
        assert_eq!(encoded(Value::Null), vec![0xC0]);
    }

    #[test]
    fn encodes_booleans() {
        assert_eq!(encoded(Value::Boolean(true)), vec![0xC3]);
        assert_eq!(encoded(Value::Boolean(false)), vec![0xC2]);
    }

    #[test]
    fn encodes_tiny_int() {
        assert_eq!(encoded(Value::Integer(42)), vec![42]);
        assert_eq!(encoded(Value::Integer(-1)), vec![0xFF]);
    }

    #[test]
    fn encodes_int64_for_large_magnitude() {
        let mut expected = vec![0xCB];
        expected.extend_from_slice(&i64::MAX.to_be_bytes());
        assert_eq!(encoded(Value::Integer(i64::MAX)), expected);
    }

    #[test]
    fn encodes_float64_big_endian() {
        let mut expected = vec![0xC1];
        expected.extend_from_slice(&1.5f64.to_be_bytes());
        assert_eq!(encoded(Value::Float(1.5)), expected);
    }

    #[test]
    fn encodes_tiny_string() {
        assert_eq!(
            encoded(Value::String("abc".to_string())),
            vec![0x83, b'a', b'b', b'c']
        );
    }

    #[test]
    fn encodes_tiny_list() {
        let v = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(encoded(v), vec![0x92, 1, 2]);
    }

    #[test]
    fn encodes_tiny_map_preserving_order() {
        let mut map = ValueMap::new();
        map.insert("b", Value::Integer(2));
        map.insert("a", Value::Integer(1));
        let bytes = encoded(Value::Map(map));
        // size 2, then key "b" before key "a" (insertion order preserved)
        assert_eq!(bytes, vec![0xA2, 0x81, b'b', 2, 0x81, b'a', 1]);
    }

    #[test]
    fn encodes_structure_header() {
        let mut buf = BytesMut::new();
        super::super::encode_structure(0x01, &[], &mut buf);
        assert_eq!(buf.to_vec(), vec![0xB0, 0x01]);
    }
}
