// ABOUTME: PackStream value codec — the self-delimiting wire format Bolt messages use for fields
// ABOUTME: Two-way encode/decode between a typed Value tree and bytes

mod decode;
mod encode;
mod value;

pub use decode::{decode_message, decode_value};
pub use value::{Value, ValueMap};

use bytes::{BufMut, BytesMut};
use thiserror::Error;

/// Errors raised while encoding or decoding a PackStream value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PackStreamError {
    #[error("not enough bytes to decode a value")]
    Incomplete,

    #[error("unknown marker byte 0x{0:02X}")]
    UnknownMarker(u8),

    #[error("structure declares {0} fields, maximum is 15")]
    StructureTooLarge(usize),

    #[error("map key was not a string")]
    NonStringMapKey,

    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,
}

pub type PackStreamResult<T> = Result<T, PackStreamError>;

/// Marker bytes relevant to the Bolt core.
pub mod markers {
    pub const NULL: u8 = 0xC0;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;
    pub const FLOAT64: u8 = 0xC1;
    pub const INT8: u8 = 0xC8;
    pub const INT16: u8 = 0xC9;
    pub const INT32: u8 = 0xCA;
    pub const INT64: u8 = 0xCB;
    pub const BYTES8: u8 = 0xCC;
    pub const BYTES16: u8 = 0xCD;
    pub const BYTES32: u8 = 0xCE;
    pub const STRING8: u8 = 0xD0;
    pub const STRING16: u8 = 0xD1;
    pub const STRING32: u8 = 0xD2;
    pub const LIST8: u8 = 0xD4;
    pub const LIST16: u8 = 0xD5;
    pub const LIST32: u8 = 0xD6;
    pub const MAP8: u8 = 0xD8;
    pub const MAP16: u8 = 0xD9;
    pub const MAP32: u8 = 0xDA;
    pub const STRUCT8: u8 = 0xDC;
    pub const STRUCT16: u8 = 0xDD;

    pub const TINY_STRING_BASE: u8 = 0x80;
    pub const TINY_LIST_BASE: u8 = 0x90;
    pub const TINY_MAP_BASE: u8 = 0xA0;
    pub const TINY_STRUCT_BASE: u8 = 0xB0;

    pub const MAX_STRUCT_FIELDS: usize = 15;
}

/// Encodes a value into `buf`, appending bytes (never resets `buf`).
pub fn encode_value(value: &Value, buf: &mut BytesMut) {
    encode::encode(value, buf);
}

/// Encodes a PackStream structure: `0xB0 | size`, then a one-byte tag, then
/// each field in order.
pub fn encode_structure(tag: u8, fields: &[Value], buf: &mut BytesMut) {
    assert!(
        fields.len() <= markers::MAX_STRUCT_FIELDS,
        "structure exceeds 15 fields"
    );
    buf.put_u8(markers::TINY_STRUCT_BASE | fields.len() as u8);
    buf.put_u8(tag);
    for field in fields {
        encode::encode(field, buf);
    }
}
