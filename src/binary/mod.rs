//! Binary encoding: the bit-exact tag-byte/length/payload framing, plus the
//! streaming reader and buffer-stack writer built on top of it.

pub mod reader;
pub mod writer;

pub use reader::Reader;
pub use writer::Writer;

use crate::error::{Error, Result};
use crate::marker::{LengthCode, Marker};
use crate::varint;

/// The four bytes that open every binary stream and every mid-stream
/// version reset.
pub const VERSION_MARKER: [u8; 4] = [0xE0, 0x01, 0x00, 0xEA];

/// Read and validate a version marker at `buf[pos..]`, returning the number
/// of bytes consumed (always 4).
pub(crate) fn read_version_marker(buf: &[u8], pos: usize) -> Result<usize> {
    if buf.len() < pos + 4 {
        return Err(Error::UnexpectedEof { offset: pos });
    }
    let marker = &buf[pos..pos + 4];
    if marker[0] != 0xE0 || marker[3] != 0xEA {
        return Err(Error::Syntax {
            offset: pos,
            cause: "missing version marker".into(),
        });
    }
    if marker[1] != 0x01 || marker[2] != 0x00 {
        return Err(Error::UnsupportedVersion {
            major: marker[1],
            minor: marker[2],
        });
    }
    Ok(4)
}

/// Decode the length following a tag byte, returning `(payload_len,
/// total_header_len)` where `total_header_len` includes the tag byte
/// itself and any trailing `VarUInt` length.
pub(crate) fn decode_length(buf: &[u8], pos: usize, marker: Marker) -> Result<(usize, usize)> {
    match marker.length_code {
        LengthCode::Zero | LengthCode::BoolTrue | LengthCode::TypedNull => Ok((0, 1)),
        LengthCode::Direct(n) => Ok((n as usize, 1)),
        LengthCode::VarLen | LengthCode::OrderedStruct => {
            let (len, len_bytes) = varint::read_varuint(&buf[pos + 1..], pos + 1)?;
            Ok((len as usize, 1 + len_bytes))
        }
    }
}

/// Encode a tag byte plus (if needed) its trailing `VarUInt` length into
/// `buf`, choosing the most compact representation for `payload_len`.
pub(crate) fn encode_tag(
    buf: &mut Vec<u8>,
    type_code: crate::marker::TypeCode,
    payload_len: usize,
) {
    let marker = Marker::for_length(type_code, payload_len);
    buf.push(marker.into_u8());
    if matches!(marker.length_code, LengthCode::VarLen) {
        varint::write_varuint(buf, payload_len as u64);
    }
}
