//! Attribute type ids and the typed value codec shared by the LSF reader
//! and writer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Error, Result};

/// Wire type id of an LSF attribute value, lower 6 bits of the packed
/// type+length word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AttributeType {
    None = 0,
    Byte = 1,
    Short = 2,
    UShort = 3,
    Int = 4,
    UInt = 5,
    Float = 6,
    Double = 7,
    IVec2 = 8,
    IVec3 = 9,
    IVec4 = 10,
    Vec2 = 11,
    Vec3 = 12,
    Vec4 = 13,
    Mat2 = 14,
    Mat3 = 15,
    Mat3x4 = 16,
    Mat4x3 = 17,
    Mat4 = 18,
    Bool = 19,
    String = 20,
    Path = 21,
    FixedString = 22,
    LSString = 23,
    ULongLong = 24,
    ScratchBuffer = 25,
    Long = 26,
    Int8 = 27,
    TranslatedString = 28,
    WString = 29,
    LSWString = 30,
    Uuid = 31,
    Int64 = 32,
    TranslatedFSString = 33,
}

impl AttributeType {
    /// Decode a wire type id.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        use AttributeType::{
            Bool, Byte, Double, FixedString, Float, IVec2, IVec3, IVec4, Int, Int64, Int8,
            LSString, LSWString, Long, Mat2, Mat3, Mat3x4, Mat4, Mat4x3, None, Path,
            ScratchBuffer, Short, String, TranslatedFSString, TranslatedString, UInt, ULongLong,
            UShort, Uuid, Vec2, Vec3, Vec4, WString,
        };
        Some(match id {
            0 => None,
            1 => Byte,
            2 => Short,
            3 => UShort,
            4 => Int,
            5 => UInt,
            6 => Float,
            7 => Double,
            8 => IVec2,
            9 => IVec3,
            10 => IVec4,
            11 => Vec2,
            12 => Vec3,
            13 => Vec4,
            14 => Mat2,
            15 => Mat3,
            16 => Mat3x4,
            17 => Mat4x3,
            18 => Mat4,
            19 => Bool,
            20 => String,
            21 => Path,
            22 => FixedString,
            23 => LSString,
            24 => ULongLong,
            25 => ScratchBuffer,
            26 => Long,
            27 => Int8,
            28 => TranslatedString,
            29 => WString,
            30 => LSWString,
            31 => Uuid,
            32 => Int64,
            33 => TranslatedFSString,
            _ => return Option::None,
        })
    }

    #[must_use]
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Human-readable type name matching the tool ecosystem's spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AttributeType::None => "None",
            AttributeType::Byte => "uint8",
            AttributeType::Short => "int16",
            AttributeType::UShort => "uint16",
            AttributeType::Int => "int32",
            AttributeType::UInt => "uint32",
            AttributeType::Float => "float",
            AttributeType::Double => "double",
            AttributeType::IVec2 => "ivec2",
            AttributeType::IVec3 => "ivec3",
            AttributeType::IVec4 => "ivec4",
            AttributeType::Vec2 => "fvec2",
            AttributeType::Vec3 => "fvec3",
            AttributeType::Vec4 => "fvec4",
            AttributeType::Mat2 => "mat2x2",
            AttributeType::Mat3 => "mat3x3",
            AttributeType::Mat3x4 => "mat3x4",
            AttributeType::Mat4x3 => "mat4x3",
            AttributeType::Mat4 => "mat4x4",
            AttributeType::Bool => "bool",
            AttributeType::String => "string",
            AttributeType::Path => "path",
            AttributeType::FixedString => "FixedString",
            AttributeType::LSString => "LSString",
            AttributeType::ULongLong => "uint64",
            AttributeType::ScratchBuffer => "ScratchBuffer",
            AttributeType::Long => "old_int64",
            AttributeType::Int8 => "int8",
            AttributeType::TranslatedString => "TranslatedString",
            AttributeType::WString => "WString",
            AttributeType::LSWString => "LSWString",
            AttributeType::Uuid => "guid",
            AttributeType::Int64 => "int64",
            AttributeType::TranslatedFSString => "TranslatedFSString",
        }
    }
}

/// A decoded, typed attribute value.
///
/// The wire strings are nul-terminated UTF-8; wide-string kinds are carried
/// as UTF-8 as well. `Uuid` keeps the 16 raw wire bytes; its `Display`
/// renders the byte-swapped canonical form.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    None,
    Byte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat3x4([f32; 12]),
    Mat4x3([f32; 12]),
    Mat4([f32; 16]),
    Bool(bool),
    String(String),
    Path(String),
    FixedString(String),
    LSString(String),
    ULongLong(u64),
    ScratchBuffer(Vec<u8>),
    Long(i64),
    Int8(i8),
    TranslatedString {
        version: u16,
        handle: String,
    },
    WString(String),
    LSWString(String),
    Uuid([u8; 16]),
    Int64(i64),
}

impl AttributeValue {
    /// The wire type this value encodes as.
    #[must_use]
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::None => AttributeType::None,
            AttributeValue::Byte(_) => AttributeType::Byte,
            AttributeValue::Short(_) => AttributeType::Short,
            AttributeValue::UShort(_) => AttributeType::UShort,
            AttributeValue::Int(_) => AttributeType::Int,
            AttributeValue::UInt(_) => AttributeType::UInt,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Double(_) => AttributeType::Double,
            AttributeValue::IVec2(_) => AttributeType::IVec2,
            AttributeValue::IVec3(_) => AttributeType::IVec3,
            AttributeValue::IVec4(_) => AttributeType::IVec4,
            AttributeValue::Vec2(_) => AttributeType::Vec2,
            AttributeValue::Vec3(_) => AttributeType::Vec3,
            AttributeValue::Vec4(_) => AttributeType::Vec4,
            AttributeValue::Mat2(_) => AttributeType::Mat2,
            AttributeValue::Mat3(_) => AttributeType::Mat3,
            AttributeValue::Mat3x4(_) => AttributeType::Mat3x4,
            AttributeValue::Mat4x3(_) => AttributeType::Mat4x3,
            AttributeValue::Mat4(_) => AttributeType::Mat4,
            AttributeValue::Bool(_) => AttributeType::Bool,
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Path(_) => AttributeType::Path,
            AttributeValue::FixedString(_) => AttributeType::FixedString,
            AttributeValue::LSString(_) => AttributeType::LSString,
            AttributeValue::ULongLong(_) => AttributeType::ULongLong,
            AttributeValue::ScratchBuffer(_) => AttributeType::ScratchBuffer,
            AttributeValue::Long(_) => AttributeType::Long,
            AttributeValue::Int8(_) => AttributeType::Int8,
            AttributeValue::TranslatedString { .. } => AttributeType::TranslatedString,
            AttributeValue::WString(_) => AttributeType::WString,
            AttributeValue::LSWString(_) => AttributeType::LSWString,
            AttributeValue::Uuid(_) => AttributeType::Uuid,
            AttributeValue::Int64(_) => AttributeType::Int64,
        }
    }
}

fn unsupported(ty: AttributeType) -> Error {
    Error::UnsupportedAttributeType {
        type_id: ty.id(),
        type_name: ty.name(),
    }
}

fn truncated(ty: AttributeType, len: usize) -> Error {
    Error::InvalidLsfSection(format!(
        "value of type {} truncated at {len} bytes",
        ty.name()
    ))
}

fn fixed<const N: usize>(ty: AttributeType, bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| truncated(ty, bytes.len()))
}

fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn ivec<const N: usize>(ty: AttributeType, bytes: &[u8]) -> Result<[i32; N]> {
    if bytes.len() < N * 4 {
        return Err(truncated(ty, bytes.len()));
    }
    let mut out = [0i32; N];
    for (i, v) in out.iter_mut().enumerate() {
        *v = i32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap_or_default());
    }
    Ok(out)
}

fn fvec<const N: usize>(ty: AttributeType, bytes: &[u8]) -> Result<[f32; N]> {
    if bytes.len() < N * 4 {
        return Err(truncated(ty, bytes.len()));
    }
    let mut out = [0f32; N];
    for (i, v) in out.iter_mut().enumerate() {
        *v = f32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap_or_default());
    }
    Ok(out)
}

/// Decode a value slice from the values section.
///
/// `TranslatedFSString` has no documented wire layout in this generation
/// and is rejected rather than guessed at.
pub fn decode_value(ty: AttributeType, bytes: &[u8]) -> Result<AttributeValue> {
    Ok(match ty {
        AttributeType::None => AttributeValue::None,
        AttributeType::Byte => AttributeValue::Byte(fixed::<1>(ty, bytes)?[0]),
        AttributeType::Short => AttributeValue::Short(i16::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::UShort => AttributeValue::UShort(u16::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::Int => AttributeValue::Int(i32::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::UInt => AttributeValue::UInt(u32::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::Float => AttributeValue::Float(f32::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::Double => AttributeValue::Double(f64::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::IVec2 => AttributeValue::IVec2(ivec(ty, bytes)?),
        AttributeType::IVec3 => AttributeValue::IVec3(ivec(ty, bytes)?),
        AttributeType::IVec4 => AttributeValue::IVec4(ivec(ty, bytes)?),
        AttributeType::Vec2 => AttributeValue::Vec2(fvec(ty, bytes)?),
        AttributeType::Vec3 => AttributeValue::Vec3(fvec(ty, bytes)?),
        AttributeType::Vec4 => AttributeValue::Vec4(fvec(ty, bytes)?),
        AttributeType::Mat2 => AttributeValue::Mat2(fvec(ty, bytes)?),
        AttributeType::Mat3 => AttributeValue::Mat3(fvec(ty, bytes)?),
        AttributeType::Mat3x4 => AttributeValue::Mat3x4(fvec(ty, bytes)?),
        AttributeType::Mat4x3 => AttributeValue::Mat4x3(fvec(ty, bytes)?),
        AttributeType::Mat4 => AttributeValue::Mat4(fvec(ty, bytes)?),
        AttributeType::Bool => AttributeValue::Bool(bytes.first().is_some_and(|&b| b != 0)),
        AttributeType::String => AttributeValue::String(nul_terminated(bytes)),
        AttributeType::Path => AttributeValue::Path(nul_terminated(bytes)),
        AttributeType::FixedString => AttributeValue::FixedString(nul_terminated(bytes)),
        AttributeType::LSString => AttributeValue::LSString(nul_terminated(bytes)),
        AttributeType::ULongLong => AttributeValue::ULongLong(u64::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::ScratchBuffer => AttributeValue::ScratchBuffer(bytes.to_vec()),
        AttributeType::Long => AttributeValue::Long(i64::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::Int8 => AttributeValue::Int8(fixed::<1>(ty, bytes)?[0] as i8),
        AttributeType::TranslatedString => decode_translated_string(bytes)?,
        AttributeType::WString => AttributeValue::WString(nul_terminated(bytes)),
        AttributeType::LSWString => AttributeValue::LSWString(nul_terminated(bytes)),
        AttributeType::Uuid => AttributeValue::Uuid(fixed(ty, bytes)?),
        AttributeType::Int64 => AttributeValue::Int64(i64::from_le_bytes(fixed(ty, bytes)?)),
        AttributeType::TranslatedFSString => return Err(unsupported(ty)),
    })
}

fn decode_translated_string(bytes: &[u8]) -> Result<AttributeValue> {
    let ty = AttributeType::TranslatedString;
    let mut cursor = Cursor::new(bytes);
    let version = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| truncated(ty, bytes.len()))?;
    let handle_len = cursor
        .read_i32::<LittleEndian>()
        .map_err(|_| truncated(ty, bytes.len()))?
        .max(0) as usize;

    let handle = if handle_len == 0 {
        String::new()
    } else {
        // Stored length includes the nul terminator.
        let mut handle_bytes = vec![0u8; handle_len.saturating_sub(1)];
        cursor
            .read_exact(&mut handle_bytes)
            .map_err(|_| truncated(ty, bytes.len()))?;
        String::from_utf8_lossy(&handle_bytes).into_owned()
    };

    Ok(AttributeValue::TranslatedString { version, handle })
}

/// Append a value's wire bytes to the values section, returning the number
/// of bytes written.
///
/// Matrix values are a documented encode gap and are rejected instead of
/// being zero-filled.
pub fn encode_value(buffer: &mut Vec<u8>, value: &AttributeValue) -> Result<usize> {
    let start = buffer.len();
    match value {
        AttributeValue::None => {}
        AttributeValue::Byte(v) => buffer.push(*v),
        AttributeValue::Short(v) => buffer.write_i16::<LittleEndian>(*v)?,
        AttributeValue::UShort(v) => buffer.write_u16::<LittleEndian>(*v)?,
        AttributeValue::Int(v) => buffer.write_i32::<LittleEndian>(*v)?,
        AttributeValue::UInt(v) => buffer.write_u32::<LittleEndian>(*v)?,
        AttributeValue::Float(v) => buffer.write_f32::<LittleEndian>(*v)?,
        AttributeValue::Double(v) => buffer.write_f64::<LittleEndian>(*v)?,
        AttributeValue::IVec2(v) => write_ivec(buffer, v)?,
        AttributeValue::IVec3(v) => write_ivec(buffer, v)?,
        AttributeValue::IVec4(v) => write_ivec(buffer, v)?,
        AttributeValue::Vec2(v) => write_fvec(buffer, v)?,
        AttributeValue::Vec3(v) => write_fvec(buffer, v)?,
        AttributeValue::Vec4(v) => write_fvec(buffer, v)?,
        AttributeValue::Mat2(_)
        | AttributeValue::Mat3(_)
        | AttributeValue::Mat3x4(_)
        | AttributeValue::Mat4x3(_)
        | AttributeValue::Mat4(_) => return Err(unsupported(value.attribute_type())),
        AttributeValue::Bool(v) => buffer.push(u8::from(*v)),
        AttributeValue::String(s)
        | AttributeValue::Path(s)
        | AttributeValue::FixedString(s)
        | AttributeValue::LSString(s)
        | AttributeValue::WString(s)
        | AttributeValue::LSWString(s) => {
            buffer.extend_from_slice(s.as_bytes());
            buffer.push(0);
        }
        AttributeValue::ULongLong(v) => buffer.write_u64::<LittleEndian>(*v)?,
        AttributeValue::ScratchBuffer(v) => buffer.extend_from_slice(v),
        AttributeValue::Long(v) => buffer.write_i64::<LittleEndian>(*v)?,
        AttributeValue::Int8(v) => buffer.push(*v as u8),
        AttributeValue::TranslatedString { version, handle } => {
            buffer.write_u16::<LittleEndian>(*version)?;
            let handle_len = if handle.is_empty() {
                0
            } else {
                handle.len() + 1
            };
            buffer.write_i32::<LittleEndian>(handle_len as i32)?;
            if !handle.is_empty() {
                buffer.extend_from_slice(handle.as_bytes());
                buffer.push(0);
            }
        }
        AttributeValue::Uuid(bytes) => buffer.extend_from_slice(bytes),
        AttributeValue::Int64(v) => buffer.write_i64::<LittleEndian>(*v)?,
    }
    Ok(buffer.len() - start)
}

/// Format 16 raw wire bytes as the canonical byte-swapped GUID string.
#[must_use]
pub fn format_uuid(bytes: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[3], bytes[2], bytes[1], bytes[0],
        bytes[5], bytes[4],
        bytes[7], bytes[6],
        bytes[9], bytes[8],
        bytes[11], bytes[10],
        bytes[13], bytes[12],
        bytes[15], bytes[14]
    )
}

fn write_ivec(buffer: &mut Vec<u8>, values: &[i32]) -> Result<()> {
    for v in values {
        buffer.write_i32::<LittleEndian>(*v)?;
    }
    Ok(())
}

fn write_fvec(buffer: &mut Vec<u8>, values: &[f32]) -> Result<()> {
    for v in values {
        buffer.write_f32::<LittleEndian>(*v)?;
    }
    Ok(())
}

fn join_nums<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl std::fmt::Display for AttributeValue {
    /// The normalized string representation of the value.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::None => Ok(()),
            AttributeValue::Byte(v) => write!(f, "{v}"),
            AttributeValue::Short(v) => write!(f, "{v}"),
            AttributeValue::UShort(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::UInt(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Double(v) => write!(f, "{v}"),
            AttributeValue::IVec2(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::IVec3(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::IVec4(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Vec2(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Vec3(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Vec4(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Mat2(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Mat3(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Mat3x4(v) | AttributeValue::Mat4x3(v) => {
                write!(f, "{}", join_nums(v))
            }
            AttributeValue::Mat4(v) => write!(f, "{}", join_nums(v)),
            AttributeValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            AttributeValue::String(s)
            | AttributeValue::Path(s)
            | AttributeValue::FixedString(s)
            | AttributeValue::LSString(s)
            | AttributeValue::WString(s)
            | AttributeValue::LSWString(s) => write!(f, "{s}"),
            AttributeValue::ULongLong(v) => write!(f, "{v}"),
            AttributeValue::ScratchBuffer(v) => write!(f, "{}", BASE64.encode(v)),
            AttributeValue::Long(v) => write!(f, "{v}"),
            AttributeValue::Int8(v) => write!(f, "{v}"),
            AttributeValue::TranslatedString { handle, .. } => write!(f, "{handle}"),
            AttributeValue::Uuid(bytes) => write!(f, "{}", format_uuid(bytes)),
            AttributeValue::Int64(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let values = [
            AttributeValue::Byte(0xAB),
            AttributeValue::Int(-42),
            AttributeValue::Float(1.5),
            AttributeValue::Double(-2.25),
            AttributeValue::Int64(i64::MIN),
            AttributeValue::ULongLong(u64::MAX),
        ];
        for v in values {
            let mut buf = Vec::new();
            encode_value(&mut buf, &v).unwrap();
            assert_eq!(decode_value(v.attribute_type(), &buf).unwrap(), v);
        }
    }

    #[test]
    fn translated_string_round_trip() {
        let v = AttributeValue::TranslatedString {
            version: 3,
            handle: "h12345678gabcd".to_string(),
        };
        let mut buf = Vec::new();
        encode_value(&mut buf, &v).unwrap();
        assert_eq!(decode_value(AttributeType::TranslatedString, &buf).unwrap(), v);
    }

    #[test]
    fn uuid_display_is_byte_swapped() {
        let raw: [u8; 16] = [
            0x44, 0x33, 0x22, 0x11, 0x66, 0x55, 0x88, 0x77, 0xAA, 0x99, 0xCC, 0xBB, 0xEE, 0xDD,
            0x00, 0xFF,
        ];
        assert_eq!(
            format_uuid(&raw),
            "11223344-5566-7788-99aa-bbccddeeff00"
        );
    }

    #[test]
    fn matrices_are_an_encode_gap() {
        let mut buf = Vec::new();
        let err = encode_value(&mut buf, &AttributeValue::Mat4([0.0; 16])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttributeType { .. }));
    }

    #[test]
    fn translated_fs_string_is_rejected_on_decode() {
        let err = decode_value(AttributeType::TranslatedFSString, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttributeType { .. }));
    }
}
