//! Encoding/decoding of maps to byte streams.
//!
//! Wire format for a map: a big-endian `u64` entry count, then that
//! many (key, value) pairs in current slot order, empty slots skipped.
//! Decoding pre-sizes the table from the count and replays the
//! insertions; it reproduces structural equality with the encoded map,
//! not its exact slot layout.

use core::hash::{BuildHasher, Hash};
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::map::CompactHashMap;

/// Error during serialization.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid UTF-8 in decoded string")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("declared length {0} does not fit in memory")]
    LengthOverflow(u64),
}

/// Serializes a value into a byte stream.
pub trait Encode {
    /// Writes `self` into `writer`.
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError>;

    /// Serializes into a fresh vector.
    fn encode_into_vec(&self) -> Vec<u8> {
        let mut v = vec![];
        self.encode_into(&mut v).expect("cannot fail");
        v
    }
}

/// Deserializes a value from a byte stream.
pub trait Decode {
    /// Reads one value from `reader`.
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

macro_rules! impl_coding_for_int {
    ($($t:ty => $read:ident, $write:ident);* $(;)?) => {
        $(
            impl Encode for $t {
                fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
                    writer.$write::<BigEndian>(*self)?;
                    Ok(())
                }
            }

            impl Decode for $t {
                fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
                    Ok(reader.$read::<BigEndian>()?)
                }
            }
        )*
    };
}

impl_coding_for_int! {
    u16 => read_u16, write_u16;
    u32 => read_u32, write_u32;
    u64 => read_u64, write_u64;
    i16 => read_i16, write_i16;
    i32 => read_i32, write_i32;
    i64 => read_i64, write_i64;
}

impl Encode for u8 {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u8(*self)?;
        Ok(())
    }
}

impl Decode for u8 {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        Ok(reader.read_u8()?)
    }
}

fn checked_len(raw: u64) -> Result<usize, DecodeError> {
    usize::try_from(raw).map_err(|_| DecodeError::LengthOverflow(raw))
}

impl Encode for String {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<BigEndian>(self.len() as u64)?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl Decode for String {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let len = checked_len(reader.read_u64::<BigEndian>()?)?;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Encode for Vec<u8> {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<BigEndian>(self.len() as u64)?;
        writer.write_all(self)?;
        Ok(())
    }
}

impl Decode for Vec<u8> {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let len = checked_len(reader.read_u64::<BigEndian>()?)?;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<K, V, S> Encode for CompactHashMap<K, V, S>
where
    K: Encode,
    V: Encode,
{
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<BigEndian>(self.len() as u64)?;
        for (k, v) in self.iter() {
            k.encode_into(writer)?;
            v.encode_into(writer)?;
        }
        Ok(())
    }
}

impl<K, V, S> Decode for CompactHashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let count = checked_len(reader.read_u64::<BigEndian>()?)?;
        let mut map = Self::default();
        if count > 0 {
            map.presize_for(count);
        }
        for _ in 0..count {
            let k = K::decode_from(reader)?;
            let v = V::decode_from(reader)?;
            map.insert(k, v);
        }
        Ok(map)
    }
}
