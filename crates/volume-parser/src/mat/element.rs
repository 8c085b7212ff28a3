//! Data element tags and payload decoding.
//!
//! Every piece of a Level 5 MAT-file is a tagged element:
//!
//! ```text
//! regular:  [u32 type][u32 nbytes][nbytes of data][pad to 8]
//! small:    [u16 nbytes|u16 type ][4 bytes of data]        (nbytes <= 4)
//! ```
//!
//! Compressed elements are never padded.

use bytes::{Buf, Bytes};

use crate::error::{ParseError, ParseResult};

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;
pub const MI_UTF32: u32 = 18;

/// Byte order declared in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// One tagged element with its payload (padding stripped).
#[derive(Debug, Clone)]
pub struct Element {
    pub data_type: u32,
    pub data: Bytes,
}

/// Sequential reader over a run of elements.
pub struct ElementReader {
    buf: Bytes,
    endian: Endian,
}

impl ElementReader {
    pub fn new(buf: Bytes, endian: Endian) -> Self {
        Self { buf, endian }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// True once fewer bytes remain than the smallest possible tag.
    pub fn is_exhausted(&self) -> bool {
        self.buf.remaining() < 8
    }

    fn get_u32(&mut self) -> u32 {
        match self.endian {
            Endian::Little => self.buf.get_u32_le(),
            Endian::Big => self.buf.get_u32(),
        }
    }

    pub fn next_element(&mut self) -> ParseResult<Element> {
        if self.buf.remaining() < 8 {
            return Err(ParseError::invalid_format(format!(
                "truncated element tag ({} bytes left)",
                self.buf.remaining()
            )));
        }

        let first = self.get_u32();
        let small_size = (first >> 16) as usize;
        if small_size != 0 {
            if small_size > 4 {
                return Err(ParseError::invalid_format(format!(
                    "small element declares {} bytes",
                    small_size
                )));
            }
            let data = self.buf.split_to(4).slice(..small_size);
            return Ok(Element {
                data_type: first & 0xffff,
                data,
            });
        }

        let data_type = first;
        let nbytes = self.get_u32() as usize;
        if nbytes > self.buf.remaining() {
            return Err(ParseError::invalid_format(format!(
                "element of type {} declares {} bytes but only {} remain",
                data_type,
                nbytes,
                self.buf.remaining()
            )));
        }
        let data = self.buf.split_to(nbytes);

        if data_type != MI_COMPRESSED {
            let pad = (8 - nbytes % 8) % 8;
            self.buf.advance(pad.min(self.buf.remaining()));
        }

        Ok(Element { data_type, data })
    }

    /// Next element, which must be of `expected` type.
    pub fn expect(&mut self, expected: u32, what: &str) -> ParseResult<Element> {
        let element = self.next_element()?;
        if element.data_type != expected {
            return Err(ParseError::invalid_format(format!(
                "{} element has type {}, expected {}",
                what, element.data_type, expected
            )));
        }
        Ok(element)
    }
}

macro_rules! decode_as {
    ($data:expr, $endian:expr, $ty:ty) => {{
        const WIDTH: usize = std::mem::size_of::<$ty>();
        if $data.len() % WIDTH != 0 {
            return Err(ParseError::invalid_format(format!(
                "{} bytes is not a whole number of {}-byte values",
                $data.len(),
                WIDTH
            )));
        }
        $data
            .chunks_exact(WIDTH)
            .map(|chunk| {
                let mut raw = [0u8; WIDTH];
                raw.copy_from_slice(chunk);
                match $endian {
                    Endian::Little => <$ty>::from_le_bytes(raw) as f64,
                    Endian::Big => <$ty>::from_be_bytes(raw) as f64,
                }
            })
            .collect::<Vec<f64>>()
    }};
}

/// Decode a numeric element into `f64` values, whatever its storage type.
pub fn decode_numeric(element: &Element, endian: Endian) -> ParseResult<Vec<f64>> {
    let data = &element.data[..];
    let values = match element.data_type {
        MI_INT8 => decode_as!(data, endian, i8),
        MI_UINT8 => decode_as!(data, endian, u8),
        MI_INT16 => decode_as!(data, endian, i16),
        MI_UINT16 => decode_as!(data, endian, u16),
        MI_INT32 => decode_as!(data, endian, i32),
        MI_UINT32 => decode_as!(data, endian, u32),
        MI_SINGLE => decode_as!(data, endian, f32),
        MI_DOUBLE => decode_as!(data, endian, f64),
        MI_INT64 => decode_as!(data, endian, i64),
        MI_UINT64 => decode_as!(data, endian, u64),
        other => {
            return Err(ParseError::invalid_format(format!(
                "data type {} is not numeric",
                other
            )))
        }
    };
    Ok(values)
}

/// Decode a dimensions (or other integer) element into sizes.
pub fn decode_sizes(element: &Element, endian: Endian) -> ParseResult<Vec<usize>> {
    decode_numeric(element, endian)?
        .into_iter()
        .map(|v| {
            if v < 0.0 || v.fract() != 0.0 {
                Err(ParseError::invalid_format(format!("invalid dimension {}", v)))
            } else {
                Ok(v as usize)
            }
        })
        .collect()
}

/// Decode a character data element.
pub fn decode_chars(element: &Element, endian: Endian) -> ParseResult<Vec<char>> {
    let data = &element.data[..];
    let chars = match element.data_type {
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = decode_as!(data, endian, u16)
                .into_iter()
                .map(|v| v as u16)
                .collect();
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        MI_INT8 | MI_UINT8 | MI_UTF8 => String::from_utf8_lossy(data).chars().collect(),
        MI_UTF32 | MI_UINT32 => decode_as!(data, endian, u32)
            .into_iter()
            .map(|v| char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        other => {
            return Err(ParseError::invalid_format(format!(
                "data type {} is not character data",
                other
            )))
        }
    };
    Ok(chars)
}
