//! MATLAB Level 5 MAT-file reader.
//!
//! ```text
//! ┌──────────────────────── 128-byte header ─────────────────────────┐
//! │ text (116) │ subsys offset (8) │ version (2) │ endian "IM"/"MI" │
//! └──────────────────────────────────────────────────────────────────┘
//! ┌ element ┐┌ element ┐ ...   one miMATRIX (or miCOMPRESSED) per variable
//! ```
//!
//! Only the subset of the format needed for radar scan exports is decoded:
//! numeric, char, cell and struct arrays. Other array classes are kept as
//! opaque [`MatArray::Unsupported`] nodes so that unrelated variables never
//! fail a read.

pub mod array;
pub mod element;

use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

pub use array::{CellArray, CharArray, MatArray, NumericArray, StructArray};
pub use element::Endian;

use crate::error::{ParseError, ParseResult};
use element::{ElementReader, MI_COMPRESSED, MI_MATRIX};

/// Size of the fixed file header.
pub const HEADER_LEN: usize = 128;

const LEVEL5_TEXT: &str = "MATLAB 5.0";
const HDF5_TEXT: &str = "MATLAB 7.3";
const LEVEL5_VERSION: u16 = 0x0100;

/// Parsed file header.
#[derive(Debug, Clone, PartialEq)]
pub struct MatHeader {
    pub text: String,
    pub version: u16,
    pub endian: Endian,
}

impl MatHeader {
    pub fn parse(bytes: &[u8]) -> ParseResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ParseError::invalid_format(format!(
                "file is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let text = String::from_utf8_lossy(&bytes[..116])
            .trim_end_matches(['\0', ' '])
            .to_string();
        if text.starts_with(HDF5_TEXT) {
            return Err(ParseError::Unsupported(
                "MAT v7.3 (HDF5-based) files".to_string(),
            ));
        }
        if !text.starts_with(LEVEL5_TEXT) {
            return Err(ParseError::invalid_format("missing 'MATLAB 5.0' header text"));
        }

        let endian = match &bytes[126..128] {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other => {
                return Err(ParseError::invalid_format(format!(
                    "unknown endian indicator {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        let raw_version = [bytes[124], bytes[125]];
        let version = match endian {
            Endian::Little => u16::from_le_bytes(raw_version),
            Endian::Big => u16::from_be_bytes(raw_version),
        };
        if version != LEVEL5_VERSION {
            warn!(version, "Unexpected MAT-file version, reading as Level 5");
        }

        Ok(Self {
            text,
            version,
            endian,
        })
    }
}

/// A named top-level variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MatVariable {
    pub name: String,
    pub value: MatArray,
}

/// A whole MAT-file, variables in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatFile {
    pub header: MatHeader,
    pub variables: Vec<MatVariable>,
}

impl MatFile {
    pub fn from_bytes(bytes: Bytes) -> ParseResult<Self> {
        let header = MatHeader::parse(&bytes)?;
        let endian = header.endian;
        let mut reader = ElementReader::new(bytes.slice(HEADER_LEN..), endian);
        let mut variables = Vec::new();

        while !reader.is_exhausted() {
            let element = reader.next_element()?;
            let payload = match element.data_type {
                MI_MATRIX => element.data,
                MI_COMPRESSED => inflate(&element.data, endian)?,
                other => {
                    debug!(data_type = other, "Skipping non-array top-level element");
                    continue;
                }
            };

            let (name, value) = array::parse_matrix(payload, endian)?;
            if name.is_empty() {
                debug!("Skipping unnamed top-level array");
                continue;
            }
            variables.push(MatVariable { name, value });
        }

        Ok(Self { header, variables })
    }

    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }
}

/// Inflate a compressed element and return the payload of the `miMATRIX`
/// element inside it.
fn inflate(data: &[u8], endian: Endian) -> ParseResult<Bytes> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut inflated)
        .map_err(|e| ParseError::Decompression(e.to_string()))?;

    let mut inner = ElementReader::new(Bytes::from(inflated), endian);
    let element = inner.next_element()?;
    if element.data_type != MI_MATRIX {
        return Err(ParseError::invalid_format(format!(
            "compressed element holds type {}, expected an array",
            element.data_type
        )));
    }
    Ok(element.data)
}
