//! MATLAB array values and `miMATRIX` decoding.

use bytes::Bytes;
use tracing::debug;

use super::element::{
    decode_chars, decode_numeric, decode_sizes, Element, ElementReader, Endian, MI_INT8, MI_MATRIX,
    MI_UINT32,
};
use crate::error::{ParseError, ParseResult};

const MX_CELL: u8 = 1;
const MX_STRUCT: u8 = 2;
const MX_CHAR: u8 = 4;
const MX_DOUBLE: u8 = 6;
const MX_UINT64: u8 = 15;

const FLAG_COMPLEX: u32 = 0x0800;

/// Nesting limit for cells and structs.
const MAX_DEPTH: usize = 32;

/// Smallest encoded element: a bare 8-byte tag.
const MIN_ELEMENT_LEN: usize = 8;

/// Numeric matrix, column-major, widened to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub class: u8,
    pub dims: Vec<usize>,
    pub real: Vec<f64>,
    pub imag: Option<Vec<f64>>,
}

impl NumericArray {
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn is_complex(&self) -> bool {
        self.imag.is_some()
    }

    /// First element, as MATLAB scalars are 1x1 matrices.
    pub fn scalar(&self) -> Option<f64> {
        self.real.first().copied()
    }

    /// Real values, or the magnitude of complex ones.
    pub fn magnitude(&self) -> Vec<f64> {
        match &self.imag {
            Some(imag) => self
                .real
                .iter()
                .zip(imag)
                .map(|(re, im)| re.hypot(*im))
                .collect(),
            None => self.real.clone(),
        }
    }
}

/// Character array.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    /// Characters in column-major order.
    pub chars: Vec<char>,
}

impl CharArray {
    /// Rows joined with newlines, each with trailing padding removed.
    pub fn text(&self) -> String {
        let rows = self.dims.first().copied().unwrap_or(0);
        if rows <= 1 {
            return self.chars.iter().collect::<String>().trim_end().to_string();
        }
        let cols = self.chars.len() / rows;
        (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| self.chars[r + c * rows])
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims: Vec<usize>,
    pub items: Vec<MatArray>,
}

/// Struct array; `elements[i][f]` is field `fields[f]` of element `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub dims: Vec<usize>,
    pub fields: Vec<String>,
    pub elements: Vec<Vec<MatArray>>,
}

impl StructArray {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn field(&self, index: usize, name: &str) -> Option<&MatArray> {
        let column = self.fields.iter().position(|f| f == name)?;
        self.elements.get(index)?.get(column)
    }
}

/// A decoded MATLAB value.
#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
    /// Sparse, object, function handle and other classes, kept by class id.
    Unsupported { class: u8, dims: Vec<usize> },
    /// Zero-length matrix (`[]`).
    Empty,
}

impl MatArray {
    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MatArray::Numeric(_) => "numeric",
            MatArray::Char(_) => "char",
            MatArray::Cell(_) => "cell",
            MatArray::Struct(_) => "struct",
            MatArray::Unsupported { .. } => "unsupported class",
            MatArray::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MatArray::Numeric(n) => n.is_empty(),
            MatArray::Char(c) => c.chars.is_empty(),
            MatArray::Cell(c) => c.items.is_empty(),
            MatArray::Struct(s) => s.is_empty(),
            MatArray::Unsupported { dims, .. } => dims.iter().any(|d| *d == 0),
            MatArray::Empty => true,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            MatArray::Numeric(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            MatArray::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Text of a char array, or of a single-item cell holding one.
    pub fn as_text(&self) -> Option<String> {
        match self {
            MatArray::Char(c) => Some(c.text()),
            MatArray::Cell(c) if c.items.len() == 1 => c.items[0].as_text(),
            _ => None,
        }
    }
}

/// Decode the payload of a `miMATRIX` element into its name and value.
pub fn parse_matrix(data: Bytes, endian: Endian) -> ParseResult<(String, MatArray)> {
    parse_matrix_at(data, endian, 0)
}

fn parse_matrix_at(data: Bytes, endian: Endian, depth: usize) -> ParseResult<(String, MatArray)> {
    if depth > MAX_DEPTH {
        return Err(ParseError::invalid_format("arrays nested too deeply"));
    }
    if data.is_empty() {
        return Ok((String::new(), MatArray::Empty));
    }

    let mut reader = ElementReader::new(data, endian);

    let flags_element = reader.expect(MI_UINT32, "array flags")?;
    let flags = decode_numeric(&flags_element, endian)?
        .first()
        .copied()
        .ok_or_else(|| ParseError::invalid_format("array flags element is empty"))?
        as u32;
    let class = (flags & 0xff) as u8;
    let complex = flags & FLAG_COMPLEX != 0;

    let dims_element = reader.next_element()?;
    let dims = decode_sizes(&dims_element, endian)?;
    let numel = dims
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| {
            ParseError::invalid_format(format!("array dimensions {:?} overflow", dims))
        })?;

    let name_element = reader.expect(MI_INT8, "array name")?;
    let name = String::from_utf8_lossy(&name_element.data)
        .trim_end_matches('\0')
        .to_string();

    let value = match class {
        MX_CELL => {
            check_nested_count(&reader, numel, "cell items")?;
            let mut items = Vec::with_capacity(numel);
            for _ in 0..numel {
                items.push(nested(&mut reader, endian, depth)?);
            }
            MatArray::Cell(CellArray { dims, items })
        }
        MX_STRUCT => {
            let len_element = reader.next_element()?;
            let name_len = decode_sizes(&len_element, endian)?
                .first()
                .copied()
                .filter(|len| *len > 0)
                .ok_or_else(|| ParseError::invalid_format("struct field name length is zero"))?;
            let names_element = reader.expect(MI_INT8, "struct field names")?;
            let fields: Vec<String> = names_element
                .data
                .chunks(name_len)
                .map(|chunk| {
                    String::from_utf8_lossy(chunk)
                        .trim_end_matches('\0')
                        .to_string()
                })
                .collect();

            let nested_count = numel.checked_mul(fields.len().max(1)).ok_or_else(|| {
                ParseError::invalid_format("struct element count overflows")
            })?;
            check_nested_count(&reader, nested_count, "struct fields")?;
            let mut elements = Vec::with_capacity(numel);
            for _ in 0..numel {
                let mut values = Vec::with_capacity(fields.len());
                for _ in &fields {
                    values.push(nested(&mut reader, endian, depth)?);
                }
                elements.push(values);
            }
            MatArray::Struct(StructArray {
                dims,
                fields,
                elements,
            })
        }
        MX_CHAR => {
            let chars = if reader.is_exhausted() {
                Vec::new()
            } else {
                decode_chars(&reader.next_element()?, endian)?
            };
            MatArray::Char(CharArray { dims, chars })
        }
        MX_DOUBLE..=MX_UINT64 => {
            let real = read_values(&mut reader, endian, numel)?;
            let imag = if complex {
                Some(read_values(&mut reader, endian, numel)?)
            } else {
                None
            };
            MatArray::Numeric(NumericArray {
                class,
                dims,
                real,
                imag,
            })
        }
        other => {
            debug!(class = other, name = %name, "Keeping array of unsupported class");
            MatArray::Unsupported { class: other, dims }
        }
    };

    Ok((name, value))
}

/// Every nested array needs at least a tag, so a declared count larger than
/// the remaining bytes allow is corrupt. Checked before anything is allocated.
fn check_nested_count(reader: &ElementReader, count: usize, what: &str) -> ParseResult<()> {
    let room = reader.remaining() / MIN_ELEMENT_LEN;
    if count > room {
        return Err(ParseError::invalid_format(format!(
            "{} {} declared but only {} bytes remain",
            count,
            what,
            reader.remaining()
        )));
    }
    Ok(())
}

fn nested(reader: &mut ElementReader, endian: Endian, depth: usize) -> ParseResult<MatArray> {
    let Element { data_type, data } = reader.next_element()?;
    if data_type != MI_MATRIX {
        return Err(ParseError::invalid_format(format!(
            "expected nested array, found element type {}",
            data_type
        )));
    }
    parse_matrix_at(data, endian, depth + 1).map(|(_, value)| value)
}

fn read_values(reader: &mut ElementReader, endian: Endian, numel: usize) -> ParseResult<Vec<f64>> {
    if numel == 0 && reader.is_exhausted() {
        return Ok(Vec::new());
    }
    let values = decode_numeric(&reader.next_element()?, endian)?;
    if values.len() != numel {
        return Err(ParseError::invalid_format(format!(
            "array holds {} values but its dimensions call for {}",
            values.len(),
            numel
        )));
    }
    Ok(values)
}
