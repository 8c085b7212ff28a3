//! Minimal MAT-file (Level 5) writer for building test fixtures.
//!
//! Supports exactly what the radar scan files use: double matrices (real and
//! complex), char arrays, cells, and struct arrays. Variables can be written
//! plain or zlib-compressed, in either byte order.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

const MI_INT8: u32 = 1;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_CHAR: u32 = 4;
const MX_DOUBLE: u32 = 6;
const COMPLEX_FLAG: u32 = 0x0800;

/// A MATLAB value tree to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    /// Real double matrix, column-major.
    Double { dims: Vec<usize>, data: Vec<f64> },
    /// Complex double matrix, column-major.
    Complex {
        dims: Vec<usize>,
        real: Vec<f64>,
        imag: Vec<f64>,
    },
    /// Single-row char array.
    Char(String),
    Cell { dims: Vec<usize>, items: Vec<MatValue> },
    /// Struct array: `elements[i][f]` is field `fields[f]` of element `i`.
    Struct {
        dims: Vec<usize>,
        fields: Vec<String>,
        elements: Vec<Vec<MatValue>>,
    },
    /// Zero-byte matrix, as MATLAB writes `[]`.
    Empty,
}

impl MatValue {
    pub fn scalar(value: f64) -> Self {
        MatValue::Double {
            dims: vec![1, 1],
            data: vec![value],
        }
    }

    pub fn row(values: &[f64]) -> Self {
        MatValue::Double {
            dims: vec![1, values.len()],
            data: values.to_vec(),
        }
    }

    /// `rows x cols` matrix from column-major data.
    pub fn matrix(rows: usize, cols: usize, column_major: Vec<f64>) -> Self {
        assert_eq!(rows * cols, column_major.len(), "matrix data length");
        MatValue::Double {
            dims: vec![rows, cols],
            data: column_major,
        }
    }

    pub fn text(s: &str) -> Self {
        MatValue::Char(s.to_string())
    }

    /// 1x1 struct from `(field, value)` pairs.
    pub fn record(fields: Vec<(&str, MatValue)>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        MatValue::Struct {
            dims: vec![1, 1],
            fields: names,
            elements: vec![values],
        }
    }

    /// 1xN struct array. Every element must list the same fields in the same
    /// order.
    pub fn struct_row(elements: Vec<Vec<(&str, MatValue)>>) -> Self {
        let fields: Vec<String> = elements
            .first()
            .map(|e| e.iter().map(|(name, _)| name.to_string()).collect())
            .unwrap_or_default();
        let n = elements.len();
        let elements = elements
            .into_iter()
            .map(|e| {
                let names: Vec<String> = e.iter().map(|(name, _)| name.to_string()).collect();
                assert_eq!(names, fields, "struct elements must share fields");
                e.into_iter().map(|(_, value)| value).collect()
            })
            .collect();
        MatValue::Struct {
            dims: vec![1, n],
            fields,
            elements,
        }
    }
}

/// Output options for [`write_mat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatOptions {
    pub compress: bool,
    pub big_endian: bool,
}

impl MatOptions {
    pub fn compressed() -> Self {
        Self {
            compress: true,
            big_endian: false,
        }
    }

    pub fn big_endian() -> Self {
        Self {
            compress: false,
            big_endian: true,
        }
    }
}

/// Serialize named variables into a complete MAT-file image.
pub fn write_mat(variables: &[(&str, MatValue)], options: MatOptions) -> Vec<u8> {
    let enc = Encoder {
        big_endian: options.big_endian,
    };
    let mut out = enc.header();
    for (name, value) in variables {
        let element = enc.matrix(name, value);
        if options.compress {
            let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
            zlib.write_all(&element).expect("zlib write to Vec");
            let compressed = zlib.finish().expect("zlib finish");
            enc.u32(&mut out, MI_COMPRESSED);
            enc.u32(&mut out, compressed.len() as u32);
            out.extend_from_slice(&compressed);
        } else {
            out.extend_from_slice(&element);
        }
    }
    out
}

struct Encoder {
    big_endian: bool,
}

impl Encoder {
    fn header(&self) -> Vec<u8> {
        let mut header = format!(
            "MATLAB 5.0 MAT-file, Platform: test, Created on: fixture{}",
            if self.big_endian { " (big-endian)" } else { "" }
        )
        .into_bytes();
        header.resize(116, b' ');
        header.extend_from_slice(&[0u8; 8]);
        if self.big_endian {
            header.extend_from_slice(&[0x01, 0x00]);
            header.extend_from_slice(b"MI");
        } else {
            header.extend_from_slice(&[0x00, 0x01]);
            header.extend_from_slice(b"IM");
        }
        header
    }

    fn u32(&self, out: &mut Vec<u8>, v: u32) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn element(&self, out: &mut Vec<u8>, data_type: u32, payload: &[u8]) {
        self.u32(out, data_type);
        self.u32(out, payload.len() as u32);
        out.extend_from_slice(payload);
        let pad = (8 - payload.len() % 8) % 8;
        out.extend(std::iter::repeat(0u8).take(pad));
    }

    fn i32s(&self, values: &[i32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| {
                if self.big_endian {
                    v.to_be_bytes()
                } else {
                    v.to_le_bytes()
                }
            })
            .collect()
    }

    fn f64s(&self, values: &[f64]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| {
                if self.big_endian {
                    v.to_be_bytes()
                } else {
                    v.to_le_bytes()
                }
            })
            .collect()
    }

    fn u16s(&self, values: &[u16]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| {
                if self.big_endian {
                    v.to_be_bytes()
                } else {
                    v.to_le_bytes()
                }
            })
            .collect()
    }

    /// Full `miMATRIX` element including its tag.
    fn matrix(&self, name: &str, value: &MatValue) -> Vec<u8> {
        let mut payload = Vec::new();
        let (class, dims) = match value {
            MatValue::Empty => {
                let mut out = Vec::new();
                self.element(&mut out, MI_MATRIX, &[]);
                return out;
            }
            MatValue::Double { dims, .. } => (MX_DOUBLE, dims.clone()),
            MatValue::Complex { dims, .. } => (MX_DOUBLE | COMPLEX_FLAG, dims.clone()),
            MatValue::Char(s) => {
                let units = s.encode_utf16().count();
                (MX_CHAR, if units == 0 { vec![0, 0] } else { vec![1, units] })
            }
            MatValue::Cell { dims, .. } => (MX_CELL, dims.clone()),
            MatValue::Struct { dims, .. } => (MX_STRUCT, dims.clone()),
        };

        let mut flags = Vec::new();
        self.u32(&mut flags, class);
        self.u32(&mut flags, 0);
        self.element(&mut payload, MI_UINT32, &flags);

        let dims: Vec<i32> = dims.iter().map(|d| *d as i32).collect();
        self.element(&mut payload, MI_INT32, &self.i32s(&dims));
        self.element(&mut payload, MI_INT8, name.as_bytes());

        match value {
            MatValue::Double { data, .. } => {
                self.element(&mut payload, MI_DOUBLE, &self.f64s(data));
            }
            MatValue::Complex { real, imag, .. } => {
                self.element(&mut payload, MI_DOUBLE, &self.f64s(real));
                self.element(&mut payload, MI_DOUBLE, &self.f64s(imag));
            }
            MatValue::Char(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                self.element(&mut payload, MI_UINT16, &self.u16s(&units));
            }
            MatValue::Cell { items, .. } => {
                for item in items {
                    payload.extend_from_slice(&self.matrix("", item));
                }
            }
            MatValue::Struct {
                fields, elements, ..
            } => {
                let len = fields.iter().map(|f| f.len()).max().unwrap_or(0) + 1;
                self.element(&mut payload, MI_INT32, &self.i32s(&[len as i32]));
                let mut names = Vec::with_capacity(len * fields.len());
                for field in fields {
                    let mut bytes = field.as_bytes().to_vec();
                    bytes.resize(len, 0);
                    names.extend_from_slice(&bytes);
                }
                self.element(&mut payload, MI_INT8, &names);
                for element in elements {
                    for field_value in element {
                        payload.extend_from_slice(&self.matrix("", field_value));
                    }
                }
            }
            MatValue::Empty => {}
        }

        let mut out = Vec::with_capacity(payload.len() + 8);
        self.element(&mut out, MI_MATRIX, &payload);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_marks_byte_order() {
        let le = write_mat(&[], MatOptions::default());
        assert_eq!(le.len(), 128);
        assert!(le.starts_with(b"MATLAB 5.0 MAT-file"));
        assert_eq!(&le[126..128], b"IM");

        let be = write_mat(&[], MatOptions::big_endian());
        assert_eq!(&be[126..128], b"MI");
    }

    #[test]
    fn test_elements_are_eight_byte_aligned() {
        let bytes = write_mat(&[("x", MatValue::text("abc"))], MatOptions::default());
        assert_eq!((bytes.len() - 128) % 8, 0);
    }

    #[test]
    fn test_compressed_variable_has_compressed_tag() {
        let bytes = write_mat(&[("x", MatValue::scalar(1.0))], MatOptions::compressed());
        assert_eq!(u32::from_le_bytes([bytes[128], bytes[129], bytes[130], bytes[131]]), 15);
    }
}
