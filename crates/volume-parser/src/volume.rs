//! Assembly of a [`RadarVolume`] from the `volume` record of a scan export.
//!
//! The record is a struct array with one element per sweep. Scan-wide
//! metadata and the azimuth vector are read from the first sweep; every
//! sweep contributes its elevation angle and a `prod` struct array holding
//! one `ranges x azimuths` block per product.

use std::collections::BTreeMap;

use radar_common::{Product, RadarVolume, VolumeArray, VolumeMetadata, VolumeShape};
use tracing::{debug, warn};

use crate::error::{ParseError, ParseResult};
use crate::mat::{MatArray, MatFile, NumericArray, StructArray};

/// Name of the top-level variable holding the scan.
pub const VOLUME_KEY: &str = "volume";

/// One product's data block from one sweep, still in file layout.
struct Block {
    ranges: usize,
    azimuths: usize,
    values: Vec<f64>,
}

/// Build a validated volume from a decoded MAT-file.
pub fn assemble_volume(file: &MatFile) -> ParseResult<RadarVolume> {
    let record = file.get(VOLUME_KEY).ok_or(ParseError::MissingVolumeKey)?;
    let sweeps = match record {
        MatArray::Struct(s) => s,
        MatArray::Empty => return Err(ParseError::EmptyVolume),
        other => {
            return Err(ParseError::invalid_field(
                VOLUME_KEY,
                format!("expected a struct array, found {}", other.kind()),
            ))
        }
    };
    if sweeps.is_empty() {
        return Err(ParseError::EmptyVolume);
    }

    let azimuths_deg = required_vector(sweeps, 0, "az_deg")?;
    let start_range_km = required_scalar(sweeps, 0, "start_range_km")?;

    let mut elevations_deg = Vec::with_capacity(sweeps.len());
    let mut blocks: BTreeMap<Product, Vec<Option<Block>>> = BTreeMap::new();
    let mut resolution_m = None;

    for sweep in 0..sweeps.len() {
        elevations_deg.push(required_scalar(sweeps, sweep, "sweep_el_deg")?);

        let prod = match required_field(sweeps, sweep, "prod")? {
            MatArray::Struct(s) => s,
            other => {
                return Err(ParseError::invalid_field(
                    "prod",
                    format!("expected a struct array, found {}", other.kind()),
                ))
            }
        };

        for entry in 0..prod.len() {
            if resolution_m.is_none() {
                resolution_m = Some(required_scalar(prod, entry, "dr")?);
            }

            let code = required_field(prod, entry, "type")?
                .as_text()
                .ok_or_else(|| ParseError::invalid_field("type", "expected a product code"))?;
            let Some(product) = Product::from_code(&code) else {
                debug!(code = %code, sweep, "Skipping unknown product code");
                continue;
            };

            let block = read_block(product, required_field(prod, entry, "data")?)?;
            let per_sweep = blocks
                .entry(product)
                .or_insert_with(|| (0..sweeps.len()).map(|_| None).collect());
            if per_sweep[sweep].is_some() {
                warn!(product = %product, sweep, "Duplicate product in sweep, keeping the first");
                continue;
            }
            per_sweep[sweep] = Some(block);
        }
    }

    let resolution_m = resolution_m.ok_or_else(|| ParseError::MissingField("dr".to_string()))?;

    // The first product present fixes the range count; angles fix the rest.
    let ranges = blocks
        .values()
        .flat_map(|per_sweep| per_sweep.iter().flatten())
        .map(|b| b.ranges)
        .next()
        .unwrap_or(0);
    let expected = VolumeShape::new(sweeps.len(), azimuths_deg.len(), ranges);

    let metadata = read_metadata(sweeps, start_range_km, resolution_m / 1000.0);
    let mut builder = RadarVolume::builder(metadata)
        .azimuths_rad(azimuths_deg.iter().map(|d| d.to_radians()).collect())
        .elevations_rad(elevations_deg.iter().map(|d| d.to_radians()).collect());

    for (product, per_sweep) in blocks {
        let array = stack_sweeps(product, per_sweep, expected)?;
        builder = builder.product(product, array);
    }

    let volume = builder.build()?;
    debug!(
        shape = %volume.shape(),
        products = volume.products().len(),
        "Assembled radar volume"
    );
    Ok(volume)
}

fn read_block(product: Product, value: &MatArray) -> ParseResult<Block> {
    let numeric = value.as_numeric().ok_or_else(|| {
        ParseError::invalid_field(
            "data",
            format!("product {} holds {} data", product, value.kind()),
        )
    })?;
    let (ranges, azimuths) = match numeric.dims.as_slice() {
        [rows, cols] => (*rows, *cols),
        dims => {
            return Err(ParseError::invalid_field(
                "data",
                format!("product {} block has dimensions {:?}, expected 2-D", product, dims),
            ))
        }
    };
    Ok(Block {
        ranges,
        azimuths,
        values: numeric.magnitude(),
    })
}

/// Transpose each sweep's `ranges x azimuths` column-major block into the
/// azimuth-major layout and stack the sweeps.
fn stack_sweeps(
    product: Product,
    per_sweep: Vec<Option<Block>>,
    expected: VolumeShape,
) -> ParseResult<VolumeArray> {
    let present = per_sweep.iter().filter(|b| b.is_some()).count();
    let mut data = Vec::with_capacity(expected.len());

    for block in per_sweep {
        let Some(block) = block else {
            return Err(ParseError::ShapeMismatch {
                product,
                expected,
                actual: VolumeShape::new(present, expected.azimuths, expected.ranges),
            });
        };
        if block.azimuths != expected.azimuths || block.ranges != expected.ranges {
            return Err(ParseError::ShapeMismatch {
                product,
                expected,
                actual: VolumeShape::new(expected.elevations, block.azimuths, block.ranges),
            });
        }

        // Column-major storage: value (r, a) sits at r + a * ranges, so each
        // azimuth's range samples are already contiguous.
        for ray in block.values.chunks_exact(block.ranges.max(1)) {
            data.extend(ray.iter().map(|v| {
                if product == Product::Reflectivity && v.is_nan() {
                    0.0
                } else {
                    *v as f32
                }
            }));
        }
    }

    Ok(VolumeArray::new(expected, data)?)
}

fn read_metadata(sweeps: &StructArray, start_range_km: f64, range_resolution_km: f64) -> VolumeMetadata {
    VolumeMetadata {
        radar: optional_text(sweeps, "radar"),
        radar_type: optional_text(sweeps, "type"),
        latitude: optional_scalar(sweeps, "lat"),
        longitude: optional_scalar(sweeps, "lon"),
        antenna_elevation_m: optional_scalar(sweeps, "elev_m"),
        antenna_height_m: optional_scalar(sweeps, "height_m"),
        wavelength_m: optional_scalar(sweeps, "lambda_m"),
        prf_hz: optional_scalar(sweeps, "prf_hz"),
        nyquist_velocity_ms: optional_scalar(sweeps, "nyq_m_per_s"),
        date: optional_text(sweeps, "datestr"),
        time: optional_scalar(sweeps, "time"),
        vcp: optional_scalar(sweeps, "vcp"),
        azimuth_beamwidth_deg: optional_scalar(sweeps, "bw_deg"),
        start_range_km,
        range_resolution_km,
    }
}

fn required_field<'a>(record: &'a StructArray, index: usize, name: &str) -> ParseResult<&'a MatArray> {
    record
        .field(index, name)
        .ok_or_else(|| ParseError::MissingField(name.to_string()))
}

fn required_numeric<'a>(
    record: &'a StructArray,
    index: usize,
    name: &str,
) -> ParseResult<&'a NumericArray> {
    let value = required_field(record, index, name)?;
    match value.as_numeric() {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(ParseError::invalid_field(
            name,
            format!("expected numeric data, found {}", describe(value)),
        )),
    }
}

fn required_scalar(record: &StructArray, index: usize, name: &str) -> ParseResult<f64> {
    let numeric = required_numeric(record, index, name)?;
    numeric
        .scalar()
        .ok_or_else(|| ParseError::invalid_field(name, "expected a scalar"))
}

fn required_vector(record: &StructArray, index: usize, name: &str) -> ParseResult<Vec<f64>> {
    Ok(required_numeric(record, index, name)?.real.clone())
}

fn optional_scalar(record: &StructArray, name: &str) -> Option<f64> {
    record
        .field(0, name)
        .and_then(|v| v.as_numeric())
        .and_then(|n| n.scalar())
}

fn optional_text(record: &StructArray, name: &str) -> Option<String> {
    let value = record.field(0, name)?;
    match value {
        MatArray::Numeric(n) => n.scalar().map(|v| v.to_string()),
        other => other.as_text().filter(|t| !t.is_empty()),
    }
}

fn describe(value: &MatArray) -> String {
    if value.is_empty() {
        format!("an empty {} array", value.kind())
    } else {
        format!("{} data", value.kind())
    }
}
