//! Implementations behind the CLI subcommands.
//!
//! Each function returns a serializable report; `main` decides how to print it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use radar_common::{ColorScales, Product, RadarVolume, VolumeMetadata, VolumeShape};
use scan_index::{discover_scans, DiscoveryConfig, ScanIndex, ScanSet};
use serde::Serialize;
use slice_engine::{PointValue, PolarTransform, Slice, SliceEngine, SliceSummary, ViewKind};
use tracing::info;

/// Which slice of a volume to cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRequest {
    pub kind: ViewKind,
    pub product: Product,
    pub elevation: usize,
    pub azimuth: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexedFile {
    pub time: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub name: String,
    pub files: Vec<IndexedFile>,
    pub excluded: usize,
}

impl ScanReport {
    fn new(name: &str, index: &ScanIndex) -> Self {
        Self {
            name: name.to_string(),
            files: index
                .iter()
                .map(|entry| IndexedFile {
                    time: entry.label(),
                    file: entry.file_name(),
                })
                .collect(),
            excluded: index.excluded().len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeReport {
    pub path: PathBuf,
    pub shape: VolumeShape,
    pub products: Vec<Product>,
    pub elevations_deg: Vec<f64>,
    pub azimuths_deg: Vec<f64>,
    pub first_range_km: f64,
    pub last_range_km: f64,
    pub metadata: VolumeMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct SliceReport {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub product_name: String,
    pub units: String,
    pub shape: (usize, usize),
    pub color_domain: (f64, f64),
    pub summary: SliceSummary,
    pub transform: PolarTransform,
}

impl From<&Slice> for SliceReport {
    fn from(slice: &Slice) -> Self {
        Self {
            title: slice.title.clone(),
            x_label: slice.x_label.clone(),
            y_label: slice.y_label.clone(),
            product_name: slice.product_name.clone(),
            units: slice.units.clone(),
            shape: slice.shape(),
            color_domain: slice.color_domain,
            summary: slice.summary(),
            transform: slice.transform.clone(),
        }
    }
}

/// Discover scan folders under `base` and index each one.
pub fn scans(base: &Path, discovery: &DiscoveryConfig) -> Result<Vec<ScanReport>> {
    let scans = discover_scans(base, discovery)
        .with_context(|| format!("Failed to discover scans under {:?}", base))?;
    Ok(scans
        .iter()
        .map(|scan| ScanReport::new(&scan.name, &scan.index()))
        .collect())
}

pub fn load_volume(path: &Path) -> Result<RadarVolume> {
    volume_parser::parse(path).with_context(|| format!("Failed to parse volume {:?}", path))
}

pub fn inspect(path: &Path) -> Result<VolumeReport> {
    let volume = load_volume(path)?;
    let degrees = |values: &[f64]| -> Vec<f64> {
        values.iter().map(|v| v.to_degrees()).collect()
    };
    Ok(VolumeReport {
        path: path.to_path_buf(),
        shape: volume.shape(),
        products: volume.products().products(),
        elevations_deg: degrees(volume.elevations_rad()),
        azimuths_deg: degrees(volume.azimuths_rad()),
        first_range_km: volume.start_range_km(),
        last_range_km: volume.last_range_km(),
        metadata: volume.metadata().clone(),
    })
}

pub fn slice(path: &Path, request: &SliceRequest, scales: ColorScales) -> Result<Slice> {
    let volume = load_volume(path)?;
    let engine = SliceEngine::new(Arc::new(scales));
    engine
        .extract(
            &volume,
            request.product,
            request.elevation,
            request.azimuth,
            request.kind,
        )
        .with_context(|| format!("Failed to extract slice from {:?}", path))
}

/// Value under `(range_km, angle_deg)`, `None` outside the data.
pub fn query(
    path: &Path,
    request: &SliceRequest,
    scales: ColorScales,
    range_km: f64,
    angle_deg: f64,
) -> Result<Option<PointValue>> {
    let slice = slice(path, request, scales)?;
    Ok(slice.query(range_km, angle_deg))
}

/// Write `slice` as pretty JSON.
pub fn dump_slice(slice: &Slice, out: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(slice)?;
    std::fs::write(out, json).with_context(|| format!("Failed to write slice to {:?}", out))?;
    info!(path = %out.display(), "Wrote slice");
    Ok(())
}

/// Index of scan `name` under `base`, or of the first scan when no name is
/// given.
pub fn discovered_index(
    base: &Path,
    name: Option<&str>,
    discovery: &DiscoveryConfig,
) -> Result<ScanIndex> {
    let scans = discover_scans(base, discovery)
        .with_context(|| format!("Failed to discover scans under {:?}", base))?;
    let scan = match name {
        Some(name) => scans
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| anyhow!("No scan named {:?} under {:?}", name, base))?,
        None => scans
            .first()
            .ok_or_else(|| anyhow!("No scan folders under {:?}", base))?,
    };
    Ok(scan.index())
}

/// Index of a scan in a saved scan set, by name or position.
pub fn scanset_index(path: &Path, scan: Option<&str>) -> Result<ScanIndex> {
    let set = load_scanset(path)?;
    let position = match scan {
        Some(scan) => find_scan(&set, scan)?,
        None => 0,
    };
    Ok(set.index(position)?)
}

pub fn load_scanset(path: &Path) -> Result<ScanSet> {
    ScanSet::load(path).with_context(|| format!("Failed to load scan set {:?}", path))
}

/// Build a scan set from the scan folders under `base` and save it.
pub fn create_scanset(
    out: &Path,
    name: &str,
    base: &Path,
    discovery: &DiscoveryConfig,
) -> Result<ScanSet> {
    let set = ScanSet::from_discovery(name, base, discovery)
        .with_context(|| format!("Failed to build scan set from {:?}", base))?;
    set.save(out)
        .with_context(|| format!("Failed to save scan set to {:?}", out))?;
    info!(path = %out.display(), scans = set.scans().len(), "Saved scan set");
    Ok(set)
}

/// Add `files` to the named (or numbered) scan, creating it when unknown.
pub fn add_files_to_scanset(path: &Path, scan: &str, files: &[PathBuf]) -> Result<ScanSet> {
    let mut set = load_scanset(path)?;
    let position = match find_scan(&set, scan) {
        Ok(position) => position,
        Err(_) => set.add_named_scan(scan),
    };
    set.add_files(position, files.iter().cloned())?;
    set.save(path)
        .with_context(|| format!("Failed to save scan set to {:?}", path))?;
    Ok(set)
}

/// Per-scan index reports for a scan set.
pub fn describe_scanset(set: &ScanSet) -> Result<Vec<ScanReport>> {
    let mut reports = Vec::with_capacity(set.scans().len());
    for (i, scan) in set.scans().iter().enumerate() {
        reports.push(ScanReport::new(&scan.name, &set.index(i)?));
    }
    Ok(reports)
}

fn find_scan(set: &ScanSet, scan: &str) -> Result<usize> {
    if let Some(position) = set.find(scan) {
        return Ok(position);
    }
    match scan.parse::<usize>() {
        Ok(position) if position < set.scans().len() => Ok(position),
        _ => Err(anyhow!("Scan set {:?} has no scan {:?}", set.name(), scan)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{create_scan_tree, temp_test_dir, MatOptions, SyntheticVolume};

    const FILES: &[&str] = &[
        "HRUS_240428_020033000_100.mat",
        "HRUS_240428_020105000_100.mat",
        "notes.mat",
    ];

    fn scan_tree() -> tempfile::TempDir {
        let dir = temp_test_dir();
        let bytes = SyntheticVolume::default().to_mat_bytes(MatOptions::compressed());
        create_scan_tree(
            dir.path(),
            "MATLAB",
            &[("scan_01", FILES), ("scan_02", &FILES[..1])],
            &bytes,
        );
        dir
    }

    fn request(kind: ViewKind) -> SliceRequest {
        SliceRequest {
            kind,
            product: Product::Velocity,
            elevation: 1,
            azimuth: 2,
        }
    }

    #[test]
    fn test_scans_report_counts_exclusions() {
        let dir = scan_tree();
        let reports = scans(dir.path(), &DiscoveryConfig::default()).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "scan_01");
        assert_eq!(reports[0].files.len(), 2);
        assert_eq!(reports[0].excluded, 1);
        assert!(reports[0]
            .files
            .iter()
            .any(|f| f.time == "04/24/2028 02:00:33"));
        assert_eq!(reports[1].files.len(), 1);
    }

    #[test]
    fn test_inspect_reports_dimensions() {
        let dir = scan_tree();
        let path = dir
            .path()
            .join("scan_02")
            .join("MATLAB")
            .join(FILES[0]);
        let report = inspect(&path).unwrap();

        assert_eq!(report.shape, VolumeShape::new(3, 4, 5));
        assert_eq!(report.products, vec![Product::Reflectivity, Product::Velocity]);
        assert_eq!(report.metadata.radar.as_deref(), Some("HRUS"));
        assert!((report.elevations_deg[1] - 2.5).abs() < 1e-9);
        assert!((report.azimuths_deg[0] + 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_and_query() {
        let dir = scan_tree();
        let path = dir.path().join("scan_02").join("MATLAB").join(FILES[0]);

        let ppi = slice(&path, &request(ViewKind::Ppi), ColorScales::default()).unwrap();
        assert_eq!(ppi.shape(), (4, 5));
        let report = SliceReport::from(&ppi);
        assert_eq!(report.title, "PPI (V)");
        assert_eq!(report.color_domain, (-50.0, 50.0));

        // Second azimuth (-15 deg), bin 3 (2.75 km).
        let point = query(&path, &request(ViewKind::Ppi), ColorScales::default(), 2.8, -14.0)
            .unwrap()
            .unwrap();
        assert_eq!(point.angle_index, 1);
        assert_eq!(point.range_index, 3);
        assert_eq!(point.value, test_utils::sample_value(1, 1, 1, 3) as f32);

        assert!(query(&path, &request(ViewKind::Ppi), ColorScales::default(), 1.0, 0.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_query_with_configured_scales() {
        let dir = scan_tree();
        let path = dir.path().join("scan_02").join("MATLAB").join(FILES[0]);
        let colors = dir.path().join("colors.yaml");
        std::fs::write(
            &colors,
            "V:\n  label: Velocity (m/s)\n  units: m/s\n  min: -5\n  max: 5\n  colors: [blue, red]\n",
        )
        .unwrap();
        let config = crate::config::ViewerConfig {
            color_scales: Some(colors),
            ..Default::default()
        };

        let scales = config.color_scales().unwrap();
        let ppi = slice(&path, &request(ViewKind::Ppi), scales.clone()).unwrap();
        assert_eq!(SliceReport::from(&ppi).color_domain, (-5.0, 5.0));

        // Colors never change the sampled value.
        let point = query(&path, &request(ViewKind::Ppi), scales, 2.8, -14.0)
            .unwrap()
            .unwrap();
        assert_eq!(point.value, test_utils::sample_value(1, 1, 1, 3) as f32);
    }

    #[test]
    fn test_slice_missing_file() {
        let result = slice(
            Path::new("/no/such/scan.mat"),
            &request(ViewKind::Rhi),
            ColorScales::default(),
        );
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to parse volume"), "{}", message);
    }

    #[test]
    fn test_discovered_index_by_name() {
        let dir = scan_tree();
        let config = DiscoveryConfig::default();

        assert_eq!(discovered_index(dir.path(), None, &config).unwrap().len(), 2);
        assert_eq!(
            discovered_index(dir.path(), Some("scan_02"), &config)
                .unwrap()
                .len(),
            1
        );
        assert!(discovered_index(dir.path(), Some("scan_99"), &config).is_err());
    }

    #[test]
    fn test_scanset_create_show_and_add_files() {
        let dir = scan_tree();
        let set_path = dir.path().join("set.json");
        let config = DiscoveryConfig::default();

        let set = create_scanset(&set_path, "April", dir.path(), &config).unwrap();
        assert_eq!(set.scans().len(), 2);

        let extra = dir.path().join("scan_01").join("MATLAB").join(FILES[1]);
        let set = add_files_to_scanset(&set_path, "scan_02", &[extra.clone()]).unwrap();
        assert_eq!(set.scans()[1].len(), 2);

        let set = add_files_to_scanset(&set_path, "Extra", &[extra]).unwrap();
        assert_eq!(set.scans().len(), 3);
        assert_eq!(set.scans()[2].name, "Extra");

        let reloaded = load_scanset(&set_path).unwrap();
        assert_eq!(reloaded, set);
        let reports = describe_scanset(&reloaded).unwrap();
        assert_eq!(reports[1].files.len(), 2);

        assert_eq!(scanset_index(&set_path, Some("1")).unwrap().len(), 2);
        assert!(scanset_index(&set_path, Some("missing")).is_err());
    }
}
