//! Registry of open slice views.
//!
//! Views are kept in an arena keyed by [`ViewId`]. Ids are never reused, so
//! a stale id held by a closed view is reported instead of aliasing a new
//! one. The elevation/azimuth selection is shared by every view.

use std::collections::BTreeMap;
use std::fmt;

use radar_common::{Product, RadarVolume};
use serde::Serialize;
use tracing::debug;

use crate::engine::SliceEngine;
use crate::error::{SliceError, SliceResult};
use crate::slice::{Slice, ViewKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// One open view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub id: ViewId,
    pub kind: ViewKind,
    pub title: String,
    pub product: Product,
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: BTreeMap<ViewId, View>,
    next_id: u64,
    ppi_opened: usize,
    rhi_opened: usize,
    elevation: usize,
    azimuth: usize,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a view showing reflectivity.
    pub fn register(&mut self, kind: ViewKind) -> ViewId {
        self.register_with_product(kind, Product::Reflectivity)
    }

    pub fn register_with_product(&mut self, kind: ViewKind, product: Product) -> ViewId {
        let opened = match kind {
            ViewKind::Ppi => &mut self.ppi_opened,
            ViewKind::Rhi => &mut self.rhi_opened,
        };
        *opened += 1;
        let title = format!("{} View {}", kind.name(), opened);

        let id = ViewId(self.next_id);
        self.next_id += 1;
        debug!(view = %id, title = %title, "Registered view");

        self.views.insert(
            id,
            View {
                id,
                kind,
                title,
                product,
            },
        );
        id
    }

    pub fn unregister(&mut self, id: ViewId) -> SliceResult<View> {
        let view = self.views.remove(&id).ok_or(SliceError::UnknownView(id))?;
        debug!(view = %id, "Unregistered view");
        Ok(view)
    }

    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn set_product(&mut self, id: ViewId, product: Product) -> SliceResult<()> {
        let view = self.views.get_mut(&id).ok_or(SliceError::UnknownView(id))?;
        view.product = product;
        Ok(())
    }

    /// Current `(elevation, azimuth)` selection.
    pub fn selection(&self) -> (usize, usize) {
        (self.elevation, self.azimuth)
    }

    /// Select a sweep and a radial for every view.
    ///
    /// Both indices are checked against `volume`; on error the previous
    /// selection is kept.
    pub fn select(&mut self, volume: &RadarVolume, elevation: usize, azimuth: usize) -> SliceResult<()> {
        let shape = volume.shape();
        if elevation >= shape.elevations {
            return Err(SliceError::ElevationOutOfRange {
                index: elevation,
                count: shape.elevations,
            });
        }
        if azimuth >= shape.azimuths {
            return Err(SliceError::AzimuthOutOfRange {
                index: azimuth,
                count: shape.azimuths,
            });
        }
        self.elevation = elevation;
        self.azimuth = azimuth;
        Ok(())
    }

    pub fn render(&self, id: ViewId, engine: &SliceEngine, volume: &RadarVolume) -> SliceResult<Slice> {
        let view = self.views.get(&id).ok_or(SliceError::UnknownView(id))?;
        engine.extract(volume, view.product, self.elevation, self.azimuth, view.kind)
    }

    /// Render every view, in registration order.
    pub fn render_all(
        &self,
        engine: &SliceEngine,
        volume: &RadarVolume,
    ) -> Vec<(ViewId, SliceResult<Slice>)> {
        self.views
            .values()
            .map(|view| {
                let slice =
                    engine.extract(volume, view.product, self.elevation, self.azimuth, view.kind);
                (view.id, slice)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use radar_common::ColorScales;
    use test_utils::SyntheticVolume;

    #[test]
    fn test_titles_count_per_kind() {
        let mut registry = ViewRegistry::new();
        let a = registry.register(ViewKind::Ppi);
        let b = registry.register(ViewKind::Rhi);
        let c = registry.register(ViewKind::Ppi);

        assert_eq!(registry.get(a).unwrap().title, "PPI View 1");
        assert_eq!(registry.get(b).unwrap().title, "RHI View 1");
        assert_eq!(registry.get(c).unwrap().title, "PPI View 2");
    }

    #[test]
    fn test_register_with_product() {
        let mut registry = ViewRegistry::new();
        let a = registry.register(ViewKind::Ppi);
        let b = registry.register_with_product(ViewKind::Ppi, Product::Velocity);

        assert_eq!(registry.get(a).unwrap().product, Product::Reflectivity);
        let view = registry.get(b).unwrap();
        assert_eq!(view.product, Product::Velocity);
        assert_eq!(view.title, "PPI View 2");
    }

    #[test]
    fn test_unregister_is_explicit_and_final() {
        let mut registry = ViewRegistry::new();
        let a = registry.register(ViewKind::Ppi);
        registry.unregister(a).unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.unregister(a), Err(SliceError::UnknownView(a)));
        assert_eq!(
            registry.set_product(a, Product::Velocity),
            Err(SliceError::UnknownView(a))
        );

        let b = registry.register(ViewKind::Ppi);
        assert_ne!(a, b);
        assert_eq!(registry.get(b).unwrap().title, "PPI View 2");
    }

    #[test]
    fn test_select_broadcasts_and_validates() {
        let volume = SyntheticVolume::default().expected_volume();
        let engine = SliceEngine::new(Arc::new(ColorScales::default()));
        let mut registry = ViewRegistry::new();
        let ppi = registry.register(ViewKind::Ppi);
        let rhi = registry.register(ViewKind::Rhi);
        registry.set_product(rhi, Product::Velocity).unwrap();

        registry.select(&volume, 2, 1).unwrap();
        assert_eq!(
            registry.select(&volume, 3, 0),
            Err(SliceError::ElevationOutOfRange { index: 3, count: 3 })
        );
        assert_eq!(registry.selection(), (2, 1));

        let rendered = registry.render_all(&engine, &volume);
        assert_eq!(rendered.len(), 2);
        let ppi_slice = rendered[0].1.as_ref().unwrap();
        assert_eq!(rendered[0].0, ppi);
        assert_eq!(ppi_slice.elevation_index, 2);
        assert_eq!(ppi_slice.product, Product::Reflectivity);

        let rhi_slice = registry.render(rhi, &engine, &volume).unwrap();
        assert_eq!(rhi_slice.azimuth_index, 1);
        assert_eq!(rhi_slice.product, Product::Velocity);
    }
}
