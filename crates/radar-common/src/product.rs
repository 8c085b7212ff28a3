//! Radar product codes and the fixed-size product table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::volume::VolumeArray;

/// A measured radar quantity.
///
/// Products are identified on disk by a single-letter code (`Z`, `V`, ...).
/// The enum is closed: unknown codes are rejected at parse time instead of
/// being carried around as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "Z")]
    Reflectivity,
    #[serde(rename = "V")]
    Velocity,
    #[serde(rename = "W")]
    SpectrumWidth,
    #[serde(rename = "D")]
    DifferentialReflectivity,
    #[serde(rename = "P")]
    Phase,
    #[serde(rename = "R")]
    CorrelationCoefficient,
}

impl Product {
    /// Number of distinct products.
    pub const COUNT: usize = 6;

    /// All products in table order.
    pub const ALL: [Product; Product::COUNT] = [
        Product::Reflectivity,
        Product::Velocity,
        Product::SpectrumWidth,
        Product::DifferentialReflectivity,
        Product::Phase,
        Product::CorrelationCoefficient,
    ];

    /// Slot of this product in a [`ProductTable`].
    pub fn index(self) -> usize {
        match self {
            Product::Reflectivity => 0,
            Product::Velocity => 1,
            Product::SpectrumWidth => 2,
            Product::DifferentialReflectivity => 3,
            Product::Phase => 4,
            Product::CorrelationCoefficient => 5,
        }
    }

    /// Single-letter code used in scan files.
    pub fn code(self) -> char {
        match self {
            Product::Reflectivity => 'Z',
            Product::Velocity => 'V',
            Product::SpectrumWidth => 'W',
            Product::DifferentialReflectivity => 'D',
            Product::Phase => 'P',
            Product::CorrelationCoefficient => 'R',
        }
    }

    /// Look up a product by its file code. Surrounding whitespace is ignored.
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.trim().chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Product::ALL
            .into_iter()
            .find(|p| p.code() == c.to_ascii_uppercase())
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Product::Reflectivity => "Reflectivity",
            Product::Velocity => "Velocity",
            Product::SpectrumWidth => "Spectrum Width",
            Product::DifferentialReflectivity => "Differential Reflectivity",
            Product::Phase => "Differential Phase",
            Product::CorrelationCoefficient => "Correlation Coefficient",
        }
    }

    /// Physical units of the stored values.
    pub fn units(self) -> &'static str {
        match self {
            Product::Reflectivity => "dBZ",
            Product::Velocity | Product::SpectrumWidth => "m/s",
            Product::DifferentialReflectivity => "dB",
            Product::Phase => "deg",
            Product::CorrelationCoefficient => "",
        }
    }

    /// Name with units, as shown on color bars: `Reflectivity (dBZ)`.
    pub fn label(self) -> String {
        match self.units() {
            "" => self.name().to_string(),
            units => format!("{} ({})", self.name(), units),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Product {
    type Err = String;

    /// Accepts either the file code (`Z`) or the product name (`reflectivity`,
    /// `spectrum-width`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(product) = Product::from_code(s) {
            return Ok(product);
        }
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        Product::ALL
            .into_iter()
            .find(|p| p.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown product '{}'", s))
    }
}

/// One optional array per product, indexed by [`Product::index`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductTable {
    slots: [Option<VolumeArray>; Product::COUNT],
}

impl ProductTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, product: Product) -> Option<&VolumeArray> {
        self.slots[product.index()].as_ref()
    }

    /// Store an array, returning whatever was there before.
    pub fn insert(&mut self, product: Product, array: VolumeArray) -> Option<VolumeArray> {
        self.slots[product.index()].replace(array)
    }

    pub fn contains(&self, product: Product) -> bool {
        self.slots[product.index()].is_some()
    }

    /// Present products in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Product, &VolumeArray)> {
        Product::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).map(|array| (p, array)))
    }

    pub fn products(&self) -> Vec<Product> {
        self.iter().map(|(p, _)| p).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
