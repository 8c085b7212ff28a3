//! Color scales for radar products.
//!
//! A [`ColorScales`] value is built once (from defaults or a YAML file) and
//! shared read-only between every slice that needs it. Each product gets a
//! [`ColorScale`]: a value domain plus a list of colors spaced evenly across
//! that domain and blended linearly in between.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};
use crate::product::Product;

/// An 8-bit RGBA color, serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#RRGGBB` / `#RRGGBBAA` (leading `#` optional) or a CSS color
    /// name used by the built-in scales.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(named) = named_color(s) {
            return Some(named);
        }

        let hex = s.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = RadarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse(&value).ok_or(RadarError::InvalidColor(value))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

fn named_color(name: &str) -> Option<Rgba> {
    let color = match name.to_lowercase().as_str() {
        "purple" => Rgba::rgb(128, 0, 128),
        "blue" => Rgba::rgb(0, 0, 255),
        "lightblue" => Rgba::rgb(173, 216, 230),
        "green" => Rgba::rgb(0, 128, 0),
        "lightgreen" => Rgba::rgb(144, 238, 144),
        "darkgreen" => Rgba::rgb(0, 100, 0),
        "yellow" => Rgba::rgb(255, 255, 0),
        "orange" => Rgba::rgb(255, 165, 0),
        "red" => Rgba::rgb(255, 0, 0),
        "darkred" => Rgba::rgb(139, 0, 0),
        "pink" => Rgba::rgb(255, 192, 203),
        "white" => Rgba::rgb(255, 255, 255),
        "black" => Rgba::rgb(0, 0, 0),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "cyan" => Rgba::rgb(0, 255, 255),
        "magenta" => Rgba::rgb(255, 0, 255),
        "navy" => Rgba::rgb(0, 0, 128),
        _ => return None,
    };
    Some(color)
}

fn palette(names: &[&str]) -> Vec<Rgba> {
    names.iter().filter_map(|n| named_color(n)).collect()
}

/// Display scale for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    /// Color bar label, e.g. `Reflectivity (dBZ)`.
    pub label: String,
    pub units: String,
    pub min: f64,
    pub max: f64,
    /// Colors spaced evenly from `min` to `max`.
    pub colors: Vec<Rgba>,
}

impl ColorScale {
    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Map a sample to a color. Values outside the domain clamp to the end
    /// colors; NaN is transparent.
    pub fn color_for(&self, value: f64) -> Rgba {
        if value.is_nan() || self.colors.is_empty() {
            return Rgba::TRANSPARENT;
        }
        if self.colors.len() == 1 || self.max <= self.min {
            return self.colors[0];
        }

        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        let segments = (self.colors.len() - 1) as f64;
        let position = t * segments;
        let low = (position.floor() as usize).min(self.colors.len() - 2);
        self.colors[low].lerp(&self.colors[low + 1], position - low as f64)
    }

    fn validate(&self, product: Product) -> RadarResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min >= self.max {
            return Err(RadarError::InvalidColorScale {
                product,
                reason: format!("domain [{}, {}] is empty", self.min, self.max),
            });
        }
        if self.colors.len() < 2 {
            return Err(RadarError::InvalidColorScale {
                product,
                reason: "at least two colors are required".to_string(),
            });
        }
        Ok(())
    }
}

/// The full set of product color scales, indexed by [`Product::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScales {
    scales: Vec<ColorScale>,
}

impl Default for ColorScales {
    fn default() -> Self {
        Self {
            scales: Product::ALL.into_iter().map(default_scale).collect(),
        }
    }
}

fn default_scale(product: Product) -> ColorScale {
    let (min, max, colors) = match product {
        Product::Reflectivity => (
            -10.0,
            70.0,
            palette(&["purple", "blue", "green", "yellow", "orange", "red"]),
        ),
        Product::Velocity => (
            -50.0,
            50.0,
            palette(&[
                "blue",
                "lightblue",
                "lightgreen",
                "darkgreen",
                "white",
                "darkred",
                "red",
                "pink",
                "orange",
            ]),
        ),
        Product::SpectrumWidth => (0.0, 10.0, palette(&["white", "lightblue", "blue", "purple"])),
        Product::DifferentialReflectivity => {
            (-4.0, 8.0, palette(&["blue", "white", "yellow", "red"]))
        }
        Product::Phase => (0.0, 360.0, palette(&["navy", "cyan", "yellow", "magenta"])),
        Product::CorrelationCoefficient => {
            (0.2, 1.05, palette(&["gray", "blue", "green", "yellow", "red"]))
        }
    };
    ColorScale {
        label: product.label(),
        units: product.units().to_string(),
        min,
        max,
        colors,
    }
}

impl ColorScales {
    /// Scale for `product`. Every product always has one.
    pub fn get(&self, product: Product) -> &ColorScale {
        &self.scales[product.index()]
    }

    /// Replace the scale for one product.
    pub fn set(&mut self, product: Product, scale: ColorScale) -> RadarResult<()> {
        scale.validate(product)?;
        self.scales[product.index()] = scale;
        Ok(())
    }

    /// Parse scales from YAML keyed by product code. Products missing from
    /// the document keep their default scale.
    ///
    /// ```yaml
    /// Z:
    ///   label: Reflectivity (dBZ)
    ///   units: dBZ
    ///   min: -30
    ///   max: 75
    ///   colors: ["#800080", blue, green, yellow, orange, red]
    /// ```
    pub fn from_yaml_str(yaml: &str) -> RadarResult<Self> {
        let overrides: BTreeMap<Product, ColorScale> = serde_yaml::from_str(yaml)?;
        let mut scales = Self::default();
        for (product, scale) in overrides {
            scales.set(product, scale)?;
        }
        Ok(scales)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> RadarResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> RadarResult<()> {
        for product in Product::ALL {
            self.get(product).validate(product)?;
        }
        Ok(())
    }
}
