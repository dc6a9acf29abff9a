pub mod ej;
pub mod fractions;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed physical buffer radius applied to a site footprint before overlay.
pub const BUFFER_RADIUS_M: f64 = 500.0;

pub const FEET_PER_METER: f64 = 3.28084;

/// Buffer radius converted to the working unit of the projected CRS
/// (US survey feet for the NY state planes), ~1640 ft.
pub fn buffer_radius_ft() -> f64 {
    BUFFER_RADIUS_M * FEET_PER_METER
}

/// One hazard layer's overlap with a site buffer, pre-measured by the
/// geospatial toolchain in a single projected CRS. The core only sees the
/// resulting areas and cell counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LayerMeasure {
    Vector {
        name: String,
        intersection_area: f64,
        footprint_area: f64,
    },
    Raster {
        name: String,
        hazard_cells: u64,
        valid_cells: u64,
    },
}

impl LayerMeasure {
    pub fn name(&self) -> &str {
        match self {
            Self::Vector { name, .. } | Self::Raster { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerFraction {
    pub layer: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardReport {
    pub fractions: Vec<LayerFraction>,
    /// Unweighted mean of the layer fractions.
    pub composite_risk: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum HazardError {
    #[error("layer {0}: zero-area footprint, fraction is undefined")]
    ZeroAreaOverlap(String),
    #[error("layer {layer}: negative area measure {value}")]
    NegativeMeasure { layer: String, value: f64 },
    #[error("no hazard layers provided")]
    NoLayers,
    #[error(transparent)]
    DegenerateWeights(#[from] crate::scoring::weights::DegenerateWeights),
}
