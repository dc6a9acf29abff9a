use crate::hazard::{HazardError, HazardReport, LayerFraction, LayerMeasure};

/// Areal (vector) or cell-count (raster) fraction of the site buffer that
/// intersects the hazard layer, bounded to [0, 1].
pub fn layer_fraction(measure: &LayerMeasure) -> Result<f64, HazardError> {
    match measure {
        LayerMeasure::Vector {
            name,
            intersection_area,
            footprint_area,
        } => {
            for value in [*intersection_area, *footprint_area] {
                if value < 0.0 {
                    return Err(HazardError::NegativeMeasure {
                        layer: name.clone(),
                        value,
                    });
                }
            }
            if *footprint_area == 0.0 {
                return Err(HazardError::ZeroAreaOverlap(name.clone()));
            }
            Ok((intersection_area / footprint_area).clamp(0.0, 1.0))
        }
        LayerMeasure::Raster {
            name,
            hazard_cells,
            valid_cells,
        } => {
            if *valid_cells == 0 {
                return Err(HazardError::ZeroAreaOverlap(name.clone()));
            }
            Ok((*hazard_cells as f64 / *valid_cells as f64).clamp(0.0, 1.0))
        }
    }
}

/// Per-layer fractions plus the composite hydrological risk (their
/// unweighted mean).
pub fn hazard_report(measures: &[LayerMeasure]) -> Result<HazardReport, HazardError> {
    if measures.is_empty() {
        return Err(HazardError::NoLayers);
    }
    let mut fractions = Vec::with_capacity(measures.len());
    for measure in measures {
        fractions.push(LayerFraction {
            layer: measure.name().to_string(),
            fraction: layer_fraction(measure)?,
        });
    }
    let composite_risk =
        fractions.iter().map(|f| f.fraction).sum::<f64>() / fractions.len() as f64;
    Ok(HazardReport {
        fractions,
        composite_risk,
    })
}
