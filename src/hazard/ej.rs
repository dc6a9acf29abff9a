use serde::{Deserialize, Serialize};

use crate::hazard::HazardError;
use crate::scoring::normalize::minmax;
use crate::scoring::weights::{DegenerateWeights, WEIGHT_EPSILON};

/// Weights for the EJ composite. The published screening defaults put most
/// of the weight on the two pollution rasters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EjWeights {
    pub air: f64,
    pub diesel: f64,
    pub prox: f64,
    pub demo: f64,
}

impl Default for EjWeights {
    fn default() -> Self {
        Self {
            air: 0.4,
            diesel: 0.25,
            prox: 0.2,
            demo: 0.15,
        }
    }
}

impl EjWeights {
    pub fn sum(&self) -> f64 {
        self.air + self.diesel + self.prox + self.demo
    }

    pub fn normalized(&self) -> Result<Self, DegenerateWeights> {
        let sum = self.sum();
        if sum <= WEIGHT_EPSILON {
            return Err(DegenerateWeights { sum });
        }
        Ok(Self {
            air: self.air / sum,
            diesel: self.diesel / sum,
            prox: self.prox / sum,
            demo: self.demo / sum,
        })
    }
}

/// One census/EJ zone clipped against a site buffer: the overlap area and
/// the zone's burden attribute (e.g. mean of %-low-income and %-POC).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZoneOverlap {
    pub area: f64,
    pub value: f64,
}

/// Pre-measured EJ inputs for one site, produced by the external raster and
/// overlay steps in a shared projected CRS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EjSiteMeasure {
    pub site_id: String,
    /// Mean air-toxics raster value within the buffer.
    pub air_toxics_mean: f64,
    /// Mean diesel-PM raster value within the buffer.
    pub diesel_pm_mean: f64,
    /// Miles to the nearest reference tract centroid.
    pub distance_to_reference_mi: f64,
    pub zone_overlaps: Vec<ZoneOverlap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EjScore {
    pub site_id: String,
    pub air: f64,
    pub diesel: f64,
    pub prox: f64,
    pub demo: f64,
    pub index: f64,
}

/// Inverse-distance decay, bounded in (0, 1]; zero distance scores 1.
pub fn proximity_score(distance_mi: f64) -> f64 {
    1.0 / (distance_mi + 1.0)
}

/// Area-weighted mean of the overlapping zones' burden values. Empty
/// overlap (no zones, or all zero-area) has no defined average.
pub fn area_weighted_mean(site_id: &str, overlaps: &[ZoneOverlap]) -> Result<f64, HazardError> {
    let total_area: f64 = overlaps.iter().map(|z| z.area).sum();
    if total_area <= 0.0 {
        return Err(HazardError::ZeroAreaOverlap(site_id.to_string()));
    }
    Ok(overlaps.iter().map(|z| z.area * z.value).sum::<f64>() / total_area)
}

/// Composite EJ index across the site set: raw sub-scores, min-max
/// normalized per column, combined with the weights. Output order follows
/// the input order.
pub fn ej_index(
    measures: &[EjSiteMeasure],
    weights: &EjWeights,
) -> Result<Vec<EjScore>, HazardError> {
    if measures.is_empty() {
        return Err(HazardError::NoLayers);
    }
    let weights = weights.normalized()?;

    let air_raw: Vec<f64> = measures.iter().map(|m| m.air_toxics_mean).collect();
    let diesel_raw: Vec<f64> = measures.iter().map(|m| m.diesel_pm_mean).collect();
    let prox_raw: Vec<f64> = measures
        .iter()
        .map(|m| proximity_score(m.distance_to_reference_mi))
        .collect();
    let mut demo_raw = Vec::with_capacity(measures.len());
    for measure in measures {
        demo_raw.push(area_weighted_mean(&measure.site_id, &measure.zone_overlaps)?);
    }

    let air = minmax(&air_raw);
    let diesel = minmax(&diesel_raw);
    let prox = minmax(&prox_raw);
    let demo = minmax(&demo_raw);

    Ok(measures
        .iter()
        .enumerate()
        .map(|(i, measure)| EjScore {
            site_id: measure.site_id.clone(),
            air: air[i],
            diesel: diesel[i],
            prox: prox[i],
            demo: demo[i],
            index: weights.air * air[i]
                + weights.diesel * diesel[i]
                + weights.prox * prox[i]
                + weights.demo * demo[i],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(site_id: &str, air: f64, diesel: f64, dist: f64, demo: f64) -> EjSiteMeasure {
        EjSiteMeasure {
            site_id: site_id.to_string(),
            air_toxics_mean: air,
            diesel_pm_mean: diesel,
            distance_to_reference_mi: dist,
            zone_overlaps: vec![ZoneOverlap {
                area: 100.0,
                value: demo,
            }],
        }
    }

    #[test]
    fn proximity_decays_with_distance() {
        assert_eq!(proximity_score(0.0), 1.0);
        assert_eq!(proximity_score(1.0), 0.5);
        assert!(proximity_score(10.0) < proximity_score(2.0));
    }

    #[test]
    fn area_weighting_favors_larger_zones() {
        let overlaps = [
            ZoneOverlap { area: 300.0, value: 0.9 },
            ZoneOverlap { area: 100.0, value: 0.1 },
        ];
        let mean = area_weighted_mean("seneca-meadows", &overlaps).unwrap();
        assert!((mean - 0.7).abs() < 1e-12);
    }

    #[test]
    fn zero_overlap_area_is_guarded() {
        let overlaps = [ZoneOverlap { area: 0.0, value: 0.5 }];
        let err = area_weighted_mean("danc", &overlaps).unwrap_err();
        assert_eq!(err, HazardError::ZeroAreaOverlap("danc".to_string()));
        assert!(matches!(
            area_weighted_mean("danc", &[]),
            Err(HazardError::ZeroAreaOverlap(_))
        ));
    }

    #[test]
    fn index_ranks_the_most_burdened_site_highest() {
        let measures = vec![
            measure("a", 40.0, 1.2, 0.5, 0.8),
            measure("b", 10.0, 0.4, 6.0, 0.2),
            measure("c", 25.0, 0.8, 2.0, 0.5),
        ];
        let scores = ej_index(&measures, &EjWeights::default()).unwrap();
        assert_eq!(scores.len(), 3);
        // Site "a" maxes every normalized column.
        assert!((scores[0].index - 1.0).abs() < 1e-9);
        assert!(scores[1].index < scores[2].index);
        for score in &scores {
            assert!(score.index >= 0.0 && score.index <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn ej_weights_normalize_to_one() {
        let weights = EjWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        let scaled = EjWeights {
            air: 4.0,
            diesel: 2.5,
            prox: 2.0,
            demo: 1.5,
        }
        .normalized()
        .unwrap();
        assert!((scaled.sum() - 1.0).abs() < 1e-9);
        assert!((scaled.air - 0.4).abs() < 1e-9);
    }
}
