use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SiteCatalog;
use crate::scoring::normalize::minmax;
use crate::scoring::weights::{DegenerateWeights, WEIGHT_EPSILON};

/// Transport-cost composite over tipping fee and the three haul distances.
/// Higher index = more costly site. Distances are nullable in the catalog,
/// so every site in the run must carry all three.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostWeights {
    pub fee: f64,
    pub city: f64,
    pub rail: f64,
    pub hwy: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            fee: 0.4,
            city: 0.3,
            rail: 0.2,
            hwy: 0.1,
        }
    }
}

impl CostWeights {
    pub fn sum(&self) -> f64 {
        self.fee + self.city + self.rail + self.hwy
    }

    pub fn normalized(&self) -> Result<Self, DegenerateWeights> {
        let sum = self.sum();
        if sum <= WEIGHT_EPSILON {
            return Err(DegenerateWeights { sum });
        }
        Ok(Self {
            fee: self.fee / sum,
            city: self.city / sum,
            rail: self.rail / sum,
            hwy: self.hwy / sum,
        })
    }
}

#[derive(Debug, Error)]
pub enum CostError {
    #[error("site {site} is missing required attribute {attribute}")]
    MissingAttribute {
        site: String,
        attribute: &'static str,
    },
    #[error(transparent)]
    DegenerateWeights(#[from] DegenerateWeights),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostScore {
    pub site_id: String,
    pub name: String,
    pub index: f64,
}

/// Min-max normalizes each attribute across the catalog, then combines with
/// the weights. Order follows the catalog, not the index.
pub fn cost_index(catalog: &SiteCatalog, weights: &CostWeights) -> Result<Vec<CostScore>, CostError> {
    let weights = weights.normalized()?;
    let mut fees = Vec::with_capacity(catalog.len());
    let mut city = Vec::with_capacity(catalog.len());
    let mut rail = Vec::with_capacity(catalog.len());
    let mut hwy = Vec::with_capacity(catalog.len());
    for site in catalog.sites() {
        fees.push(site.tipping_fee);
        city.push(require(site.distance_to_city_mi, &site.id, "distance_to_city_mi")?);
        rail.push(require(site.distance_to_rail_mi, &site.id, "distance_to_rail_mi")?);
        hwy.push(require(site.distance_to_hwy_mi, &site.id, "distance_to_hwy_mi")?);
    }
    let fees = minmax(&fees);
    let city = minmax(&city);
    let rail = minmax(&rail);
    let hwy = minmax(&hwy);

    Ok(catalog
        .sites()
        .iter()
        .enumerate()
        .map(|(i, site)| CostScore {
            site_id: site.id.clone(),
            name: site.name.clone(),
            index: weights.fee * fees[i]
                + weights.city * city[i]
                + weights.rail * rail[i]
                + weights.hwy * hwy[i],
        })
        .collect())
}

fn require(value: Option<f64>, site: &str, attribute: &'static str) -> Result<f64, CostError> {
    value.ok_or_else(|| CostError::MissingAttribute {
        site: site.to_string(),
        attribute,
    })
}
