use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One candidate landfill facility. Loaded once at startup and immutable for
/// the session; every numeric bound is checked at load time, not at point of
/// use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub project_name: String,
    pub tipping_fee: f64,
    pub design_capacity_tpd: u32,
    pub service_horizon_years: u32,
    pub hydrological_risk: f64,
    pub ej_rating: f64,
    #[serde(default)]
    pub electric_power_mw: Option<f64>,
    #[serde(default)]
    pub distance_to_rail_mi: Option<f64>,
    #[serde(default)]
    pub distance_to_hwy_mi: Option<f64>,
    #[serde(default)]
    pub distance_to_city_mi: Option<f64>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed reading catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed parsing catalog {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("catalog contains no sites")]
    Empty,
    #[error("duplicate site id: {0}")]
    DuplicateId(String),
    #[error("site {site}: {field} must be positive, got {value}")]
    NonPositive {
        site: String,
        field: &'static str,
        value: f64,
    },
    #[error("site {site}: {field} must be within [0, 1], got {value}")]
    OutOfRange {
        site: String,
        field: &'static str,
        value: f64,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sites: Vec<Site>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl SiteCatalog {
    pub fn new(sites: Vec<Site>) -> Result<Self, CatalogError> {
        validate_sites(&sites)?;
        Ok(Self { sites })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;
        let parsed: CatalogFile = toml::from_str(&data).map_err(|source| CatalogError::Parse {
            path: display,
            source,
        })?;
        Self::new(parsed.sites)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn by_id(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn max_tipping_fee(&self) -> f64 {
        self.sites
            .iter()
            .map(|s| s.tipping_fee)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Shortest service horizon across the whole catalog.
    pub fn min_service_horizon(&self) -> u32 {
        self.sites
            .iter()
            .map(|s| s.service_horizon_years)
            .min()
            .unwrap_or(0)
    }

    /// Shortest service horizon among the named sites; `None` when the slice
    /// names no catalog site.
    pub fn min_service_horizon_of<'a, I>(&self, ids: I) -> Option<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter_map(|id| self.by_id(id))
            .map(|s| s.service_horizon_years)
            .min()
    }

    /// The nine candidate facilities from the Finger Lakes / Southern Tier
    /// expansion study. Used when no catalog file is configured.
    pub fn builtin() -> Self {
        let sites = vec![
            Site {
                id: "seneca-meadows".to_string(),
                name: "Seneca Meadows Landfill".to_string(),
                project_name: "Valley Infill - DEIS".to_string(),
                tipping_fee: 85.0,
                design_capacity_tpd: 1250,
                service_horizon_years: 20,
                hydrological_risk: 0.298,
                ej_rating: 0.4,
                electric_power_mw: Some(20.0),
                distance_to_rail_mi: Some(0.5),
                distance_to_hwy_mi: Some(0.3),
                distance_to_city_mi: Some(250.0),
            },
            Site {
                id: "chaffee".to_string(),
                name: "Chaffee Solid Waste Facility".to_string(),
                project_name: "Chaffee Vertical Expansion".to_string(),
                tipping_fee: 48.75,
                design_capacity_tpd: 1197,
                service_horizon_years: 7,
                hydrological_risk: 0.227,
                ej_rating: 0.2,
                electric_power_mw: Some(0.0),
                distance_to_rail_mi: None,
                distance_to_hwy_mi: Some(1.0),
                distance_to_city_mi: Some(300.0),
            },
            Site {
                id: "danc".to_string(),
                name: "DANC Regional Landfill".to_string(),
                project_name: "DANC Lateral Expansion".to_string(),
                tipping_fee: 65.5,
                design_capacity_tpd: 437,
                service_horizon_years: 40,
                hydrological_risk: 0.102,
                ej_rating: 0.5,
                electric_power_mw: Some(0.0),
                distance_to_rail_mi: None,
                distance_to_hwy_mi: Some(2.0),
                distance_to_city_mi: Some(275.0),
            },
            Site {
                id: "bath-eastern".to_string(),
                name: "Bath Landfill Eastern Expansion".to_string(),
                project_name: "Bath Eastern Expansion".to_string(),
                tipping_fee: 60.0,
                design_capacity_tpd: 850,
                service_horizon_years: 20,
                hydrological_risk: 0.38,
                ej_rating: 0.5,
                electric_power_mw: Some(7.8),
                distance_to_rail_mi: None,
                distance_to_hwy_mi: Some(1.0),
                distance_to_city_mi: None,
            },
            Site {
                id: "hyland".to_string(),
                name: "Hyland Landfill".to_string(),
                project_name: "Hyland Lateral & Vertical Mod".to_string(),
                tipping_fee: 55.0,
                design_capacity_tpd: 1200,
                service_horizon_years: 25,
                hydrological_risk: 0.62,
                ej_rating: 0.3,
                electric_power_mw: Some(15.1),
                distance_to_rail_mi: None,
                distance_to_hwy_mi: Some(0.5),
                distance_to_city_mi: None,
            },
            Site {
                id: "ocrra-site-31".to_string(),
                name: "OCRRA Site 31 Landfill".to_string(),
                project_name: "OCRRA Site 31 Permit Renewal".to_string(),
                tipping_fee: 62.0,
                design_capacity_tpd: 480,
                service_horizon_years: 25,
                hydrological_risk: 0.32,
                ej_rating: 0.5,
                electric_power_mw: Some(8.2),
                distance_to_rail_mi: Some(1.0),
                distance_to_hwy_mi: None,
                distance_to_city_mi: None,
            },
            Site {
                id: "bristol-hill".to_string(),
                name: "Bristol Hill Landfill (Cell 5)".to_string(),
                project_name: "Bristol Hill Cell 5 Liner Contract".to_string(),
                tipping_fee: 68.5,
                design_capacity_tpd: 600,
                service_horizon_years: 15,
                hydrological_risk: 0.434,
                ej_rating: 0.7,
                electric_power_mw: Some(8.9),
                distance_to_rail_mi: Some(2.0),
                distance_to_hwy_mi: Some(2.0),
                distance_to_city_mi: None,
            },
            Site {
                id: "plattekill-h".to_string(),
                name: "Potential Site H (Plattekill)".to_string(),
                project_name: "UCRRA Site H Candidate".to_string(),
                tipping_fee: 85.0,
                design_capacity_tpd: 3000,
                service_horizon_years: 30,
                hydrological_risk: 0.491,
                ej_rating: 0.2,
                electric_power_mw: Some(43.2),
                distance_to_rail_mi: Some(5.0),
                distance_to_hwy_mi: Some(1.0),
                distance_to_city_mi: None,
            },
            Site {
                id: "plattekill-i".to_string(),
                name: "Potential Site I (Plattekill)".to_string(),
                project_name: "UCRRA Site I Candidate".to_string(),
                tipping_fee: 85.0,
                design_capacity_tpd: 2700,
                service_horizon_years: 30,
                hydrological_risk: 0.74,
                ej_rating: 0.5,
                electric_power_mw: Some(33.2),
                distance_to_rail_mi: Some(5.0),
                distance_to_hwy_mi: Some(1.0),
                distance_to_city_mi: None,
            },
        ];
        Self::new(sites).expect("builtin catalog is valid")
    }
}

fn validate_sites(sites: &[Site]) -> Result<(), CatalogError> {
    if sites.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = std::collections::BTreeSet::new();
    for site in sites {
        if !seen.insert(site.id.as_str()) {
            return Err(CatalogError::DuplicateId(site.id.clone()));
        }
        if site.tipping_fee <= 0.0 {
            return Err(CatalogError::NonPositive {
                site: site.id.clone(),
                field: "tipping_fee",
                value: site.tipping_fee,
            });
        }
        if site.design_capacity_tpd == 0 {
            return Err(CatalogError::NonPositive {
                site: site.id.clone(),
                field: "design_capacity_tpd",
                value: 0.0,
            });
        }
        if site.service_horizon_years == 0 {
            return Err(CatalogError::NonPositive {
                site: site.id.clone(),
                field: "service_horizon_years",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("hydrological_risk", site.hydrological_risk),
            ("ej_rating", site.ej_rating),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CatalogError::OutOfRange {
                    site: site.id.clone(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_well_formed() {
        let catalog = SiteCatalog::builtin();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.max_tipping_fee(), 85.0);
        assert_eq!(catalog.min_service_horizon(), 7);
    }

    #[test]
    fn min_horizon_over_selection() {
        let catalog = SiteCatalog::builtin();
        let min = catalog.min_service_horizon_of(["seneca-meadows", "bristol-hill"]);
        assert_eq!(min, Some(15));
        assert_eq!(catalog.min_service_horizon_of(["nope"]), None);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut sites = SiteCatalog::builtin().sites().to_vec();
        sites[1].id = sites[0].id.clone();
        assert!(matches!(
            SiteCatalog::new(sites),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_risk() {
        let mut sites = SiteCatalog::builtin().sites().to_vec();
        sites[0].hydrological_risk = 1.2;
        assert!(matches!(
            SiteCatalog::new(sites),
            Err(CatalogError::OutOfRange { field: "hydrological_risk", .. })
        ));
    }

    #[test]
    fn parses_toml_catalog() {
        let raw = r#"
[[sites]]
id = "alpha"
name = "Alpha Landfill"
project_name = "Alpha Expansion"
tipping_fee = 72.5
design_capacity_tpd = 900
service_horizon_years = 18
hydrological_risk = 0.25
ej_rating = 0.4
distance_to_hwy_mi = 1.5
"#;
        let parsed: CatalogFile = toml::from_str(raw).expect("parse");
        let catalog = SiteCatalog::new(parsed.sites).expect("validate");
        let alpha = catalog.by_id("alpha").expect("alpha present");
        assert_eq!(alpha.distance_to_rail_mi, None);
        assert_eq!(alpha.distance_to_hwy_mi, Some(1.5));
    }
}
