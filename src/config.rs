use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::allocation::AllocationPolicy;
use crate::catalog::{CatalogError, SiteCatalog};
use crate::hazard::ej::EjWeights;
use crate::scoring::cost::CostWeights;
use crate::scoring::weights::WeightVector;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub weights: WeightVector,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub ej: EjWeights,
    #[serde(default)]
    pub cost: CostWeights,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Path to a TOML site catalog; empty means the builtin study catalog.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_feasibility_threshold")]
    pub feasibility_threshold: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    AtLeast,
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default = "default_allocation_mode")]
    pub mode: AllocationMode,
    #[serde(default = "default_total_tpd")]
    pub total_tpd: u32,
}

impl AllocationConfig {
    pub fn policy(&self) -> AllocationPolicy {
        match self.mode {
            AllocationMode::AtLeast => AllocationPolicy::AtLeast(self.total_tpd),
            AllocationMode::Exact => AllocationPolicy::ExactlyEquals(self.total_tpd),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_scenario_path")]
    pub output_path: String,
    /// External processing command; the scenario file path is appended.
    #[serde(default)]
    pub runner: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<String>,
    pub feasibility_threshold: Option<f64>,
    pub allocation_mode: Option<AllocationMode>,
    pub total_tpd: Option<u32>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/landfill-sdss/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = path;
        }
        if let Some(threshold) = overrides.feasibility_threshold {
            self.analysis.feasibility_threshold = threshold;
        }
        if let Some(mode) = overrides.allocation_mode {
            self.allocation.mode = mode;
        }
        if let Some(total) = overrides.total_tpd {
            self.allocation.total_tpd = total;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_catalog_path(&self) -> Option<PathBuf> {
        if self.catalog.path.trim().is_empty() {
            None
        } else {
            Some(expand_tilde(&self.catalog.path))
        }
    }

    pub fn load_catalog(&self) -> Result<SiteCatalog, CatalogError> {
        match self.resolved_catalog_path() {
            Some(path) => SiteCatalog::load(&path),
            None => Ok(SiteCatalog::builtin()),
        }
    }

    pub fn default_template() -> String {
        let template = r#"[catalog]
# Path to a TOML site catalog; leave empty for the builtin study catalog.
path = ""

[weights]
cost = 0.3
capacity = 0.3
risk = 0.2
ej = 0.2

[analysis]
feasibility_threshold = 0.2

[allocation]
# "at_least" requires the total to reach total_tpd; "exact" requires an
# exact match. Stakeholder guidance differs between the two; pick per study.
mode = "at_least"
total_tpd = 1250

[ej]
air = 0.4
diesel = 0.25
prox = 0.2
demo = 0.15

[cost]
fee = 0.4
city = 0.3
rail = 0.2
hwy = 0.1

[scenario]
output_path = "scenario.json"
# External processing command; the scenario file path is appended.
runner = []
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            feasibility_threshold: default_feasibility_threshold(),
        }
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            mode: default_allocation_mode(),
            total_tpd: default_total_tpd(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            output_path: default_scenario_path(),
            runner: Vec::new(),
        }
    }
}

fn default_feasibility_threshold() -> f64 {
    0.2
}

fn default_allocation_mode() -> AllocationMode {
    AllocationMode::AtLeast
}

fn default_total_tpd() -> u32 {
    1250
}

fn default_scenario_path() -> String {
    "scenario.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_back_into_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("parse template");
        assert_eq!(parsed.allocation.policy(), AllocationPolicy::AtLeast(1250));
        assert_eq!(parsed.analysis.feasibility_threshold, 0.2);
        assert!(parsed.resolved_catalog_path().is_none());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            catalog_path: Some("sites.toml".to_string()),
            feasibility_threshold: Some(0.35),
            allocation_mode: Some(AllocationMode::Exact),
            total_tpd: Some(1500),
        });
        assert_eq!(
            config.allocation.policy(),
            AllocationPolicy::ExactlyEquals(1500)
        );
        assert_eq!(config.analysis.feasibility_threshold, 0.35);
        assert_eq!(
            config.resolved_catalog_path(),
            Some(PathBuf::from("sites.toml"))
        );
    }
}
