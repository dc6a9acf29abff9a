use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Expansion-scenario record handed to the external site-processing tool.
/// The core serializes it and reports the tool's outcome; it does not
/// interpret the parameters further.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub spatial_params: SpatialParams,
    pub nonspatial_params: NonspatialParams,
    pub external_drivers: ExternalDrivers,
    pub metadata: ScenarioMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialParams {
    pub expansion_acreage: f64,
    pub height_increase_ft: f64,
    pub buffer_installed: bool,
    pub buffer_geometry: BufferGeometry,
    pub buffer_width_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BufferGeometry {
    #[default]
    None,
    Riparian,
    Wetland,
    Reedbed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NonspatialParams {
    pub fill_rate_tpd: u32,
    pub turbine_efficiency_pct: f64,
    pub flare_nox_rate_g_mmbtu: f64,
    pub rng_upgrade: bool,
    pub abatement_cost_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalDrivers {
    pub policy_pressure: PolicyPressure,
    pub legal_constraint: LegalConstraint,
    pub waste_import_change_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyPressure {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<PolicyConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConstraints {
    pub max_voc_ppb: f64,
    pub max_pm25_ug_m3: f64,
    /// Required GHG reduction relative to baseline, as a fraction.
    pub emissions_offset_required: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalConstraint {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<LegalConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalConstraints {
    pub prohibit_expansion_over_aquifer: bool,
    pub max_landfill_height_ft: f64,
    pub mandatory_monitoring_install: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioMetadata {
    pub id: String,
    pub name: String,
    pub date_created: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// Single pass/fail outcome of the external processing run. No retry: a
/// failure is surfaced to the user as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub passed: bool,
    pub detail: String,
}

impl Scenario {
    /// Baseline scenario matching the first configured expansion study.
    pub fn example() -> Self {
        Self {
            spatial_params: SpatialParams {
                expansion_acreage: 47.0,
                height_increase_ft: 70.0,
                buffer_installed: true,
                buffer_geometry: BufferGeometry::Riparian,
                buffer_width_m: 30.0,
            },
            nonspatial_params: NonspatialParams {
                fill_rate_tpd: 7500,
                turbine_efficiency_pct: 34.5,
                flare_nox_rate_g_mmbtu: 0.3,
                rng_upgrade: true,
                abatement_cost_usd: 5_000_000.0,
            },
            external_drivers: ExternalDrivers {
                policy_pressure: PolicyPressure {
                    active: true,
                    constraints: Some(PolicyConstraints {
                        max_voc_ppb: 150.0,
                        max_pm25_ug_m3: 12.0,
                        emissions_offset_required: 0.3,
                    }),
                },
                legal_constraint: LegalConstraint {
                    active: true,
                    constraints: Some(LegalConstraints {
                        prohibit_expansion_over_aquifer: true,
                        max_landfill_height_ft: 800.0,
                        mandatory_monitoring_install: true,
                    }),
                },
                waste_import_change_pct: 25.0,
            },
            metadata: ScenarioMetadata {
                id: "scenario-01".to_string(),
                name: "Baseline with Buffer + RNG".to_string(),
                date_created: NaiveDate::from_ymd_opt(2025, 4, 29).expect("valid date"),
                notes: "RNG upgrade, aggressive odor control, moderate fill rate increase"
                    .to_string(),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading scenario: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed parsing scenario: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
            .with_context(|| format!("failed writing scenario: {}", path.display()))?;
        info!("wrote scenario {} to {}", self.metadata.id, path.display());
        Ok(())
    }
}

/// Hands the saved scenario file to the configured processing command and
/// reports a single pass/fail status.
pub fn run_external(scenario_path: &Path, runner: &[String]) -> Result<RunOutcome> {
    let (program, args) = runner
        .split_first()
        .ok_or_else(|| anyhow!("scenario runner command is empty"))?;
    let status = Command::new(program)
        .args(args)
        .arg(scenario_path)
        .status()
        .with_context(|| format!("failed launching scenario runner: {program}"))?;
    let outcome = if status.success() {
        RunOutcome {
            passed: true,
            detail: "scenario processing completed".to_string(),
        }
    } else {
        warn!("scenario runner exited with {status}");
        RunOutcome {
            passed: false,
            detail: format!("scenario runner exited with {status}"),
        }
    };
    Ok(outcome)
}
