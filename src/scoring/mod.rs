pub mod cost;
pub mod feasibility;
pub mod normalize;
pub mod weights;

use serde::{Deserialize, Serialize};

/// How the capacity criterion is evaluated. Before any tonnage has been
/// allocated there is nothing to measure, so the static mode pins the
/// capacity sub-score at 1.0 for every site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    Static,
    /// `assigned_tpd / design_capacity_tpd`, clamped to [0, 1]. The
    /// allocation engine caps assignments at design capacity, so the clamp
    /// only matters for hand-built states.
    Dynamic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub cost: f64,
    pub capacity: f64,
    pub risk: f64,
    pub ej: f64,
}

/// Per-site feasibility result. Recomputed whenever weights, threshold, or
/// the capacity assignment change; never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteScore {
    pub site_id: String,
    pub name: String,
    pub breakdown: ScoreBreakdown,
    pub composite: f64,
}
