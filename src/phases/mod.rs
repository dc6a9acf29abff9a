pub mod planner;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the phase-count selector.
pub const MAX_PHASES: usize = 5;

/// Days per year used for phase throughput accounting.
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Phase {
    /// 1-based position within the horizon.
    pub index: usize,
    pub duration_years: u32,
}

/// An ordered partition of the planning horizon. Constructed only through
/// [`planner::plan`] or [`planner::auto_durations`], so the sum invariant
/// holds for every value of this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhasePlan {
    pub horizon_years: u32,
    pub phases: Vec<Phase>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("phase count must be between 1 and {MAX_PHASES}, got {0}")]
    InvalidPhaseCount(usize),
    #[error("a {horizon} yr horizon cannot fit {n_phases} one-year phases")]
    HorizonTooShort { horizon: u32, n_phases: usize },
    #[error("phase {index} duration must be at least 1 year")]
    ZeroDuration { index: usize },
    #[error("phase {index} duration {duration} yr exceeds its {max} yr bound")]
    PhaseTooLong {
        index: usize,
        duration: u32,
        max: u32,
    },
    #[error("phase durations sum to {sum} yr, must equal the {horizon} yr horizon")]
    PhaseSumMismatch { sum: u32, horizon: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SitePhaseMetrics {
    pub site_id: String,
    pub name: String,
    pub assigned_tpd: u32,
    pub tipping_fee: f64,
    /// Tons moved over the whole phase: assigned * 365 * duration.
    pub capacity_tons: f64,
    pub revenue_usd: f64,
    pub revenue_per_year_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseReport {
    pub index: usize,
    pub duration_years: u32,
    pub sites: Vec<SitePhaseMetrics>,
    pub total_capacity_tons: f64,
    pub total_revenue_usd: f64,
    pub total_revenue_per_year_usd: f64,
}
