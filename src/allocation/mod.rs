pub mod engine;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::weights::DegenerateWeights;

/// Aggregate constraint on the allocation total. Two policies were in use by
/// stakeholders (minimum-throughput vs. exact-match); both are supported and
/// selected in configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "mode", content = "total_tpd")]
pub enum AllocationPolicy {
    AtLeast(u32),
    ExactlyEquals(u32),
}

impl AllocationPolicy {
    pub fn satisfied_by(&self, total: u32) -> bool {
        match self {
            Self::AtLeast(min) => total >= *min,
            Self::ExactlyEquals(target) => total == *target,
        }
    }

    pub fn total_tpd(&self) -> u32 {
        match self {
            Self::AtLeast(min) => *min,
            Self::ExactlyEquals(target) => *target,
        }
    }
}

impl Display for AllocationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtLeast(min) => write!(f, ">= {min} t/d"),
            Self::ExactlyEquals(target) => write!(f, "== {target} t/d"),
        }
    }
}

/// Owned, versioned assignment map. The engine never mutates a state in
/// place; a successful allocation returns a new state with the version
/// bumped, and the caller owns persistence between interactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AllocationState {
    version: u64,
    assignments: BTreeMap<String, u32>,
}

impl AllocationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: BTreeMap<String, u32>) -> Self {
        Self {
            version: 0,
            assignments,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn assignments(&self) -> &BTreeMap<String, u32> {
        &self.assignments
    }

    pub fn assigned(&self, site_id: &str) -> u32 {
        self.assignments.get(site_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.assignments.values().sum()
    }

    /// Site ids carrying a positive assignment.
    pub fn selected_sites(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|(_, tpd)| **tpd > 0)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub(crate) fn advance(&self, assignments: BTreeMap<String, u32>) -> Self {
        Self {
            version: self.version + 1,
            assignments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteAllocationStatus {
    pub site_id: String,
    pub name: String,
    pub assigned_tpd: u32,
    pub design_capacity_tpd: u32,
    pub feasibility: f64,
    pub eligible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationResult {
    pub total_tpd: u32,
    pub policy: AllocationPolicy,
    pub satisfies_constraint: bool,
    pub per_site: Vec<SiteAllocationStatus>,
    pub state: AllocationState,
}

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("unknown site: {0}")]
    UnknownSite(String),
    #[error("allocation for {site} ({requested} t/d) exceeds design capacity ({capacity} t/d)")]
    CapacityExceeded {
        site: String,
        requested: u32,
        capacity: u32,
    },
    #[error("site {site} is below the feasibility threshold ({score:.3} < {threshold:.3})")]
    IneligibleSite {
        site: String,
        score: f64,
        threshold: f64,
    },
    #[error(transparent)]
    DegenerateWeights(#[from] DegenerateWeights),
}
