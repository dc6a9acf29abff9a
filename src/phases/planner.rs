use crate::allocation::{AllocationError, AllocationState};
use crate::catalog::SiteCatalog;
use crate::phases::{
    Phase, PhaseError, PhasePlan, PhaseReport, SitePhaseMetrics, DAYS_PER_YEAR, MAX_PHASES,
};

/// Upper bound for phase `index` (1-based) given what earlier phases have
/// already consumed. Phase 1 is additionally capped by the shortest service
/// horizon among the contributing sites; later phases only need to leave one
/// year for each phase still to come.
pub fn max_duration(
    horizon: u32,
    n_phases: usize,
    index: usize,
    spent_years: u32,
    min_horizon: u32,
) -> u32 {
    let remaining_phases = (n_phases - index) as u32;
    let room = horizon.saturating_sub(spent_years).saturating_sub(remaining_phases);
    if index == 1 {
        room.min(min_horizon)
    } else {
        room
    }
}

/// Validates explicit per-phase durations against the horizon and the
/// recursive bounds, producing a plan whose durations are guaranteed to sum
/// exactly to `horizon`.
pub fn plan(horizon: u32, durations: &[u32], min_horizon: u32) -> Result<PhasePlan, PhaseError> {
    let n_phases = durations.len();
    if n_phases == 0 || n_phases > MAX_PHASES {
        return Err(PhaseError::InvalidPhaseCount(n_phases));
    }
    if horizon < n_phases as u32 {
        return Err(PhaseError::HorizonTooShort { horizon, n_phases });
    }
    let mut spent = 0u32;
    for (i, &duration) in durations.iter().enumerate() {
        let index = i + 1;
        if duration == 0 {
            return Err(PhaseError::ZeroDuration { index });
        }
        let max = max_duration(horizon, n_phases, index, spent, min_horizon);
        if duration > max {
            return Err(PhaseError::PhaseTooLong {
                index,
                duration,
                max,
            });
        }
        spent += duration;
    }
    if spent != horizon {
        return Err(PhaseError::PhaseSumMismatch {
            sum: spent,
            horizon,
        });
    }
    Ok(PhasePlan {
        horizon_years: horizon,
        phases: durations
            .iter()
            .enumerate()
            .map(|(i, &duration_years)| Phase {
                index: i + 1,
                duration_years,
            })
            .collect(),
    })
}

/// Generates durations by giving every phase its maximum legal length, which
/// leaves the final phase with exactly the remainder. The result always sums
/// to `horizon`.
pub fn auto_durations(
    horizon: u32,
    n_phases: usize,
    min_horizon: u32,
) -> Result<Vec<u32>, PhaseError> {
    if n_phases == 0 || n_phases > MAX_PHASES {
        return Err(PhaseError::InvalidPhaseCount(n_phases));
    }
    if horizon < n_phases as u32 || min_horizon == 0 {
        return Err(PhaseError::HorizonTooShort { horizon, n_phases });
    }
    let mut durations = Vec::with_capacity(n_phases);
    let mut spent = 0u32;
    for index in 1..=n_phases {
        let max = max_duration(horizon, n_phases, index, spent, min_horizon);
        let duration = if index == n_phases {
            // Remainder; exceeds `max` only when a single phase must outlast
            // the shortest contributing site, which no plan can satisfy.
            let remainder = horizon - spent;
            if remainder > max {
                return Err(PhaseError::PhaseTooLong {
                    index,
                    duration: remainder,
                    max,
                });
            }
            remainder
        } else {
            max
        };
        durations.push(duration);
        spent += duration;
    }
    Ok(durations)
}

/// Per-phase throughput and revenue for every site carrying an assignment.
pub fn phase_reports(
    catalog: &SiteCatalog,
    state: &AllocationState,
    plan: &PhasePlan,
) -> Result<Vec<PhaseReport>, AllocationError> {
    let mut reports = Vec::with_capacity(plan.phases.len());
    for phase in &plan.phases {
        let years = f64::from(phase.duration_years);
        let mut sites = Vec::new();
        for (site_id, &assigned) in state.assignments() {
            if assigned == 0 {
                continue;
            }
            let site = catalog
                .by_id(site_id)
                .ok_or_else(|| AllocationError::UnknownSite(site_id.clone()))?;
            let capacity_tons = f64::from(assigned) * DAYS_PER_YEAR * years;
            let revenue_usd = capacity_tons * site.tipping_fee;
            sites.push(SitePhaseMetrics {
                site_id: site_id.clone(),
                name: site.name.clone(),
                assigned_tpd: assigned,
                tipping_fee: site.tipping_fee,
                capacity_tons,
                revenue_usd,
                revenue_per_year_usd: revenue_usd / years,
            });
        }
        let total_capacity_tons = sites.iter().map(|s| s.capacity_tons).sum();
        let total_revenue_usd = sites.iter().map(|s| s.revenue_usd).sum();
        let total_revenue_per_year_usd = sites.iter().map(|s| s.revenue_per_year_usd).sum();
        reports.push(PhaseReport {
            index: phase.index,
            duration_years: phase.duration_years,
            sites,
            total_capacity_tons,
            total_revenue_usd,
            total_revenue_per_year_usd,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn explicit_durations_must_sum_to_horizon() {
        let plan = plan(20, &[5, 15], 20).unwrap();
        assert_eq!(plan.horizon_years, 20);
        assert_eq!(plan.phases.len(), 2);
        assert_eq!(plan.phases[1].duration_years, 15);

        let err = super::plan(20, &[5, 14], 20).unwrap_err();
        assert_eq!(err, PhaseError::PhaseSumMismatch { sum: 19, horizon: 20 });
    }

    #[test]
    fn phase_one_is_capped_by_min_horizon() {
        // Shortest contributing site lives 7 years; a 10-year phase 1 is out.
        let err = plan(20, &[10, 10], 7).unwrap_err();
        assert_eq!(
            err,
            PhaseError::PhaseTooLong {
                index: 1,
                duration: 10,
                max: 7,
            }
        );
    }

    #[test]
    fn later_phases_must_leave_room() {
        // Phase 2 of 3 cannot swallow the year phase 3 still needs.
        let err = plan(10, &[2, 8, 1], 20).unwrap_err();
        assert!(matches!(err, PhaseError::PhaseTooLong { index: 2, .. }));
    }

    #[test]
    fn phase_count_bounds() {
        assert_eq!(plan(10, &[], 20).unwrap_err(), PhaseError::InvalidPhaseCount(0));
        assert_eq!(
            plan(10, &[2, 2, 2, 2, 1, 1], 20).unwrap_err(),
            PhaseError::InvalidPhaseCount(6)
        );
        assert_eq!(
            plan(2, &[1, 1, 1], 20).unwrap_err(),
            PhaseError::HorizonTooShort { horizon: 2, n_phases: 3 }
        );
    }

    #[test]
    fn auto_durations_always_sum_to_horizon() {
        for horizon in 1..=40u32 {
            for n_phases in 1..=MAX_PHASES {
                if horizon < n_phases as u32 {
                    continue;
                }
                for min_horizon in [1u32, 7, 20, 40] {
                    // A lone phase spanning more than the shortest site's
                    // horizon has no legal plan.
                    if n_phases == 1 && horizon > min_horizon {
                        assert!(auto_durations(horizon, n_phases, min_horizon).is_err());
                        continue;
                    }
                    let durations = auto_durations(horizon, n_phases, min_horizon).unwrap();
                    assert_eq!(durations.iter().sum::<u32>(), horizon);
                    assert!(durations.iter().all(|&d| d >= 1));
                    // Generated sequences must also pass validation.
                    plan(horizon, &durations, min_horizon).unwrap();
                }
            }
        }
    }

    #[test]
    fn phase_revenue_arithmetic() {
        let catalog = crate::catalog::SiteCatalog::builtin();
        let mut assignments = BTreeMap::new();
        assignments.insert("seneca-meadows".to_string(), 1000u32);
        let state = AllocationState::with_assignments(assignments);
        let plan = plan(20, &[5, 15], 20).unwrap();
        let reports = phase_reports(&catalog, &state, &plan).unwrap();

        // assigned=1000, fee=85, d=5 -> 1,825,000 t and $155,125,000.
        let phase1 = &reports[0];
        assert_eq!(phase1.sites.len(), 1);
        let m = &phase1.sites[0];
        assert_eq!(m.capacity_tons, 1_825_000.0);
        assert_eq!(m.revenue_usd, 155_125_000.0);
        assert_eq!(m.revenue_per_year_usd, 31_025_000.0);
        assert_eq!(phase1.total_revenue_usd, 155_125_000.0);
    }

    #[test]
    fn zero_assignments_are_excluded_from_reports() {
        let catalog = crate::catalog::SiteCatalog::builtin();
        let mut assignments = BTreeMap::new();
        assignments.insert("seneca-meadows".to_string(), 500u32);
        assignments.insert("chaffee".to_string(), 0u32);
        let state = AllocationState::with_assignments(assignments);
        let plan = plan(7, &[7], 7).unwrap();
        let reports = phase_reports(&catalog, &state, &plan).unwrap();
        assert_eq!(reports[0].sites.len(), 1);
    }
}
