use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::catalog::{Site, SiteCatalog};
use crate::scoring::normalize::inverse_linear;
use crate::scoring::weights::{DegenerateWeights, WeightVector};
use crate::scoring::{CapacityMode, ScoreBreakdown, SiteScore};

/// `1 - tipping_fee / max_fee`: the catalog's most expensive site scores 0.
pub fn cost_score(site: &Site, max_fee: f64) -> f64 {
    inverse_linear(site.tipping_fee, max_fee)
}

pub fn capacity_score(site: &Site, mode: CapacityMode, assigned_tpd: u32) -> f64 {
    match mode {
        CapacityMode::Static => 1.0,
        CapacityMode::Dynamic => {
            (f64::from(assigned_tpd) / f64::from(site.design_capacity_tpd)).clamp(0.0, 1.0)
        }
    }
}

/// Weighted composite of the four criterion sub-scores. `weights` must
/// already be normalized; with well-formed inputs the composite lands in
/// [0, 1].
pub fn score_site(
    site: &Site,
    weights: &WeightVector,
    max_fee: f64,
    mode: CapacityMode,
    assigned_tpd: u32,
) -> SiteScore {
    let breakdown = ScoreBreakdown {
        cost: cost_score(site, max_fee),
        capacity: capacity_score(site, mode, assigned_tpd),
        risk: 1.0 - site.hydrological_risk,
        ej: 1.0 - site.ej_rating,
    };
    let composite = weights.cost * breakdown.cost
        + weights.capacity * breakdown.capacity
        + weights.risk * breakdown.risk
        + weights.ej * breakdown.ej;
    SiteScore {
        site_id: site.id.clone(),
        name: site.name.clone(),
        breakdown,
        composite,
    }
}

/// Pre-allocation ranking: capacity criterion pinned at 1.0 for every site.
/// Results are sorted best-first, ties broken by site id so repeated runs
/// agree.
pub fn rank_static(
    catalog: &SiteCatalog,
    weights: &WeightVector,
) -> Result<Vec<SiteScore>, DegenerateWeights> {
    let weights = weights.normalized()?;
    let max_fee = catalog.max_tipping_fee();
    let mut scores: Vec<SiteScore> = catalog
        .sites()
        .iter()
        .map(|site| score_site(site, &weights, max_fee, CapacityMode::Static, 0))
        .collect();
    sort_best_first(&mut scores);
    Ok(scores)
}

/// Post-allocation ranking over the assigned sites only; capacity criterion
/// becomes assigned/design.
pub fn rank_dynamic(
    catalog: &SiteCatalog,
    weights: &WeightVector,
    assignments: &BTreeMap<String, u32>,
) -> Result<Vec<SiteScore>, DegenerateWeights> {
    let weights = weights.normalized()?;
    let max_fee = catalog.max_tipping_fee();
    let mut scores: Vec<SiteScore> = catalog
        .sites()
        .iter()
        .filter_map(|site| {
            let assigned = *assignments.get(&site.id)?;
            if assigned == 0 {
                return None;
            }
            Some(score_site(
                site,
                &weights,
                max_fee,
                CapacityMode::Dynamic,
                assigned,
            ))
        })
        .collect();
    sort_best_first(&mut scores);
    Ok(scores)
}

fn sort_best_first(scores: &mut [SiteScore]) {
    scores.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.site_id.cmp(&b.site_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SiteCatalog;

    #[test]
    fn cost_score_is_zero_at_max_fee() {
        let catalog = SiteCatalog::builtin();
        let max_fee = catalog.max_tipping_fee();
        let seneca = catalog.by_id("seneca-meadows").unwrap();
        assert_eq!(cost_score(seneca, max_fee), 0.0);
        // Cheaper site scores strictly higher.
        let chaffee = catalog.by_id("chaffee").unwrap();
        assert!(cost_score(chaffee, max_fee) > 0.0);
    }

    #[test]
    fn cost_score_decreases_with_fee() {
        let catalog = SiteCatalog::builtin();
        let max_fee = catalog.max_tipping_fee();
        let mut fees: Vec<(f64, f64)> = catalog
            .sites()
            .iter()
            .map(|s| (s.tipping_fee, cost_score(s, max_fee)))
            .collect();
        fees.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in fees.windows(2) {
            if pair[0].0 < pair[1].0 {
                assert!(pair[0].1 > pair[1].1);
            }
        }
    }

    #[test]
    fn static_mode_pins_capacity_at_one() {
        let catalog = SiteCatalog::builtin();
        let scores = rank_static(&catalog, &WeightVector::default()).unwrap();
        assert_eq!(scores.len(), catalog.len());
        for score in &scores {
            assert_eq!(score.breakdown.capacity, 1.0);
            assert!(score.composite >= 0.0 && score.composite <= 1.0);
        }
        // Best-first ordering.
        for pair in scores.windows(2) {
            assert!(pair[0].composite >= pair[1].composite);
        }
    }

    #[test]
    fn dynamic_mode_uses_assigned_over_design() {
        let catalog = SiteCatalog::builtin();
        let chaffee = catalog.by_id("chaffee").unwrap();
        let weights = WeightVector::default().normalized().unwrap();
        let score = score_site(
            chaffee,
            &weights,
            catalog.max_tipping_fee(),
            CapacityMode::Dynamic,
            600,
        );
        let expected = 600.0 / 1197.0;
        assert!((score.breakdown.capacity - expected).abs() < 1e-12);
    }

    #[test]
    fn dynamic_capacity_clamps_over_allocation() {
        let catalog = SiteCatalog::builtin();
        let danc = catalog.by_id("danc").unwrap();
        let weights = WeightVector::default().normalized().unwrap();
        let score = score_site(
            danc,
            &weights,
            catalog.max_tipping_fee(),
            CapacityMode::Dynamic,
            9999,
        );
        assert_eq!(score.breakdown.capacity, 1.0);
    }

    #[test]
    fn rank_dynamic_skips_unassigned_sites() {
        let catalog = SiteCatalog::builtin();
        let mut assignments = BTreeMap::new();
        assignments.insert("seneca-meadows".to_string(), 1000u32);
        assignments.insert("danc".to_string(), 0u32);
        let scores = rank_dynamic(&catalog, &WeightVector::default(), &assignments).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].site_id, "seneca-meadows");
    }

    #[test]
    fn scoring_is_idempotent() {
        let catalog = SiteCatalog::builtin();
        let weights = WeightVector::new(0.4, 0.1, 0.25, 0.25);
        let first = rank_static(&catalog, &weights).unwrap();
        let second = rank_static(&catalog, &weights).unwrap();
        assert_eq!(first, second);
    }
}
