use std::collections::BTreeMap;

use crate::allocation::{
    AllocationError, AllocationPolicy, AllocationResult, AllocationState, SiteAllocationStatus,
};
use crate::catalog::SiteCatalog;
use crate::scoring::feasibility::rank_static;
use crate::scoring::weights::WeightVector;
use crate::scoring::SiteScore;

/// Validates tonnage requests against capacity, eligibility, and the
/// aggregate policy. The engine rejects bad requests; it never redistributes
/// tonnage on the caller's behalf.
pub struct AllocationEngine<'a> {
    catalog: &'a SiteCatalog,
    threshold: f64,
    policy: AllocationPolicy,
    static_scores: Vec<SiteScore>,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(
        catalog: &'a SiteCatalog,
        weights: &WeightVector,
        threshold: f64,
        policy: AllocationPolicy,
    ) -> Result<Self, AllocationError> {
        let static_scores = rank_static(catalog, weights)?;
        Ok(Self {
            catalog,
            threshold,
            policy,
            static_scores,
        })
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    pub fn static_scores(&self) -> &[SiteScore] {
        &self.static_scores
    }

    fn feasibility_of(&self, site_id: &str) -> Option<f64> {
        self.static_scores
            .iter()
            .find(|s| s.site_id == site_id)
            .map(|s| s.composite)
    }

    /// Checks a single request without touching state. Zero-tonnage entries
    /// for ineligible sites are legal; positive tonnage is not.
    pub fn validate_request(&self, site_id: &str, requested_tpd: u32) -> Result<(), AllocationError> {
        self.checked(site_id, requested_tpd).map(|_| ())
    }

    fn checked(
        &self,
        site_id: &str,
        requested_tpd: u32,
    ) -> Result<(&crate::catalog::Site, f64), AllocationError> {
        let site = self
            .catalog
            .by_id(site_id)
            .ok_or_else(|| AllocationError::UnknownSite(site_id.to_string()))?;
        if requested_tpd > site.design_capacity_tpd {
            return Err(AllocationError::CapacityExceeded {
                site: site_id.to_string(),
                requested: requested_tpd,
                capacity: site.design_capacity_tpd,
            });
        }
        let score = self
            .feasibility_of(site_id)
            .ok_or_else(|| AllocationError::UnknownSite(site_id.to_string()))?;
        if requested_tpd > 0 && score < self.threshold {
            return Err(AllocationError::IneligibleSite {
                site: site_id.to_string(),
                score,
                threshold: self.threshold,
            });
        }
        Ok((site, score))
    }

    /// Validates every request, then reports whether the aggregate total
    /// satisfies the policy. A failing total is reported, not rejected: the
    /// caller withholds downstream computation and keeps the new state.
    pub fn allocate(
        &self,
        prior: &AllocationState,
        requests: &BTreeMap<String, u32>,
    ) -> Result<AllocationResult, AllocationError> {
        let mut per_site = Vec::with_capacity(requests.len());
        for (site_id, requested) in requests {
            let (site, feasibility) = self.checked(site_id, *requested)?;
            per_site.push(SiteAllocationStatus {
                site_id: site_id.clone(),
                name: site.name.clone(),
                assigned_tpd: *requested,
                design_capacity_tpd: site.design_capacity_tpd,
                feasibility,
                eligible: feasibility >= self.threshold,
            });
        }
        let total_tpd: u32 = requests.values().sum();
        let state = prior.advance(requests.clone());
        Ok(AllocationResult {
            total_tpd,
            policy: self.policy,
            satisfies_constraint: self.policy.satisfied_by(total_tpd),
            per_site,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SiteCatalog;

    fn engine(catalog: &SiteCatalog, policy: AllocationPolicy) -> AllocationEngine<'_> {
        AllocationEngine::new(catalog, &WeightVector::default(), 0.2, policy).unwrap()
    }

    fn requests(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(s, q)| (s.to_string(), *q)).collect()
    }

    #[test]
    fn minimum_total_policy_boundary() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::AtLeast(1250));
        let state = AllocationState::new();

        let ok = engine
            .allocate(&state, &requests(&[("seneca-meadows", 1250)]))
            .unwrap();
        assert!(ok.satisfies_constraint);
        assert_eq!(ok.total_tpd, 1250);

        let short = engine
            .allocate(&state, &requests(&[("seneca-meadows", 1249)]))
            .unwrap();
        assert!(!short.satisfies_constraint);

        let over = engine
            .allocate(&state, &requests(&[("seneca-meadows", 1000), ("chaffee", 400)]))
            .unwrap();
        assert!(over.satisfies_constraint);
    }

    #[test]
    fn exact_total_policy_boundary() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::ExactlyEquals(1250));
        let state = AllocationState::new();

        for (total, expected) in [(1249u32, false), (1250, true), (1251, false)] {
            let result = engine
                .allocate(&state, &requests(&[("plattekill-h", total)]))
                .unwrap();
            assert_eq!(result.satisfies_constraint, expected, "total {total}");
        }
    }

    #[test]
    fn over_capacity_request_is_rejected() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::AtLeast(1250));
        let err = engine
            .allocate(&AllocationState::new(), &requests(&[("danc", 438)]))
            .unwrap_err();
        assert_eq!(
            err,
            AllocationError::CapacityExceeded {
                site: "danc".to_string(),
                requested: 438,
                capacity: 437,
            }
        );
    }

    #[test]
    fn allocation_at_exact_capacity_is_legal() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::AtLeast(1250));
        let result = engine
            .allocate(&AllocationState::new(), &requests(&[("danc", 437)]))
            .unwrap();
        assert_eq!(result.per_site[0].assigned_tpd, 437);
    }

    #[test]
    fn ineligible_site_rejects_positive_tonnage_only() {
        let catalog = SiteCatalog::builtin();
        // Threshold of 0.9 puts every site below the bar with default weights.
        let engine =
            AllocationEngine::new(&catalog, &WeightVector::default(), 0.9, AllocationPolicy::AtLeast(1250))
                .unwrap();
        let err = engine
            .allocate(&AllocationState::new(), &requests(&[("hyland", 100)]))
            .unwrap_err();
        assert!(matches!(err, AllocationError::IneligibleSite { .. }));

        // Zero tonnage against the same site is fine.
        engine
            .allocate(&AllocationState::new(), &requests(&[("hyland", 0)]))
            .unwrap();
    }

    #[test]
    fn unknown_site_is_rejected() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::AtLeast(1250));
        let err = engine
            .allocate(&AllocationState::new(), &requests(&[("fresh-kills", 100)]))
            .unwrap_err();
        assert_eq!(err, AllocationError::UnknownSite("fresh-kills".to_string()));
    }

    #[test]
    fn successful_allocation_bumps_state_version() {
        let catalog = SiteCatalog::builtin();
        let engine = engine(&catalog, AllocationPolicy::AtLeast(1250));
        let first = engine
            .allocate(&AllocationState::new(), &requests(&[("seneca-meadows", 1250)]))
            .unwrap();
        assert_eq!(first.state.version(), 1);
        let second = engine
            .allocate(&first.state, &requests(&[("seneca-meadows", 1000), ("chaffee", 250)]))
            .unwrap();
        assert_eq!(second.state.version(), 2);
        assert_eq!(second.state.total(), 1250);
        // Prior state untouched.
        assert_eq!(first.state.assigned("chaffee"), 0);
    }
}
