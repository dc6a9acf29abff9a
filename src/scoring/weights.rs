use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sum below which a raw weight vector is considered all-zero.
pub const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("weights sum to {sum}, cannot normalize")]
pub struct DegenerateWeights {
    pub sum: f64,
}

/// Four ranking weights as read from the sliders. Raw values are not
/// required to sum to anything; call [`WeightVector::normalized`] before
/// scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightVector {
    pub cost: f64,
    pub capacity: f64,
    pub risk: f64,
    pub ej: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            cost: 0.3,
            capacity: 0.3,
            risk: 0.2,
            ej: 0.2,
        }
    }
}

impl WeightVector {
    pub fn new(cost: f64, capacity: f64, risk: f64, ej: f64) -> Self {
        Self {
            cost,
            capacity,
            risk,
            ej,
        }
    }

    pub fn sum(&self) -> f64 {
        self.cost + self.capacity + self.risk + self.ej
    }

    /// Divides each weight by the sum so the four outputs add to 1 within
    /// floating tolerance. Negative inputs are floored at zero first.
    pub fn normalized(&self) -> Result<Self, DegenerateWeights> {
        let clamped = Self {
            cost: self.cost.max(0.0),
            capacity: self.capacity.max(0.0),
            risk: self.risk.max(0.0),
            ej: self.ej.max(0.0),
        };
        let sum = clamped.sum();
        if sum <= WEIGHT_EPSILON {
            return Err(DegenerateWeights { sum });
        }
        Ok(Self {
            cost: clamped.cost / sum,
            capacity: clamped.capacity / sum,
            risk: clamped.risk / sum,
            ej: clamped.ej / sum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_sums_to_one() {
        let w = WeightVector::new(0.3, 0.3, 0.2, 0.2).normalized().unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-9);

        let w = WeightVector::new(2.0, 1.0, 1.0, 0.0).normalized().unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-9);
        assert!((w.cost - 0.5).abs() < 1e-9);
    }

    #[test]
    fn normalization_preserves_ratios() {
        let w = WeightVector::new(0.6, 0.3, 0.0, 0.3).normalized().unwrap();
        assert!((w.cost / w.capacity - 2.0).abs() < 1e-9);
        assert!((w.capacity - w.ej).abs() < 1e-9);
    }

    #[test]
    fn all_zero_weights_are_degenerate() {
        let err = WeightVector::new(0.0, 0.0, 0.0, 0.0).normalized().unwrap_err();
        assert_eq!(err.sum, 0.0);
    }

    #[test]
    fn negative_weights_are_floored() {
        let w = WeightVector::new(-1.0, 1.0, 0.0, 0.0).normalized().unwrap();
        assert_eq!(w.cost, 0.0);
        assert_eq!(w.capacity, 1.0);
    }
}
