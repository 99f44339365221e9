use rand::{Rng, RngCore};

use crate::error::GeneratorError;

pub const DEFAULT_LOWER: i64 = -100_000;
pub const DEFAULT_UPPER: i64 = 100_000;

/// Arc weight strategy.
///
/// Implementors carry their own default bounds; `lower` and `upper` override
/// them for a single draw. Callers only ever request a range that contains 0
/// or lies entirely on one side of it, so an implementor whose defaults
/// straddle 0 always receives a non-empty range.
pub trait WeightSampler {
    fn lower(&self) -> i64;

    fn upper(&self) -> i64;

    fn sample(&self, rng: &mut dyn RngCore, lower: Option<i64>, upper: Option<i64>) -> i64;

    /// Weight for an arc meant to stay out of the non-positive count: at
    /// least 1 unless the upper bound is 0.
    fn sample_positive(&self, rng: &mut dyn RngCore) -> i64 {
        let floor = if self.upper() > 0 { 1 } else { 0 };
        self.sample(rng, Some(floor), None)
    }

    /// Largest weight magnitude the strategy can produce.
    fn magnitude(&self) -> u64 {
        self.lower().unsigned_abs().max(self.upper().unsigned_abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformWeights {
    lower: i64,
    upper: i64,
}

impl UniformWeights {
    pub fn new(lower: i64, upper: i64) -> Result<Self, GeneratorError> {
        if lower > 0 {
            return Err(GeneratorError::invalid(format!(
                "lower weight bound must be non-positive, got {lower}"
            )));
        }
        if upper < 0 {
            return Err(GeneratorError::invalid(format!(
                "upper weight bound must be non-negative, got {upper}"
            )));
        }
        Ok(Self { lower, upper })
    }
}

impl Default for UniformWeights {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER,
            upper: DEFAULT_UPPER,
        }
    }
}

impl WeightSampler for UniformWeights {
    fn lower(&self) -> i64 {
        self.lower
    }

    fn upper(&self) -> i64 {
        self.upper
    }

    fn sample(&self, rng: &mut dyn RngCore, lower: Option<i64>, upper: Option<i64>) -> i64 {
        let lo = lower.unwrap_or(self.lower);
        let hi = upper.unwrap_or(self.upper);
        if lo >= hi {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }
}
