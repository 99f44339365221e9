use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GeneratorError;
use crate::generator::{generate_with_rng, Instance};
use crate::weights::{UniformWeights, WeightSampler, DEFAULT_LOWER, DEFAULT_UPPER};

pub const DEFAULT_DENSITY: f64 = 0.1;
pub const DEFAULT_NEGATIVE_RATIO: f64 = 0.25;

/// Bound on the weight range drawn in sampled mode.
pub const SAMPLED_WEIGHT_BOUND: i64 = 10_000;

pub fn validate(node_count: u32, arc_count: u32, negative_ratio: f64) -> Result<(), GeneratorError> {
    if node_count < 2 {
        return Err(GeneratorError::invalid(format!(
            "at least two nodes are required, got {node_count}"
        )));
    }
    let n = u64::from(node_count);
    let m = u64::from(arc_count);
    if m < n || m > n * (n - 1) {
        return Err(GeneratorError::invalid(format!(
            "arc count {m} outside [{n}, {}] for {n} nodes",
            n * (n - 1)
        )));
    }
    if !negative_ratio.is_finite() || !(0.0..=1.0).contains(&negative_ratio) {
        return Err(GeneratorError::invalid(format!(
            "negative ratio {negative_ratio} outside [0, 1]"
        )));
    }
    Ok(())
}

/// Distances reach at most `(n-1)` weights; a distance gap plus one more
/// weight must still fit in `i64`.
pub fn validate_weights(node_count: u32, weights: &dyn WeightSampler) -> Result<(), GeneratorError> {
    let magnitude = weights.magnitude();
    let reach = 2 * u128::from(node_count) * u128::from(magnitude);
    if reach > i64::MAX as u128 {
        return Err(GeneratorError::invalid(format!(
            "weights of magnitude {magnitude} on {node_count} nodes overflow 64-bit distances"
        )));
    }
    Ok(())
}

fn validate_density(density: f64) -> Result<(), GeneratorError> {
    if !density.is_finite() || !(0.0..=1.0).contains(&density) {
        return Err(GeneratorError::invalid(format!(
            "density {density} outside [0, 1]"
        )));
    }
    Ok(())
}

/// `n` arcs for the loop plus a `density` share of the other `n(n-2)` pairs.
pub fn arcs_from_density(node_count: u32, density: f64) -> u64 {
    let n = u64::from(node_count);
    let extra = (density * n as f64 * n.saturating_sub(2) as f64).floor() as u64;
    n + extra
}

pub fn arcs_in_complete_dag(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Smallest node count whose density-derived arc count reaches `arc_count`.
pub fn nodes_for_arc_count(arc_count: u32, density: f64) -> Result<u32, GeneratorError> {
    validate_density(density)?;
    if arc_count < 2 {
        return Err(GeneratorError::invalid(format!(
            "at least two arcs are required, got {arc_count}"
        )));
    }
    let target = u64::from(arc_count);
    let (mut lo, mut hi) = (2u32, arc_count);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if arcs_from_density(mid, density) >= target {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

/// Parameters of one instance, as accepted by the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    pub node_count: u32,
    pub density: f64,
    /// Overrides the density-derived arc count.
    pub arc_count: Option<u32>,
    pub negative_ratio: f64,
    pub lower: i64,
    pub upper: i64,
    pub seed: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            node_count: 10,
            density: DEFAULT_DENSITY,
            arc_count: None,
            negative_ratio: DEFAULT_NEGATIVE_RATIO,
            lower: DEFAULT_LOWER,
            upper: DEFAULT_UPPER,
            seed: 0,
        }
    }
}

impl InstanceConfig {
    pub fn new(node_count: u32) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    /// Draws density, ratio and weight bounds for `arc_count` arcs from `rng`,
    /// which the caller then keeps using for the generation itself.
    pub fn sampled(arc_count: u32, seed: u64, rng: &mut StdRng) -> Result<Self, GeneratorError> {
        let density: f64 = rng.gen();
        let node_count = nodes_for_arc_count(arc_count, density)?;
        let negative_ratio: f64 = rng.gen();
        let lower = rng.gen_range(-SAMPLED_WEIGHT_BOUND..=0);
        let upper = rng.gen_range(0..=SAMPLED_WEIGHT_BOUND);
        Ok(Self {
            node_count,
            density,
            arc_count: Some(arc_count),
            negative_ratio,
            lower,
            upper,
            seed,
        })
    }

    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    pub fn resolve_arc_count(&self) -> Result<u32, GeneratorError> {
        if let Some(m) = self.arc_count {
            return Ok(m);
        }
        validate_density(self.density)?;
        let m = arcs_from_density(self.node_count, self.density);
        u32::try_from(m).map_err(|_| {
            GeneratorError::invalid(format!("{m} arcs exceed the supported arc count"))
        })
    }

    pub fn weights(&self) -> Result<UniformWeights, GeneratorError> {
        UniformWeights::new(self.lower, self.upper)
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        let weights = self.weights()?;
        validate(self.node_count, self.resolve_arc_count()?, self.negative_ratio)?;
        validate_weights(self.node_count, &weights)
    }

    pub fn generate(&self) -> Result<Instance, GeneratorError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.generate_with_rng(&mut rng)
    }

    pub fn generate_with_rng(&self, rng: &mut StdRng) -> Result<Instance, GeneratorError> {
        let weights = self.weights()?;
        let arc_count = self.resolve_arc_count()?;
        generate_with_rng(rng, self.node_count, arc_count, self.negative_ratio, &weights)
    }
}

/// Sampled mode: parameters and instance both come from one generator seeded with `seed`.
pub fn generate_sampled(arc_count: u32, seed: u64) -> Result<(InstanceConfig, Instance), GeneratorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = InstanceConfig::sampled(arc_count, seed, &mut rng)?;
    let instance = config.generate_with_rng(&mut rng)?;
    Ok((config, instance))
}
