use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};

use crate::error::GeneratorError;
use crate::params::arcs_in_complete_dag;

/// The larger of the two Beta shape parameters.
pub const BETA_CONTROL: f64 = 100.0;

const MEAN_EPSILON: f64 = 1e-6;

/// Number of arcs designated non-positive at each construction stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegativeBudget {
    pub target: usize,
    pub tree: usize,
    pub loop_arcs: usize,
    pub remaining: usize,
}

impl NegativeBudget {
    pub fn realized(&self) -> usize {
        self.tree + self.loop_arcs + self.remaining
    }

    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.realized())
    }
}

/// Shape parameters `(alpha, beta)` of a Beta distribution with the given mean.
pub fn determine_alpha_beta(mean: f64) -> (f64, f64) {
    let mean = mean.clamp(MEAN_EPSILON, 1.0 - MEAN_EPSILON);
    if mean > 0.5 {
        let alpha = BETA_CONTROL;
        (alpha, alpha * (1.0 - mean) / mean)
    } else {
        let beta = BETA_CONTROL;
        (beta * mean / (1.0 - mean), beta)
    }
}

/// Integer in `[min, max]` whose distribution is concentrated around `expected`.
pub fn sample_integer(
    rng: &mut StdRng,
    min: usize,
    max: usize,
    expected: f64,
) -> Result<usize, GeneratorError> {
    if min > max {
        return Err(GeneratorError::infeasible(format!(
            "empty sampling range [{min}, {max}]"
        )));
    }
    if min == max {
        return Ok(min);
    }
    let span = (max - min) as f64;
    let expected = expected.clamp(min as f64, max as f64);
    let mean = (expected - min as f64) / span;
    let (alpha, beta) = determine_alpha_beta(mean);
    let distribution = Beta::new(alpha, beta).map_err(|err| {
        GeneratorError::invariant(format!("beta({alpha}, {beta}) rejected: {err}"))
    })?;
    let mut x: f64 = distribution.sample(rng);
    if !x.is_finite() {
        x = mean;
    }
    let value = (min as f64 + x * span).round() as usize;
    Ok(value.clamp(min, max))
}

/// Arcs to designate non-positive overall; never more than a complete DAG holds.
pub fn total_negative(n: usize, m: usize, ratio: f64) -> usize {
    let wanted = (ratio * m.saturating_sub(1) as f64).round() as usize;
    wanted.min(arcs_in_complete_dag(n))
}

/// Non-positive tree arcs. At least enough that the `m - (n-1)` other arcs
/// can carry the rest while one of them stays positive.
pub fn negative_in_tree(
    rng: &mut StdRng,
    n: usize,
    m: usize,
    total: usize,
) -> Result<usize, GeneratorError> {
    let max = (n - 1).min(total);
    let min = total.saturating_sub(m.saturating_sub(n)).min(max);
    let expected = total as f64 * (n - 1) as f64 / m as f64;
    sample_integer(rng, min, max, expected)
}

/// Lower and upper bound for the non-positive loop arcs.
///
/// `loop_to_add` is the number of loop arcs not already present as tree arcs.
pub fn loop_bounds(n: usize, m: usize, total: usize, tree: usize, loop_to_add: usize) -> (usize, usize) {
    let left = total - tree;
    let max = (n - 1).min(left);
    let arc_room = m.saturating_sub(n - 1).saturating_sub(loop_to_add);
    let backward_room = arcs_in_complete_dag(n)
        .saturating_sub(tree)
        .saturating_sub(loop_to_add);
    let min = left.saturating_sub(arc_room.min(backward_room)).min(max);
    (min, max)
}

pub fn negative_in_loop(
    rng: &mut StdRng,
    n: usize,
    m: usize,
    total: usize,
    tree: usize,
    loop_to_add: usize,
) -> Result<usize, GeneratorError> {
    if tree > total {
        return Err(GeneratorError::invariant(format!(
            "{tree} negative tree arcs exceed the total of {total}"
        )));
    }
    let (min, max) = loop_bounds(n, m, total, tree, loop_to_add);
    let ratio = (total - tree) as f64 / (m - (n - 1)) as f64;
    let expected = (ratio * (n - 1) as f64).max(min as f64);
    sample_integer(rng, min, max, expected)
}
