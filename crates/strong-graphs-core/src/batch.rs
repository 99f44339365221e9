use rayon::prelude::*;
use tracing::info;

use crate::error::GeneratorError;
use crate::generator::Instance;
use crate::params::InstanceConfig;

/// Generates `count` instances with seeds `config.seed, config.seed + 1, ...`
/// in parallel. Results come back in seed order; the first failure aborts the batch.
pub fn generate_batch(
    config: &InstanceConfig,
    count: usize,
) -> Result<Vec<(u64, Instance)>, GeneratorError> {
    config.validate()?;
    let seeds: Vec<u64> = (0..count as u64)
        .map(|offset| config.seed.wrapping_add(offset))
        .collect();
    info!(
        count,
        first_seed = config.seed,
        threads = rayon::current_num_threads(),
        "generating batch"
    );
    seeds
        .par_iter()
        .map(|&seed| config.with_seed(seed).generate().map(|instance| (seed, instance)))
        .collect()
}
