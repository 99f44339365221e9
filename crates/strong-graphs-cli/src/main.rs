//! Strong graph generator CLI
//!
//! Writes shortest-path instances with known distances in extended DIMACS format.
//!
//! # Example
//!
//! ```bash
//! # 1000 nodes, density 0.05, a third of the arcs non-positive
//! strong-graph generate 1000 -d 0.05 -r 0.33 -s 7
//!
//! # Let the seed pick density, ratio and weight bounds for 5000 arcs
//! strong-graph sample 5000 3 --stdout
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use strong_graphs_core::dimacs::{title, write_instance};
use strong_graphs_core::params::{DEFAULT_DENSITY, DEFAULT_NEGATIVE_RATIO};
use strong_graphs_core::weights::{DEFAULT_LOWER, DEFAULT_UPPER};
use strong_graphs_core::{generate_batch, generate_sampled, Instance, InstanceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strong-graph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate instances on a fixed number of nodes
    Generate(GenerateArgs),
    /// Draw density, ratio and weight bounds from the seed, then generate
    Sample(SampleArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of nodes
    nodes: u32,

    /// Density in [0, 1]; 0 is a bare loop, 1 a complete digraph
    #[arg(short = 'd', long, default_value_t = DEFAULT_DENSITY)]
    density: f64,

    /// Share of arcs with non-positive weight, in [0, 1]
    #[arg(short = 'r', long, default_value_t = DEFAULT_NEGATIVE_RATIO)]
    ratio: f64,

    /// Number of arcs; overrides the density
    #[arg(short = 'm', long)]
    arcs: Option<u32>,

    /// Lower bound of the weight distribution (non-positive)
    #[arg(long = "lb", default_value_t = DEFAULT_LOWER, allow_hyphen_values = true)]
    lower: i64,

    /// Upper bound of the weight distribution (non-negative)
    #[arg(long = "ub", default_value_t = DEFAULT_UPPER)]
    upper: i64,

    /// Random seed; instance `k` of a batch uses `seed + k`
    #[arg(short = 's', long, default_value_t = 0)]
    seed: u64,

    /// Number of instances, generated in parallel
    #[arg(long, default_value_t = 1)]
    count: usize,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Number of arcs
    arcs: u32,

    /// Seed for both the parameters and the instance
    seed: u64,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory receiving one file per instance, named after its title
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Write to standard output instead of files
    #[arg(long)]
    stdout: bool,

    /// Re-check optimality, strong connectivity and absence of negative cycles
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,strong_graphs_core=info,strong_graph=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Generate(args) => run_generate(args),
        Command::Sample(args) => run_sample(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = InstanceConfig {
        node_count: args.nodes,
        density: args.density,
        arc_count: args.arcs,
        negative_ratio: args.ratio,
        lower: args.lower,
        upper: args.upper,
        seed: args.seed,
    };
    if args.arcs.is_some() && args.density != DEFAULT_DENSITY {
        info!(density = args.density, "arc count overrides density");
    }
    config.validate().context("invalid generation parameters")?;
    info!(
        nodes = config.node_count,
        arcs = config.resolve_arc_count()?,
        ratio = config.negative_ratio,
        lower = config.lower,
        upper = config.upper,
        seed = config.seed,
        "generating strong graph"
    );

    let instances = generate_batch(&config, args.count)
        .with_context(|| format!("generation failed for seeds from {}", config.seed))?;
    for (seed, instance) in &instances {
        emit(instance, &config.with_seed(*seed), &args.output)?;
    }
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    let (config, instance) = generate_sampled(args.arcs, args.seed)
        .with_context(|| format!("sampled generation failed for seed {}", args.seed))?;
    info!(
        nodes = config.node_count,
        arcs = args.arcs,
        density = config.density,
        ratio = config.negative_ratio,
        lower = config.lower,
        upper = config.upper,
        "sampled parameters"
    );
    emit(&instance, &config, &args.output)
}

fn emit(instance: &Instance, config: &InstanceConfig, output: &OutputArgs) -> Result<()> {
    if output.verify {
        check(instance).with_context(|| format!("seed {} produced a broken instance", config.seed))?;
    }
    if output.stdout {
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        write_instance(&mut writer, instance, Some(config)).context("writing to stdout")?;
        return Ok(());
    }
    let path = write_file(&output.output_dir, instance, config)?;
    info!(path = %path.display(), arcs = instance.arc_count(), "instance written");
    Ok(())
}

fn write_file(dir: &Path, instance: &Instance, config: &InstanceConfig) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(title(instance));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_instance(&mut writer, instance, Some(config))
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    Ok(path)
}

fn check(instance: &Instance) -> Result<()> {
    instance.verify()?;
    if instance.network.has_negative_cycle() {
        bail!("negative cycle present");
    }
    if !instance.network.reaches_all_from(instance.source)
        || !instance.network.reached_by_all(instance.source)
    {
        bail!("network is not strongly connected");
    }
    Ok(())
}
