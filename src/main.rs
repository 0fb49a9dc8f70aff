use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};

use fm_sampler::config::{Algorithm, GeneratorConfig, DEFAULT_SEED};
use fm_sampler::csv::{read_configurations, write_configurations};
use fm_sampler::dimacs;
use fm_sampler::generator::{ConfigurationGenerator, GenerationState};
use fm_sampler::monitor::ConsoleMonitor;

#[derive(Parser)]
#[command(name = "genconfig", author, version, about = "Sample valid configurations of a feature model")]
struct Cli {
    /// Algorithm: all, random, incling (pairwise), yasa (twise), icpl, chvatal
    #[arg(short, long)]
    algorithm: String,

    /// Feature model in DIMACS CNF format
    #[arg(long = "fm", value_name = "FILE")]
    fm: PathBuf,

    /// Output CSV file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Interaction strength
    #[arg(short, default_value_t = 2)]
    t: usize,

    /// Number of t-wise iterations (construction plus refinements)
    #[arg(short = 'm', long = "iterations", default_value_t = 1)]
    iterations: usize,

    /// Maximum number of configurations
    #[arg(short, long)]
    limit: Option<usize>,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Let random sampling produce the same configuration more than once
    #[arg(long)]
    allow_duplicates: bool,

    /// Reference sample (CSV) whose distribution random sampling follows
    #[arg(long, value_name = "FILE")]
    sample: Option<PathBuf>,

    /// Conflicts per solver episode before giving up on it
    #[arg(long, value_name = "INT")]
    conflict_budget: Option<u64>,

    /// Unresolved solver episodes tolerated before the run fails
    #[arg(long, value_name = "INT")]
    max_unresolved: Option<usize>,

    /// External covering array tool (for icpl and chvatal)
    #[arg(long, value_name = "PROGRAM")]
    tool: Option<String>,

    /// Argument passed to the external tool before its own options (repeatable)
    #[arg(long, value_name = "ARG", allow_hyphen_values = true)]
    tool_arg: Vec<String>,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let algorithm: Algorithm = cli.algorithm.parse()?;

    info!("Loading feature model from {:?}", cli.fm);
    let file = File::open(&cli.fm).wrap_err_with(|| format!("cannot open {}", cli.fm.display()))?;
    let cnf = Arc::new(dimacs::parse(file)?);
    info!("Loaded {} variables and {} clauses", cnf.num_vars(), cnf.clauses().len());

    let mut config = GeneratorConfig::new(algorithm)
        .with_t(cli.t)
        .with_iterations(cli.iterations)
        .with_seed(cli.seed)
        .with_duplicates(cli.allow_duplicates)
        .with_conflict_budget(cli.conflict_budget)
        .with_max_unresolved(cli.max_unresolved);
    if let Some(limit) = cli.limit {
        config = config.with_limit(limit);
    }
    if let Some(tool) = cli.tool {
        config = config.with_external_command(std::iter::once(tool).chain(cli.tool_arg).collect());
    }
    if let Some(path) = &cli.sample {
        let file = File::open(path).wrap_err_with(|| format!("cannot open {}", path.display()))?;
        let sample = read_configurations(&cnf, file)?;
        info!("Loaded reference sample with {} configurations", sample.len());
        config = config.with_reference_sample(sample);
    }

    let generator = config.build(Arc::clone(&cnf))?;
    let start = Instant::now();
    let outcome = generator
        .generate(ConsoleMonitor::new(algorithm.name()))
        .with_max_unresolved(config.max_unresolved)
        .finish();
    info!(
        "Generated {} configurations in {:.2?} ({} unresolved)",
        outcome.configurations.len(),
        start.elapsed(),
        outcome.unresolved
    );

    let output = File::create(&cli.output).wrap_err_with(|| format!("cannot create {}", cli.output.display()))?;
    write_configurations(&cnf, &outcome.configurations, BufWriter::new(output))?;
    info!("Wrote configurations to {:?}", cli.output);

    match outcome.state {
        GenerationState::Failed { unresolved, error } => match error {
            Some(e) => Err(eyre!("generation failed: {}", e)),
            None => Err(eyre!("generation failed: {} unresolved solver episodes", unresolved)),
        },
        GenerationState::Cancelled => {
            warn!("Generation was cancelled, the output is partial");
            Ok(())
        }
        _ => Ok(()),
    }
}
