//! Miner Binary
//!
//! Mines Horn-clause association rules from a demonstration in-memory KB
//! using the default AMIE-style assistant.
//!
//! Options: --min-support, --min-head-coverage, --min-std-confidence,
//! --min-pca-confidence, --max-depth, --pruning-metric, --threads,
//! --real-time, --skyline, --perfect-rule-pruning, --upper-bound-pruning,
//! --output, --config

use clap::Parser;
use hornminer::{mine, DefaultAssistant, MiningConfig, PruningMetric};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Load all options from a JSON config file; any flag below overrides it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_support: Option<u64>,
    #[arg(long)]
    min_initial_support: Option<u64>,
    #[arg(long)]
    min_head_coverage: Option<f64>,
    #[arg(long)]
    min_std_confidence: Option<f64>,
    #[arg(long)]
    min_pca_confidence: Option<f64>,
    #[arg(long)]
    max_depth: Option<usize>,
    #[arg(long, value_enum)]
    pruning_metric: Option<PruningMetricArg>,
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    real_time: Option<bool>,
    #[arg(long)]
    skyline: Option<bool>,
    #[arg(long)]
    perfect_rule_pruning: Option<bool>,
    #[arg(long)]
    upper_bound_pruning: Option<bool>,

    /// Output path for the rule sink; stdout if omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PruningMetricArg {
    Support,
    HeadCoverage,
}

fn init_logging() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term]).expect("initialize logger");
}

fn build_config(args: &Args) -> anyhow::Result<MiningConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)?;
            serde_json::from_reader(file)?
        }
        None => MiningConfig::default(),
    };

    if let Some(v) = args.min_support {
        config.min_support = v;
    }
    if let Some(v) = args.min_initial_support {
        config.min_initial_support = v;
    }
    if let Some(v) = args.min_head_coverage {
        config.min_head_coverage = v;
    }
    if let Some(v) = args.min_std_confidence {
        config.min_std_confidence = v;
    }
    if let Some(v) = args.min_pca_confidence {
        config.min_pca_confidence = v;
    }
    if let Some(v) = args.max_depth {
        config.max_depth = v;
    }
    if let Some(v) = args.pruning_metric {
        config.pruning_metric = match v {
            PruningMetricArg::Support => PruningMetric::Support,
            PruningMetricArg::HeadCoverage => PruningMetric::HeadCoverage,
        };
    }
    if let Some(v) = args.threads {
        config.n_threads = v;
    } else if args.config.is_none() {
        config.n_threads = num_cpus::get();
    }
    if let Some(v) = args.real_time {
        config.real_time = v;
    }
    if let Some(v) = args.skyline {
        config.skyline = v;
    }
    if let Some(v) = args.perfect_rule_pruning {
        config.perfect_rule_pruning = v;
    }
    if let Some(v) = args.upper_bound_pruning {
        config.upper_bound_pruning = v;
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let config = build_config(&args)?;

    let kb = hornminer::kb::MemoryKb::new(vec![
        hornminer::triple::Triple::new(1, 10, 2), // livesIn(alice, nyc)
        hornminer::triple::Triple::new(1, 20, 2), // bornIn(alice, nyc)
        hornminer::triple::Triple::new(3, 10, 4), // livesIn(bob, sf)
        hornminer::triple::Triple::new(3, 20, 4), // bornIn(bob, sf)
    ]);
    let assistant = DefaultAssistant::new(kb, config.clone());

    let started = std::time::Instant::now();
    let report = match &args.output {
        Some(path) => {
            let sink = hornminer::sink::FileSink::new(File::create(path)?);
            mine(&assistant, &config, None, &sink)?
        }
        None => {
            let sink = hornminer::sink::FileSink::new(std::io::stdout());
            mine(&assistant, &config, None, &sink)?
        }
    };

    log::info!(
        "mined {} rules in {:.2?} ({} total dequeues, peak queue depth {})",
        report.rules_emitted,
        started.elapsed(),
        report.queue_stats.total_dequeued,
        report.queue_stats.peak_depth,
    );

    Ok(())
}
