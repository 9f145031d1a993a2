use anyhow::{bail, Context, Result};
use clap::Parser;
use groum_ingest::cli::{Cli, Command, OutputFormat};
use groum_ingest::compare::{compare_collections, load_method_names, requires_methods, ComparisonSummary};
use groum_ingest::config::PipelineConfig;
use groum_ingest::dump::{parse_dump, DumpMode, ParserOptions};
use groum_ingest::metadata::PatternMetadata;
use groum_ingest::pipeline::{ClusterOutcome, ClusterPipeline};
use groum_ingest::stats_table::StatsTable;
use groum_ingest::summary::{cluster_id_from_path, load_cluster_summary};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_process(config: Option<&Path>, first: u32, last: u32) -> Result<()> {
    if first > last {
        bail!("--first ({}) must not be greater than --last ({})", first, last);
    }

    let config = match config {
        Some(path) => PipelineConfig::from_toml(path)?,
        None => PipelineConfig::default(),
    };
    let pipeline = ClusterPipeline::new(config);
    let outcomes = pipeline.process_clusters(first..=last);

    for outcome in &outcomes {
        match outcome {
            ClusterOutcome::Completed(report) => println!(
                "cluster {}: {} popular, {} anomalous",
                report.cluster_id,
                report.popular.len(),
                report.anomalous.len()
            ),
            ClusterOutcome::Skipped { cluster_id, reason } => {
                println!("cluster {}: skipped ({})", cluster_id, reason)
            }
            ClusterOutcome::Failed { cluster_id, error } => {
                println!("cluster {}: failed ({})", cluster_id, error)
            }
        }
    }

    let stats_path = pipeline
        .write_stats(&outcomes)
        .with_context(|| format!("Failed to write {}", pipeline.config().stats_path().display()))?;
    println!("statistics: {}", stats_path.display());

    if outcomes.iter().all(ClusterOutcome::is_failed) {
        bail!("all {} clusters failed", outcomes.len());
    }
    Ok(())
}

fn run_parse(dump: &Path, anomalies: bool, cluster: u32, min_frequency: u32) -> Result<()> {
    let text = fs::read_to_string(dump)
        .with_context(|| format!("Failed to read dump: {}", dump.display()))?;
    let mode = if anomalies {
        DumpMode::Anomaly
    } else {
        DumpMode::Pattern
    };
    let options = ParserOptions::for_cluster(cluster).with_min_frequency(min_frequency);

    let parsed = parse_dump(&text, mode, &options)
        .with_context(|| format!("Failed to parse dump: {}", dump.display()))?;

    let mut table = StatsTable::new();
    table.extend(parsed.iter().map(|p| &p.metadata));
    print!("{}", table.render());
    Ok(())
}

fn load_patterns(path: &Path) -> Result<Vec<PatternMetadata>> {
    let cluster_id = cluster_id_from_path(path).unwrap_or(0);
    Ok(load_cluster_summary(path, cluster_id)?
        .into_iter()
        .map(|entry| entry.metadata)
        .collect())
}

fn print_comparison(summary: &ComparisonSummary) {
    let size = |s: Option<usize>| s.map_or_else(|| "-".to_string(), |v| v.to_string());

    println!("left patterns:  {}", summary.left_patterns);
    println!("right patterns: {}", summary.right_patterns);
    println!("pairs:          {}", summary.total_pairs());
    println!("EQUAL:          {}", summary.equal);
    println!("CONTAINS:       {}", summary.contains);
    println!("CONTAINED_IN:   {}", summary.contained_in);
    println!("INCOMPARABLE:   {}", summary.incomparable);
    println!("min size:       {}", size(summary.min_size));
    println!("max size:       {}", size(summary.max_size));

    if !summary.equal_pairs.is_empty() {
        println!("equal pairs:");
        for (left, right) in &summary.equal_pairs {
            println!(
                "  {}:{} == {}:{}",
                left.cluster_id, left.pattern_id, right.cluster_id, right.pattern_id
            );
        }
    }
}

fn run_compare(
    left: &Path,
    right: &Path,
    require_methods: Option<&Path>,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let left = load_patterns(left)?;
    let right = load_patterns(right)?;
    let required = match (require_methods, config) {
        (Some(path), _) => load_method_names(path)?,
        (None, Some(path)) => PipelineConfig::from_toml(path)?.required_methods,
        (None, None) => Vec::new(),
    };

    let summary = compare_collections(&left, &right, requires_methods(required));

    match format {
        OutputFormat::Text => print_comparison(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match args.command {
        Command::Process {
            config,
            first,
            last,
        } => run_process(config.as_deref(), first, last),
        Command::Parse {
            dump,
            anomalies,
            cluster,
            min_frequency,
        } => run_parse(&dump, anomalies, cluster, min_frequency),
        Command::Compare {
            left,
            right,
            require_methods,
            config,
            format,
        } => run_compare(
            &left,
            &right,
            require_methods.as_deref(),
            config.as_deref(),
            format,
        ),
    }
}
