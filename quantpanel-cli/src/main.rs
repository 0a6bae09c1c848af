//! QuantPanel CLI — pipeline runs, sample data, panel inspection.
//!
//! Commands:
//! - `run` — execute the full pipeline (or reuse cached artifacts)
//! - `sample` — write a deterministic synthetic source CSV
//! - `inspect` — report shape, completeness and coverage of a panel

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use quantpanel_core::MarketConfig;
use quantpanel_runner::{
    load_panel, run_pipeline, save_panel, synthetic_panel, PipelineRun, RunOptions,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quantpanel",
    about = "QuantPanel CLI — multi-asset price panels, cleaned, USD-normalized, documented"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the data pipeline: clean, normalize, smooth, derive returns,
    /// build the data dictionary.
    Run {
        /// Raw source file (.csv or .parquet). Optional when cached
        /// artifacts exist in the output directory.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Directory receiving every artifact.
        #[arg(long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// Market configuration TOML. Defaults to the built-in
        /// Asian-markets universe.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ignore cached artifacts and reprocess from the raw source.
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Write a deterministic synthetic source CSV for demo runs.
    Sample {
        /// Destination CSV.
        #[arg(long, default_value = "data/raw/all_assets.csv")]
        output: PathBuf,

        /// Tickers to generate. Defaults to the configured universe.
        #[arg(long)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-02")]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-12-31")]
        end: String,

        /// Market configuration TOML (source of the default tickers).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report shape, completeness and risk-budget context for a panel.
    Inspect {
        /// Panel file (.csv or .parquet).
        panel: PathBuf,

        /// Market configuration TOML.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            config,
            refresh,
        } => cmd_run(input, output_dir, config, refresh),
        Commands::Sample {
            output,
            tickers,
            start,
            end,
            config,
        } => cmd_sample(output, tickers, &start, &end, config),
        Commands::Inspect { panel, config } => cmd_inspect(&panel, config),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<MarketConfig> {
    match path {
        Some(path) => MarketConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(MarketConfig::default_asian_markets()),
    }
}

fn cmd_run(
    input: Option<PathBuf>,
    output_dir: PathBuf,
    config_path: Option<PathBuf>,
    refresh: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    let run = run_pipeline(
        &config,
        &RunOptions {
            input,
            output_dir,
            use_existing: !refresh,
        },
    )?;

    print_summary(&run);
    Ok(())
}

fn cmd_sample(
    output: PathBuf,
    tickers: Vec<String>,
    start: &str,
    end: &str,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").context("parsing --start")?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").context("parsing --end")?;
    if end < start {
        bail!("--end is before --start");
    }

    let tickers = if tickers.is_empty() {
        let config = load_config(config_path)?;
        config.all_tickers().into_iter().map(String::from).collect()
    } else {
        tickers
    };

    let panel = synthetic_panel(&tickers, start, end)?;
    save_panel(&panel, &output)?;

    println!(
        "Sample panel written: {} ({} dates x {} tickers)",
        output.display(),
        panel.n_rows(),
        panel.n_cols()
    );
    Ok(())
}

fn cmd_inspect(panel_path: &std::path::Path, config_path: Option<PathBuf>) -> Result<()> {
    let panel = load_panel(panel_path)?;
    let config = load_config(config_path)?;

    println!("Panel: {}", panel_path.display());
    println!(
        "Shape:        {} dates x {} tickers",
        panel.n_rows(),
        panel.n_cols()
    );
    if let (Some(first), Some(last)) = (panel.dates().first(), panel.dates().last()) {
        println!("Date range:   {first} to {last}");
    }
    println!(
        "Completeness: {:.2}%  ({} missing cells)",
        panel.completeness() * 100.0,
        panel.missing_cells()
    );
    println!();
    println!("{:<20} {:<12} {:<12} {:>12}", "Ticker", "First", "Last", "Complete");
    println!("{}", "-".repeat(60));
    for c in 0..panel.n_cols() {
        let series = panel.column_at(c);
        let valid = series.iter().filter(|v| !v.is_nan()).count();
        let pct = if series.is_empty() {
            0.0
        } else {
            valid as f64 / series.len() as f64 * 100.0
        };
        println!(
            "{:<20} {:<12} {:<12} {:>11.2}%",
            panel.tickers()[c],
            panel
                .first_valid(c)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".into()),
            panel
                .last_valid(c)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".into()),
            pct
        );
    }

    if !config.risk_budget.is_empty() {
        println!();
        println!("Risk budget:");
        for (bucket, allocation) in &config.risk_budget {
            println!("  {:<14} {:.1}%", bucket, allocation * 100.0);
        }
    }

    Ok(())
}

fn print_summary(run: &PipelineRun) {
    println!();
    println!("=== Pipeline Run ===");
    println!(
        "Panel:          {} dates x {} assets{}",
        run.prices.n_rows(),
        run.prices.n_cols(),
        if run.reused_panel { " (reused)" } else { "" }
    );
    if let (Some(first), Some(last)) = (run.prices.dates().first(), run.prices.dates().last()) {
        println!("Period:         {first} to {last}");
    }
    println!(
        "Completeness:   {:.2}%",
        run.prices.completeness() * 100.0
    );
    println!(
        "Daily returns:  {} rows{}",
        run.daily_returns.n_rows(),
        if run.reused_daily_returns { " (reused)" } else { "" }
    );
    println!(
        "Monthly returns:{} rows{}",
        run.monthly_returns.n_rows(),
        if run.reused_monthly_returns { " (reused)" } else { "" }
    );
    println!("Fingerprint:    {}", &run.dataset_fingerprint[..16]);

    let counts = run.warning_counts();
    if counts.is_empty() {
        println!("Warnings:       none");
    } else {
        let per_stage: Vec<String> = counts
            .iter()
            .map(|(stage, n)| format!("{stage}: {n}"))
            .collect();
        println!(
            "Warnings:       {} ({})",
            run.warnings.len(),
            per_stage.join(", ")
        );
        for warning in &run.warnings {
            println!("  - {warning}");
        }
    }

    println!();
    println!("--- Dictionary ---");
    println!("Assets:         {}", run.dictionary.metadata.asset_count);
    println!(
        "Trading days:   {}",
        run.dictionary.metadata.trading_days
    );
    for (class, count) in &run.dictionary.metadata.class_distribution {
        println!("  {:<22} {}", class, count);
    }

    println!();
    println!("Artifacts:");
    for path in run.artifacts.all() {
        println!("  - {}", path.display());
    }
    println!();
}
