//! IPO priority CLI binary.
//!
//! Runs the sector priority pipeline and reads back the artifacts it wrote.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ipo_priority::model::FeatureImportance;
use ipo_priority::output::{
    ArtifactStore, ExportFormat, Exporter, ScoredIssuerRow, SectorSummaryRow,
};
use ipo_priority::{Pipeline, PipelineConfig};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_INPUT: &str = "data/ipo_core_clean.csv";
const DEFAULT_OUTPUT_DIR: &str = "analysis";

#[derive(Parser)]
#[command(name = "ipo-priority")]
#[command(about = "IPO sector priority scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the scoring artifacts
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, score and replace the artifacts
    Run {
        /// Issuer CSV
        #[arg(long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// TOML file overriding the default configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Year `years_since_ipo` is measured against
        #[arg(long)]
        reference_year: Option<i32>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Upper bound on grouped folds
        #[arg(long)]
        fold_cap: Option<usize>,
    },

    /// Report input and artifact presence
    Status {
        /// Issuer CSV to check for
        #[arg(long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show scored issuers by sector and rank
    Scores {
        /// Only this sector
        #[arg(long)]
        sector: Option<String>,

        /// At most this many issuers per sector
        #[arg(long)]
        top: Option<usize>,

        /// Output format (text, json or csv)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show sector summaries in priority order
    Sectors {
        /// Output format (text, json or csv)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show global feature importance
    Importance {
        /// Output format (text, json or csv)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Csv,
}

impl Format {
    fn parse(value: &str) -> Result<Self, Box<dyn std::error::Error>> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unknown format '{other}', expected text, json or csv").into()),
        }
    }

    /// Row export format, or `None` for the human-readable table.
    const fn export(self) -> Option<ExportFormat> {
        match self {
            Self::Text => None,
            Self::Json => Some(ExportFormat::Json),
            Self::Csv => Some(ExportFormat::Csv),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = ArtifactStore::new(&cli.output_dir);

    match cli.command {
        Commands::Run {
            input,
            config,
            reference_year,
            seed,
            fold_cap,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_toml_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(year) = reference_year {
                pipeline_config.reference_year = year;
            }
            if let Some(seed) = seed {
                pipeline_config.seed = seed;
            }
            if let Some(cap) = fold_cap {
                pipeline_config.fold_cap = cap;
            }
            run_pipeline(pipeline_config, &input, &store)?;
        }
        Commands::Status { input, format } => {
            let json = match Format::parse(&format)? {
                Format::Text => false,
                Format::Json => true,
                Format::Csv => return Err("status supports text or json".into()),
            };
            show_status(&store, &input, json);
        }
        Commands::Scores {
            sector,
            top,
            format,
        } => {
            show_scores(&store, sector.as_deref(), top, Format::parse(&format)?)?;
        }
        Commands::Sectors { format } => {
            show_sectors(&store, Format::parse(&format)?)?;
        }
        Commands::Importance { format } => {
            show_importance(&store, Format::parse(&format)?)?;
        }
    }

    Ok(())
}

fn run_pipeline(
    config: PipelineConfig,
    input: &Path,
    store: &ArtifactStore,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(?config, "pipeline configuration");
    let pipeline = Pipeline::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Scoring {}...", input.display()));

    let outcome = match pipeline.run(input, store.dir()) {
        Ok(outcome) => {
            pb.finish_with_message(format!(
                "Scored {} issuers in {} sectors",
                outcome.manifest.n_issuers, outcome.manifest.n_sectors
            ));
            outcome
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    println!("\nMode:        {}", outcome.output.mode);
    if let Some(reason) = &outcome.manifest.fallback_reason {
        println!("Fallback:    {}", reason);
    }
    match outcome.manifest.validation_metric {
        Some(value) => println!(
            "Validation:  {} = {:.4}",
            outcome.manifest.metric_name, value
        ),
        None => println!("Validation:  none"),
    }
    println!("Scores:      {}", outcome.written.scored.display());
    println!("Sectors:     {}", outcome.written.sectors.display());
    match &outcome.written.importance {
        Some(path) => println!("Importance:  {}", path.display()),
        None => println!("Importance:  unavailable"),
    }
    println!();

    print_sectors_text(&store.sector_summaries()?);
    Ok(())
}

fn show_status(store: &ArtifactStore, input: &Path, json: bool) {
    let status = store.status(Some(input));

    if json {
        let output = json!({
            "status": if status.is_ready() { "ok" } else { "not_ready" },
            "has_data": status.input_present,
            "has_priority": status.scored_present,
            "has_sectors": status.sectors_present,
            "has_importance": status.importance_present,
            "mode": status.mode.map(|m| m.to_string()),
            "completed_at": status.completed_at.map(|t| t.to_rfc3339()),
        });
        println!("{}", output);
        return;
    }

    let flag = |present: bool| if present { "present" } else { "missing" };
    println!("Input:       {}", flag(status.input_present.unwrap_or(false)));
    println!("Scores:      {}", flag(status.scored_present));
    println!("Sectors:     {}", flag(status.sectors_present));
    println!("Importance:  {}", flag(status.importance_present));
    if let Some(mode) = status.mode {
        println!("Mode:        {}", mode);
    }
    if let Some(at) = status.completed_at {
        println!("Completed:   {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !status.is_ready() {
        println!("\nRun `ipo-priority run` to produce the artifacts.");
    }
}

fn show_scores(
    store: &ArtifactStore,
    sector: Option<&str>,
    top: Option<usize>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows: Vec<ScoredIssuerRow> = store
        .scored_issuers()?
        .into_iter()
        .filter(|row| sector.is_none_or(|s| row.sector.eq_ignore_ascii_case(s)))
        .collect();
    rows.sort_by(|a, b| {
        a.sector
            .cmp(&b.sector)
            .then(a.sector_rank.cmp(&b.sector_rank))
            .then_with(|| a.issuer_name.cmp(&b.issuer_name))
    });
    if let Some(top) = top {
        rows = take_per_sector(rows, top);
    }

    if let Some(export) = format.export() {
        println!("{}", rows.export_to_string(export)?.trim_end());
        return Ok(());
    }

    if rows.is_empty() {
        println!("No scored issuers match.");
        return Ok(());
    }

    println!(
        "{:<20} {:<32} {:>6} {:>10} {:>5}",
        "Sector", "Issuer", "Year", "Priority", "Rank"
    );
    println!("{}", "─".repeat(77));
    for row in &rows {
        println!(
            "{:<20} {:<32} {:>6} {:>10.2} {:>5}",
            truncate(&row.sector, 20),
            truncate(&row.issuer_name, 32),
            row.issue_year,
            row.priority_score_0_100,
            row.sector_rank
        );
    }
    Ok(())
}

/// Keep the first `n` rows of each sector; `rows` is sorted by sector.
fn take_per_sector(rows: Vec<ScoredIssuerRow>, n: usize) -> Vec<ScoredIssuerRow> {
    let mut kept = Vec::with_capacity(rows.len());
    let mut current: Option<String> = None;
    let mut taken = 0;
    for row in rows {
        if current.as_deref() != Some(row.sector.as_str()) {
            current = Some(row.sector.clone());
            taken = 0;
        }
        if taken < n {
            kept.push(row);
            taken += 1;
        }
    }
    kept
}

fn show_sectors(store: &ArtifactStore, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let sectors = store.sector_summaries()?;
    match format.export() {
        Some(export) => println!("{}", sectors.export_to_string(export)?.trim_end()),
        None => print_sectors_text(&sectors),
    }
    Ok(())
}

fn print_sectors_text(sectors: &[SectorSummaryRow]) {
    println!(
        "{:<20} {:>9} {:>5} {:>9} {:>9} {:>7} {:>7} {:>7}",
        "Sector", "Priority", "IPOs", "Mean %", "Median %", "Low", "Mod", "High"
    );
    println!("{}", "─".repeat(80));
    for s in sectors {
        println!(
            "{:<20} {:>9.2} {:>5} {:>9.2} {:>9.2} {:>6.1}% {:>6.1}% {:>6.1}%",
            truncate(&s.sector, 20),
            s.sector_priority,
            s.n_ipo,
            s.mean_return,
            s.median_return,
            s.low_pct,
            s.moderate_pct,
            s.high_pct
        );
    }
}

fn show_importance(
    store: &ArtifactStore,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let importance: Option<Vec<FeatureImportance>> = store.feature_importance()?;

    match (format.export(), importance) {
        (Some(ExportFormat::Json), None) => println!("null"),
        (_, None) => println!("Feature importance unavailable."),
        (Some(export), Some(rows)) => println!("{}", rows.export_to_string(export)?.trim_end()),
        (None, Some(rows)) => {
            println!("{:<28} {:>14}", "Feature", "Mean |SHAP|");
            println!("{}", "─".repeat(43));
            for row in &rows {
                println!("{:<28} {:>14.6}", row.feature, row.mean_abs_shap);
            }
        }
    }
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
