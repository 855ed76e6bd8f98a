use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use uuid::Uuid;

use mm_core::{
    CorrelateConfig, CorrelationReport, Decay, Moment, Source, SourceStreams, TimelineSet,
    correlate_timelines, normalize_stream,
};
use mm_store::Store;

#[derive(Parser)]
#[command(name = "mm", about = "Cross-source video moment correlation")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate the four event streams from a JSON file into ranked moments
    Correlate {
        /// JSON file with visual/speech/comment/engagement record arrays
        streams: PathBuf,

        /// TOML config file (flags below override its values)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Window size in seconds
        #[arg(long)]
        window: Option<f64>,

        /// Slide step in seconds
        #[arg(long)]
        slide: Option<f64>,

        /// Decay function: none, triangular, gaussian
        #[arg(long)]
        decay: Option<String>,

        /// Maximum number of moments to select
        #[arg(long)]
        max_moments: Option<usize>,

        /// Minimum correlation score for a moment
        #[arg(long)]
        min_score: Option<f64>,

        /// Abort the whole run after this many seconds (partial results discarded)
        #[arg(long)]
        timeout_secs: Option<f64>,

        /// Video identifier for storage and reporting
        #[arg(long, default_value = "")]
        video_id: String,

        /// Persist the run to the local store
        #[arg(long)]
        save: bool,
    },

    /// Show the moments of a stored run (latest by default)
    Report {
        /// Filter to the latest run of one video
        #[arg(long)]
        video_id: Option<String>,

        /// Load a specific run by id
        #[arg(long)]
        run: Option<String>,
    },

    /// List stored runs, newest first
    Runs,

    /// Export a stored run's moments as JSON
    Export {
        /// Run id (defaults to the latest run)
        #[arg(long)]
        run: Option<String>,

        /// Output file path
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn open_store() -> Result<Store> {
    let base_dir = std::env::var("MM_DATA_DIR")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(mm_store::default_base_dir);
    let db_path = mm_store::database_path(&base_dir)?;
    Store::open(&db_path).context("failed to open run store")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Correlate {
            streams,
            config,
            window,
            slide,
            decay,
            max_moments,
            min_score,
            timeout_secs,
            video_id,
            save,
        } => {
            let config = build_config(
                config.as_deref(),
                window,
                slide,
                decay.as_deref(),
                max_moments,
                min_score,
            )?;
            cmd_correlate(&streams, config, timeout_secs, &video_id, save).await
        }
        Commands::Report { video_id, run } => cmd_report(video_id.as_deref(), run.as_deref()),
        Commands::Runs => cmd_runs(),
        Commands::Export { run, path } => cmd_export(run.as_deref(), &path),
    }
}

/// Layer CLI flags over an optional TOML config file over the defaults.
fn build_config(
    config_path: Option<&Path>,
    window: Option<f64>,
    slide: Option<f64>,
    decay: Option<&str>,
    max_moments: Option<usize>,
    min_score: Option<f64>,
) -> Result<CorrelateConfig> {
    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => CorrelateConfig::default(),
    };

    if let Some(w) = window {
        config.window_secs = w;
    }
    if let Some(s) = slide {
        config.slide_secs = s;
    }
    if let Some(d) = decay {
        config.decay = Decay::parse(d).ok_or_else(|| anyhow!("unknown decay function '{d}'"))?;
    }
    if let Some(m) = max_moments {
        config.max_moments = m;
    }
    if let Some(s) = min_score {
        config.min_score = s;
    }

    // Fail fast, before any stream is read
    config.validate()?;
    Ok(config)
}

async fn cmd_correlate(
    streams_path: &Path,
    config: CorrelateConfig,
    timeout_secs: Option<f64>,
    video_id: &str,
    save: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(streams_path)
        .with_context(|| format!("failed to read {}", streams_path.display()))?;
    let streams: SourceStreams = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", streams_path.display()))?;

    let timelines = Arc::new(build_timelines_parallel(streams).await?);

    // The engine is bounded and deterministic; the timeout is the only
    // cancellation point, and it discards the whole run.
    let worker = {
        let timelines = Arc::clone(&timelines);
        let config = config.clone();
        tokio::task::spawn_blocking(move || correlate_timelines(&timelines, &config))
    };
    let report: CorrelationReport = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs_f64(secs), worker)
            .await
            .map_err(|_| anyhow!("correlation timed out after {secs}s, results discarded"))?
            .context("correlation task panicked")??,
        None => worker.await.context("correlation task panicked")??,
    };

    tracing::info!(
        "indexed {} events across {} windows, {} skipped",
        report.events_indexed,
        report.windows_scanned,
        report.skipped.total()
    );

    print_moments(&report.moments, Some(&timelines));
    println!(
        "\n{} moment(s), {} event(s) indexed, {} record(s) skipped",
        report.moments.len(),
        report.events_indexed,
        report.skipped.total()
    );

    if save {
        let store = open_store()?;
        let run_id = store.save_run(video_id, &config, &report)?;
        println!("saved run {run_id}");
    }

    Ok(())
}

/// Normalize each source stream on its own blocking task, then join —
/// the join is the barrier before aggregation may start.
async fn build_timelines_parallel(streams: SourceStreams) -> Result<TimelineSet> {
    let SourceStreams {
        visual,
        speech,
        comment,
        engagement,
    } = streams;

    let mut tasks = JoinSet::new();
    for (source, records) in [
        (Source::Visual, visual),
        (Source::Speech, speech),
        (Source::Comment, comment),
        (Source::Engagement, engagement),
    ] {
        tasks.spawn_blocking(move || {
            let (events, skipped) = normalize_stream(source, &records);
            (source, events, skipped)
        });
    }

    let mut timelines = TimelineSet::new();
    while let Some(result) = tasks.join_next().await {
        let (source, events, skipped) = result.context("normalization task panicked")?;
        if skipped > 0 {
            tracing::warn!("skipped {skipped} invalid {source} record(s)");
        }
        timelines.install(source, events, skipped);
    }
    timelines.finalize();
    Ok(timelines)
}

fn cmd_report(video_id: Option<&str>, run: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let stored = match run {
        Some(id) => {
            let run_id = Uuid::parse_str(id).with_context(|| format!("invalid run id '{id}'"))?;
            store.load_run(run_id)?
        }
        None => match store.latest_run(video_id)? {
            Some(stored) => stored,
            None => {
                println!("(no stored runs)");
                return Ok(());
            }
        },
    };

    let video = if stored.summary.video_id.is_empty() {
        "(unnamed)".to_string()
    } else {
        stored.summary.video_id.clone()
    };
    println!(
        "run {} video {} at {} (W={}s S={}s decay={})",
        stored.summary.id,
        video,
        stored.summary.created_at,
        stored.summary.window_secs,
        stored.summary.slide_secs,
        stored.summary.decay.as_str(),
    );
    print_moments(&stored.moments, None);
    Ok(())
}

fn cmd_runs() -> Result<()> {
    let store = open_store()?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("(no stored runs)");
        return Ok(());
    }

    for run in runs {
        let video = if run.video_id.is_empty() {
            "(unnamed)".to_string()
        } else {
            run.video_id
        };
        println!(
            "{}  {}  video={}  moments={}  events={}  skipped={}",
            run.id, run.created_at, video, run.moment_count, run.events_indexed, run.skipped_total
        );
    }
    Ok(())
}

fn cmd_export(run: Option<&str>, path: &Path) -> Result<()> {
    let store = open_store()?;
    let stored = match run {
        Some(id) => {
            let run_id = Uuid::parse_str(id).with_context(|| format!("invalid run id '{id}'"))?;
            store.load_run(run_id)?
        }
        None => store
            .latest_run(None)?
            .ok_or_else(|| anyhow!("no stored runs to export"))?,
    };

    let json = serde_json::to_string_pretty(&stored.moments)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "exported {} moment(s) from run {} to {}",
        stored.moments.len(),
        stored.summary.id,
        path.display()
    );
    Ok(())
}

fn print_moments(moments: &[Moment], timelines: Option<&TimelineSet>) {
    if moments.is_empty() {
        println!("(no moments found)");
        return;
    }

    for (rank, moment) in moments.iter().enumerate() {
        let sources: Vec<&str> = moment.contributing.iter().map(|s| s.as_str()).collect();
        let labels = timelines
            .map(|t| dominant_labels(t, moment))
            .filter(|l| !l.is_empty())
            .map(|l| format!("  [{l}]"))
            .unwrap_or_default();
        println!(
            "#{:<3} {:>7.1}s .. {:>7.1}s  score {:>8.3}  {}{}",
            rank + 1,
            moment.start,
            moment.end,
            moment.score,
            sources.join("+"),
            labels,
        );
    }
}

/// Most frequent upstream labels among a moment's contributing events,
/// at most two, for the human-readable summary line.
fn dominant_labels(timelines: &TimelineSet, moment: &Moment) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for source in &moment.contributing {
        for event in timelines
            .timeline(*source)
            .range_query(moment.start, moment.end)
        {
            if !event.label.is_empty() {
                *counts.entry(event.label.as_str()).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .iter()
        .take(2)
        .map(|(label, _)| *label)
        .collect::<Vec<_>>()
        .join("/")
}
