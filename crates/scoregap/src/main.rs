mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use scoregap::analysis::EligibilityRule;
use scoregap::catalog::search_catalog;
use scoregap::checkpoint::CheckpointStore;
use scoregap::config::{dated_file_name, load_config, resolve_credentials, validate_config};
use scoregap::pipeline::{BatchConfig, RateLimiter, TracingProgress};
use scoregap::report::ReportSink;
use scoregap::{
    load_catalog, load_env_file, Analysis, BatchRunner, CatalogColumns, Config,
    LeaderboardAnalysis, LeaderboardReport, MissingScoreAnalysis, MissingScoreReport, OsuClient,
    RunOutcome, WorkItem,
};

use cli::{Cli, Command, DEFAULT_CONFIG_FILE};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_filter()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&cli) {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Interrupted { next_index }) => {
            info!(next_index, "Interrupted, rerun to continue");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the `-v` level. Records from the `log` facade are
/// forwarded into tracing.
fn init_tracing(default_filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Config, scoregap::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Everything that can fail at startup happens before any report or
/// checkpoint is touched. A search catalog writes only its snapshot.
fn run(cli: &Cli) -> scoregap::Result<RunOutcome> {
    let config = load_settings(cli)?;
    match load_env_file(&cli.env_file) {
        Ok(true) => debug!(path = %cli.env_file.display(), "Loaded environment file"),
        Ok(false) => {}
        Err(e) => warn!("{}", e),
    }
    let credentials = resolve_credentials(&config.credentials)?;

    let (checkpoint_file, columns) = match &cli.command {
        Command::MissingScore { .. } => (&config.missing_score.checkpoint_file, CatalogColumns::Full),
        Command::Leaderboard => (&config.leaderboard.checkpoint_file, CatalogColumns::Identity),
    };
    let checkpoint_path = config.output_path(checkpoint_file);

    let mut fetcher = OsuClient::connect(&config.api, credentials)?;
    info!(base_url = %config.api.base_url, "Authenticated with the scoring service");

    let mut batch = BatchConfig::from_config(&config);
    batch.fresh = cli.fresh;

    let items = match &config.search {
        Some(search) => {
            let resuming = !cli.fresh && checkpoint_path.exists();
            let mut limiter = RateLimiter::new(batch.request_interval);
            search_catalog(
                &mut fetcher,
                &search.query,
                search.max_pages,
                &config.output_path(&search.snapshot_file),
                resuming,
                &mut limiter,
            )?
        }
        None => load_catalog(&config.catalog, columns)?,
    };
    info!(items = items.len(), "Catalog ready");

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Could not install Ctrl-C handler");
    }

    let store = CheckpointStore::new(checkpoint_path);
    match &cli.command {
        Command::MissingScore { .. } => {
            let settings = &config.missing_score;
            let analysis = MissingScoreAnalysis::new(
                settings.target_country.clone(),
                EligibilityRule {
                    max_difficulty: settings.max_difficulty,
                    min_note_count: settings.min_note_count,
                },
            );
            let summary_file = dated_file_name(&settings.summary_file, Local::now().date_naive());
            let report = MissingScoreReport::new(
                config.output_path(&settings.report_file),
                config.output_path(&summary_file),
            );
            execute(analysis, report, fetcher, store, batch, stop, &items)
        }
        Command::Leaderboard => {
            let settings = &config.leaderboard;
            let analysis = LeaderboardAnalysis::new(settings.countries.clone());
            let report = LeaderboardReport::new(
                config.output_path(&settings.report_file),
                settings.countries.clone(),
            );
            execute(analysis, report, fetcher, store, batch, stop, &items)
        }
    }
}

fn execute<A, R>(
    analysis: A,
    report: R,
    fetcher: OsuClient,
    store: CheckpointStore,
    batch: BatchConfig,
    stop: Arc<AtomicBool>,
    items: &[WorkItem],
) -> scoregap::Result<RunOutcome>
where
    A: Analysis,
    R: ReportSink<A>,
{
    let progress = TracingProgress::new(items.len());
    let mut runner = BatchRunner::new(analysis, report, fetcher, store, batch).with_stop_flag(stop);
    let summary = runner.run(items, &progress)?;

    info!(
        visited = summary.visited,
        remote_calls = summary.remote_calls,
        fetch_failures = summary.fetch_failures,
        totals = ?summary.totals,
        "{} run done",
        runner.analysis().name()
    );
    Ok(summary.outcome)
}
