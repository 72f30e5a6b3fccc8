use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use salescast_core::config::Settings;
use salescast_core::diagnostics::{DatasetSummary, ForecastSummary};
use salescast_core::forecast::HttpForecastService;
use salescast_core::upload::{HttpCleaningService, UploadFile};
use salescast_core::workflow::{Services, Session, Stage};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "salescast")]
struct Args {
    /// Base URL of the cleaning/forecasting service. Overrides SALESCAST_API_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Retries for a failed upload or forecast, only when the failure is transient.
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a CSV for cleaning and show the first rows.
    Preview {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Upload a CSV, forecast it and export the combined series.
    Forecast {
        #[arg(long)]
        file: PathBuf,

        /// Days shown and exported: 7, 14 or 30.
        #[arg(long, default_value_t = 7, value_parser = parse_horizon)]
        horizon: usize,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Skip writing the CSV export.
        #[arg(long)]
        no_export: bool,

        /// Print the combined series as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(base_url) = args.base_url {
        settings.api_base_url = base_url;
    }

    let result = run(&settings, args.command, args.retries).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "salescast run failed");
    }
    result
}

async fn run(settings: &Settings, command: Command, retries: u32) -> anyhow::Result<()> {
    let mut session = build_session(settings)?;

    match command {
        Command::Preview { file, rows } => {
            upload(&mut session, &file, retries).await?;
            let dataset = current_dataset(&session)?;

            print!("{}", render::preview(&dataset, rows));
            if let Some(summary) = DatasetSummary::from_dataset(&dataset) {
                print!("{}", render::dataset_summary(&summary));
            }
        }
        Command::Forecast {
            file,
            horizon,
            out_dir,
            no_export,
            json,
        } => {
            upload(&mut session, &file, retries).await?;

            session.forecast().await;
            settle(&mut session, retries).await?;

            let result = session
                .state()
                .forecast()
                .context("forecast finished without a result")?
                .with_horizon(horizon);
            let summary = ForecastSummary::from_result(&result);

            if json {
                let body = serde_json::json!({ "forecast": result, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!("{}", render::forecast(&result, &summary));
            }

            if !no_export {
                let path = salescast_core::export::write_csv(&out_dir, horizon, &result)?;
                eprintln!("exported {}", path.display());
            }
        }
    }

    Ok(())
}

fn build_session(settings: &Settings) -> anyhow::Result<Session> {
    let cleaner = HttpCleaningService::from_settings(settings)?;
    let forecaster = HttpForecastService::from_settings(settings)?;
    Ok(Session::new(Services::new(
        Arc::new(cleaner),
        Arc::new(forecaster),
    )))
}

async fn upload(session: &mut Session, path: &std::path::Path, retries: u32) -> anyhow::Result<()> {
    let file = UploadFile::read(path)?;
    session.upload(Some(file)).await;
    settle(session, retries).await?;
    anyhow::ensure!(
        session.state().stage() == Stage::Previewing,
        "upload ended in stage {}",
        session.state().stage()
    );
    Ok(())
}

fn current_dataset(session: &Session) -> anyhow::Result<Arc<salescast_core::domain::Dataset>> {
    session
        .state()
        .dataset()
        .cloned()
        .context("upload finished without a dataset")
}

/// Retries transient failures with exponential backoff, then surfaces whatever error remains.
async fn settle(session: &mut Session, retries: u32) -> anyhow::Result<()> {
    let mut attempt: u32 = 0;
    loop {
        let Some(err) = session.state().last_error().cloned() else {
            return Ok(());
        };
        if attempt >= retries || !err.is_retryable() {
            return Err(anyhow::Error::new(err));
        }

        attempt += 1;
        let backoff = Duration::from_secs(1 << (attempt - 1).min(4));
        tracing::warn!(attempt, ?backoff, error = %err, "request failed; retrying");
        tokio::time::sleep(backoff).await;
        session.retry().await;
    }
}

fn parse_horizon(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(days @ (7 | 14 | 30)) => Ok(days),
        _ => Err(format!("horizon must be 7, 14 or 30 (got {s:?})")),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
