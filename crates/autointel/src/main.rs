mod output;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use autointel::{router, AppState};
use autointel_core::{
    db, Granularity, Orchestrator, RecordKind, RecordStore, ReportStore, RunRequest, Settings,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Automotive news and review analysis pipeline", long_about = None)]
struct Cli {
    /// TOML settings file; AUTOINTEL_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where records are read from and reports are written to
    #[arg(long, global = true, value_enum, default_value_t = Backend::Files)]
    backend: Backend,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// CSV exports in `data_dir`, JSON reports in `report_dir`
    Files,
    /// Crawler tables and the analysis_reports table
    Postgres,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the analysis pipeline and wait for the report
    Run(RunArgs),
    /// Print a stored report
    Show {
        run_id: Uuid,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored reports, newest first
    List,
    /// Run database migrations
    Migrate,
    /// Serve the HTTP trigger and retrieval API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Record kind to analyze (article or review); repeat for both. Defaults to both.
    #[arg(long = "kind")]
    kinds: Vec<RecordKind>,

    /// Temporal bucket size (day, week, month, quarter, year)
    #[arg(long)]
    granularity: Option<Granularity>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Command::Migrate => {
            let pool = connect_pool(&settings).await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
        }
        Command::Run(args) => {
            let orchestrator = build_orchestrator(cli.backend, settings).await?;
            let outcome = orchestrator
                .run(RunRequest {
                    kinds: args.kinds,
                    granularity: args.granularity,
                })
                .await;
            output::print_outcome(&outcome);
            match outcome.label() {
                "aborted" => bail!("run {} aborted", outcome.report.run_id),
                "failed-to-persist" => {
                    bail!("report for run {} was not persisted", outcome.report.run_id)
                }
                _ => {}
            }
        }
        Command::Show { run_id, json } => {
            let reports = build_report_store(cli.backend, &settings).await?;
            let report = reports
                .fetch(run_id)
                .await?
                .with_context(|| format!("no report stored for run {run_id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Run {} ({}) created {}", report.run_id, report.status, report.created_at);
                output::print_report(&report);
            }
        }
        Command::List => {
            let reports = build_report_store(cli.backend, &settings).await?;
            output::print_summaries(&reports.list().await?);
        }
        Command::Serve(args) => {
            let orchestrator = build_orchestrator(cli.backend, settings).await?;
            let app = router(AppState::new(orchestrator));
            let listener = TcpListener::bind(args.bind).await?;
            info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

async fn build_orchestrator(backend: Backend, settings: Settings) -> Result<Orchestrator> {
    let (records, reports) = match backend {
        Backend::Files => (
            RecordStore::csv_dir(&settings.data_dir),
            ReportStore::filesystem(&settings.report_dir),
        ),
        Backend::Postgres => {
            let pool = connect_pool(&settings).await?;
            db::run_migrations(&pool).await?;
            (RecordStore::postgres(pool.clone()), ReportStore::postgres(pool))
        }
    };
    Ok(Orchestrator::new(records, reports, settings))
}

async fn build_report_store(backend: Backend, settings: &Settings) -> Result<ReportStore> {
    Ok(match backend {
        Backend::Files => ReportStore::filesystem(&settings.report_dir),
        Backend::Postgres => ReportStore::postgres(connect_pool(settings).await?),
    })
}

async fn connect_pool(settings: &Settings) -> Result<db::DbPool> {
    let database_url = settings
        .database_url
        .as_deref()
        .context("DATABASE_URL (or AUTOINTEL_DATABASE_URL) must be set")?;
    Ok(db::connect(database_url).await?)
}
