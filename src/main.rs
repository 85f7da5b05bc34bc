//! dwchart CLI
//!
//! Command-line interface for chart publishing:
//! - Publish or preview the charts of a job file
//! - Resolve relative-date expressions
//! - Find and delete charts by title
//! - Generate a default config file

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dwchart::chart::Publisher;
use dwchart::client::{ChartService, DatawrapperClient, InMemoryChartService};
use dwchart::config::{generate_default_config, Config, LoggingConfig};
use dwchart::dates::{evaluate_at, DateBound};
use dwchart::jobs::JobFile;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dwchart")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reshape time series and publish them as Datawrapper charts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Date used as "today" (YYYY-MM-DD, default: current UTC date)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish every chart of a job file
    Publish {
        /// Path to the job file
        jobs: PathBuf,
        /// Only publish the chart with this title
        #[arg(short, long)]
        title: Option<String>,
        /// Run against an in-memory service instead of the API
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the CSV payload and metadata of one chart
    Preview {
        /// Path to the job file
        jobs: PathBuf,
        /// Title of the chart to render
        #[arg(short, long)]
        title: String,
    },

    /// Resolve a relative-date expression
    EvalDate {
        /// Expression, e.g. "(deltamonths (today) -6)"
        expression: String,
    },

    /// List charts matching a title
    Search {
        title: String,
    },

    /// Delete every chart matching a title
    Delete {
        title: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dwchart={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging);

    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());

    match cli.command {
        Commands::Publish {
            jobs,
            title,
            dry_run,
        } => {
            let jobs = JobFile::load(&jobs)?;
            if dry_run {
                let service = Arc::new(InMemoryChartService::new());
                let publisher = Publisher::new(service, config.chart.context(today));
                publish_all(publisher, &jobs, title.as_deref(), today).await?;
            } else {
                let client = Arc::new(connect(&config)?);
                let publisher = Publisher::new(client, config.chart.context(today));
                publish_all(publisher, &jobs, title.as_deref(), today).await?;
            }
        }

        Commands::Preview { jobs, title } => {
            let jobs = JobFile::load(&jobs)?;
            let job = jobs
                .find(&title)
                .with_context(|| format!("no chart titled '{}' in job file", title))?;

            let frame = jobs.load_frame(job)?;
            let service = Arc::new(InMemoryChartService::new());
            let publisher = Publisher::new(service, config.chart.context(today));
            let rendered = publisher.preview(job.payload(today)?.as_ref(), &frame)?;

            print!("{}", rendered.to_csv()?);
            println!();
            println!("{}", serde_json::to_string_pretty(&rendered.metadata)?);
        }

        Commands::EvalDate { expression } => match evaluate_at(Some(&expression), today)? {
            DateBound::Date(date) => println!("{}", date),
            DateBound::Unbounded => println!("unbounded"),
        },

        Commands::Search { title } => {
            let client = connect(&config)?;
            let charts = client.search(&title).await?;
            if charts.is_empty() {
                println!("No charts found");
            }
            for chart in charts {
                println!(
                    "{}\t{}\t{}",
                    chart.id,
                    chart.chart_type.as_deref().unwrap_or("-"),
                    chart.title
                );
            }
        }

        Commands::Delete { title } => {
            let client = connect(&config)?;
            let charts = client.search(&title).await?;
            for chart in &charts {
                client.delete(&chart.id).await?;
                println!("Deleted {}", chart.id);
            }
            tracing::info!(title = %title, deleted = charts.len(), "Deleted charts");
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn connect(config: &Config) -> anyhow::Result<DatawrapperClient> {
    if config.service.token.is_empty() {
        bail!("no API token configured (set DWCHART_TOKEN or [service].token)");
    }
    Ok(DatawrapperClient::new(config.service.client_config())?)
}

async fn publish_all<S: ChartService>(
    publisher: Publisher<S>,
    jobs: &JobFile,
    only: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let selected: Vec<_> = jobs
        .charts
        .iter()
        .filter(|job| only.map_or(true, |title| job.title == title))
        .collect();
    if selected.is_empty() {
        bail!("no chart to publish");
    }

    let mut failed = 0;
    for job in &selected {
        let result = async {
            let frame = jobs.load_frame(job)?;
            let payload = job.payload(today)?;
            anyhow::Ok(publisher.publish(payload.as_ref(), &frame).await?)
        }
        .await;

        match result {
            Ok(report) => println!("{}\t{}\t{} rows", report.chart_id, report.title, report.rows),
            Err(e) => {
                tracing::error!(title = %job.title, error = %e, "Failed to publish chart");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} charts failed", failed, selected.len());
    }
    Ok(())
}
