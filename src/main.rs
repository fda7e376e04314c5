mod console;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wayfarer_core::config::AppConfig;
use wayfarer_core::event::{EventBus, WorkflowEvent};
use wayfarer_core::traits::LlmClient;
use wayfarer_core::types::RunId;

use wayfarer_agent::{build_workflow, run_workflow, Generator, RunLogger, TripDraft, WorkflowDeps};
use wayfarer_tools::{create_place_lookup, create_search, load_aliases, FileReportRenderer};

use console::ConsoleHuman;

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "Travel itinerary planning agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "wayfarer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip. Anything not given on the command line is asked interactively.
    Plan(PlanArgs),
    /// Show current configuration with secrets masked
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct PlanArgs {
    /// Destination city
    #[arg(long)]
    destination: Option<String>,
    /// Trip length in days
    #[arg(short, long)]
    days: Option<u32>,
    /// Comma-separated interests
    #[arg(short, long)]
    interests: Option<String>,
    /// Budget: Low, Medium, Luxury or an amount such as "1200 EUR"
    #[arg(short, long)]
    budget: Option<String>,
    /// Travel companions (Solo, Couple, Family, Friends)
    #[arg(long)]
    companion: Option<String>,
    /// Departure city, used for the flight search
    #[arg(long, conflicts_with = "no_flights")]
    origin: Option<String>,
    /// Outbound date (YYYY-MM-DD)
    #[arg(long)]
    depart: Option<NaiveDate>,
    /// Return date (YYYY-MM-DD)
    #[arg(long = "return")]
    return_date: Option<NaiveDate>,
    /// Skip the flight search
    #[arg(long)]
    no_flights: bool,
    /// Run ID (auto-generated if not provided)
    #[arg(long)]
    run_id: Option<String>,
}

impl PlanArgs {
    fn into_draft(self) -> TripDraft {
        TripDraft {
            destination: self.destination,
            days: self.days,
            interests: self.interests,
            budget: self.budget,
            companion: self.companion,
            // An empty origin means "no flights"; init won't ask again.
            origin: if self.no_flights {
                Some(String::new())
            } else {
                self.origin
            },
            depart_date: self.depart,
            return_date: self.return_date,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wayfarer=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "wayfarer", &mut std::io::stdout());
        return Ok(());
    }

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config.masked())?);
        }
        Commands::Plan(args) => plan(&config, args).await?,
        Commands::Completions { .. } => unreachable!("handled before config load"),
    }

    Ok(())
}

async fn plan(config: &AppConfig, args: PlanArgs) -> anyhow::Result<()> {
    let run_id = RunId::new(
        args.run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    );
    let event_bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    let mut background = Vec::new();
    if let Some(ref log_config) = config.log {
        if log_config.enabled {
            let logger = RunLogger::new(config.log_dir(), log_config.level);
            background.push(logger.spawn(&event_bus, run_id.clone(), cancel.clone()));
            info!("RunLogger started (level {})", log_config.level);
        }
    }
    background.push(spawn_printer(&event_bus, cancel.clone()));

    let client: Arc<dyn LlmClient> = Arc::from(wayfarer_llm::create_retrying_client(config));
    let (prices, flights) = create_search(config);
    let deps = WorkflowDeps {
        generator: Generator::new(client, config.model.clone()),
        places: create_place_lookup(config),
        prices,
        flights,
        renderer: Arc::new(FileReportRenderer::new(config.output_dir())),
        human: Arc::new(ConsoleHuman),
        aliases: Arc::new(load_aliases(config.places.as_ref().map(|p| &p.aliases))?),
        draft: args.into_draft(),
        max_flight_attempts: config.workflow.max_flight_attempts,
        max_steps: config.workflow.max_steps,
    };

    let graph = build_workflow(deps, event_bus.clone())?;
    let outcome = run_workflow(&graph, run_id).await;

    // Printer and logger stop on the terminal run event; cancel covers
    // an executor that bailed before publishing one.
    cancel.cancel();
    for handle in background {
        handle.await.ok();
    }

    match outcome {
        Ok(result) => {
            print!("{}", terminal::render(&result));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Workflow aborted");
            Err(e.into())
        }
    }
}

fn spawn_printer(event_bus: &EventBus, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                result = rx.recv() => match result {
                    Ok(event) => {
                        if let Some(line) = terminal::event_line(&event) {
                            eprintln!("{}", line);
                        }
                        if matches!(
                            event,
                            WorkflowEvent::RunFinished { .. } | WorkflowEvent::RunFailed { .. }
                        ) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = cancel.cancelled() => break,
            }
        }
    })
}
