//! Command line host for the quote and report flows.

pub mod echo;
pub mod output;
pub mod prompts;
pub mod session;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::Notify;
use tracing::info;

use crate::catalog::{resolve_category, StaticCatalog};
use crate::config::{ConfigManager, FlowConfig};
use crate::errors::{FlowError, FlowResult};
use crate::geolocation::{Coordinates, FixedPosition, GeolocationProvider, UnsupportedGeolocation};
use crate::messages;
use crate::report::{ReportFlow, ReportKind, ReportPayload};
use crate::schema::{presets, WizardSchema};
use crate::submission::{CloseHook, SubmitOperation};
use crate::wizard::{category_hint, InitialData, QuotePayload, WizardController};

use self::echo::EchoSubmitter;
use self::output::OutputPreferences;
use self::prompts::TerminalInteraction;
use self::session::{run_quote_session, run_report_session, FormResult};

#[derive(Parser, Debug)]
#[command(name = "quote_flow_cli", version, about = "Teklif talebi ve bildirim akışları")]
pub struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Disable colors and icons.
    #[arg(long, global = true)]
    pub plain: bool,
    /// Simulated round trip of the local echo submitter, in milliseconds.
    #[arg(long, global = true, default_value_t = 400)]
    pub latency_ms: u64,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect wizard schemas.
    Schema {
        #[command(subcommand)]
        action: SchemaCommand,
    },
    /// Run the quote request wizard.
    Quote(QuoteArgs),
    /// File an issue report or a dispute.
    Report(ReportArgs),
    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Print the built-in quote schema as JSON.
    Show,
    /// Validate a schema file.
    Check { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Write the default configuration file.
    Init,
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Schema file to use instead of the built-in one.
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Category id or name.
    #[arg(long)]
    pub category: Option<String>,
    /// Draft record (JSON object) used to prefill answers.
    #[arg(long)]
    pub draft: Option<PathBuf>,
    /// Show fields restricted to privileged users.
    #[arg(long)]
    pub privileged: bool,
    /// Device position reported to location lookups, as `LAT,LON`.
    #[arg(long, value_parser = parse_position)]
    pub position: Option<Coordinates>,
    /// Reject the first submission to try the retry path.
    #[arg(long)]
    pub fail_once: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(long, value_enum)]
    pub kind: ReportKindArg,
    /// Request or job the report is about.
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub fail_once: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ReportKindArg {
    Issue,
    Dispute,
}

impl From<ReportKindArg> for ReportKind {
    fn from(kind: ReportKindArg) -> Self {
        match kind {
            ReportKindArg::Issue => ReportKind::Issue,
            ReportKindArg::Dispute => ReportKind::Dispute,
        }
    }
}

fn parse_position(raw: &str) -> Result<Coordinates, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| "expected LAT,LON".to_string())?;
    let latitude: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude `{lat}`"))?;
    let longitude: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude `{lon}`"))?;
    Ok(Coordinates::new(latitude, longitude))
}

/// Executes a parsed command line.
pub async fn run(cli: Cli) -> FlowResult<()> {
    output::set_preferences(OutputPreferences { plain: cli.plain });
    let manager = match &cli.config {
        Some(path) => ConfigManager::new(path.clone()),
        None => ConfigManager::default_location(),
    };
    let latency = Duration::from_millis(cli.latency_ms);

    match cli.command {
        Command::Schema { action } => run_schema(action),
        Command::Config { action } => run_config(action, &manager),
        Command::Quote(args) => run_quote(args, &manager.load()?, latency).await,
        Command::Report(args) => run_report(args, &manager.load()?, latency).await,
    }
}

fn run_schema(action: SchemaCommand) -> FlowResult<()> {
    match action {
        SchemaCommand::Show => {
            println!("{}", presets::quote_schema()?.to_json_pretty()?);
        }
        SchemaCommand::Check { file } => {
            let schema = load_schema(&file)?;
            output::success(format!(
                "{}: {} adım, {} alan",
                file.display(),
                schema.step_count(),
                schema.fields().count()
            ));
        }
    }
    Ok(())
}

fn run_config(action: ConfigCommand, manager: &ConfigManager) -> FlowResult<()> {
    match action {
        ConfigCommand::Show => {
            let config = manager.load()?;
            output::detail(manager.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init => {
            manager.save(&FlowConfig::default())?;
            output::success(format!("Yapılandırma yazıldı: {}", manager.path().display()));
        }
    }
    Ok(())
}

fn load_schema(path: &Path) -> FlowResult<WizardSchema> {
    WizardSchema::from_json(&fs::read_to_string(path)?)
}

fn load_draft(path: &Path) -> FlowResult<InitialData> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Close hook that wakes the returned notifier once the flow auto-closes.
fn close_signal() -> (CloseHook, Arc<Notify>) {
    let notify = Arc::new(Notify::new());
    let signal = Arc::clone(&notify);
    (Arc::new(move || signal.notify_one()), notify)
}

async fn run_quote(args: QuoteArgs, config: &FlowConfig, latency: Duration) -> FlowResult<()> {
    let schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => presets::quote_schema()?,
    };
    let draft = args.draft.as_deref().map(load_draft).transpose()?;
    let hint = args
        .category
        .as_deref()
        .or_else(|| draft.as_ref().and_then(category_hint));
    let catalog = StaticCatalog::new(presets::default_categories());
    let category = resolve_category(&catalog, hint).ok_or(FlowError::EmptyCatalog)?;

    let echo = EchoSubmitter::<QuotePayload>::new().with_latency(latency);
    let echo = if args.fail_once { echo.failing_once() } else { echo };
    let submitter: Arc<dyn SubmitOperation<QuotePayload>> = Arc::new(echo);
    let (on_close, closed) = close_signal();

    let mut builder = WizardController::builder(schema, category)
        .privileged(args.privileged)
        .config(config)
        .on_close(on_close);
    if let Some(draft) = draft {
        builder = builder.initial_data(draft);
    }
    let mut wizard = builder.build(submitter);
    info!(wizard = %wizard.id(), category = %wizard.category().id, "starting quote session");
    output::section(format!("Teklif Al: {}", wizard.category().name));

    let geolocation: Box<dyn GeolocationProvider> = match args.position {
        Some(coordinates) => Box::new(FixedPosition(coordinates)),
        None => Box::new(UnsupportedGeolocation),
    };
    let mut interaction = TerminalInteraction::new();
    match run_quote_session(&mut wizard, &mut interaction, geolocation.as_ref()).await? {
        FormResult::Submitted => {
            output::success(messages::QUOTE_SUBMITTED);
            closed.notified().await;
        }
        FormResult::Cancelled => output::info("Teklif talebi iptal edildi."),
    }
    Ok(())
}

async fn run_report(
    args: ReportArgs,
    config: &FlowConfig,
    latency: Duration,
) -> FlowResult<()> {
    let echo = EchoSubmitter::<ReportPayload>::new().with_latency(latency);
    let echo = if args.fail_once { echo.failing_once() } else { echo };
    let submitter: Arc<dyn SubmitOperation<ReportPayload>> = Arc::new(echo);
    let (on_close, closed) = close_signal();

    let mut flow = ReportFlow::new(args.kind.into(), args.subject, submitter, config, on_close);
    output::section(flow.kind().title());

    let mut interaction = TerminalInteraction::new();
    match run_report_session(&mut flow, &mut interaction).await? {
        FormResult::Submitted => {
            output::success(messages::REPORT_SUBMITTED);
            closed.notified().await;
        }
        FormResult::Cancelled => output::info("Bildirim iptal edildi."),
    }
    Ok(())
}
