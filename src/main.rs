//! Omnilytics - usage analytics from the command line
//!
//! Sends search, click and custom events to a usage analytics service and
//! previews the popular-query suggestions an omnibox would show.

use anyhow::Context;
use clap::{Parser, Subcommand};
use omnilytics_cli::{
    execute_command, exit_code_for_error, CliArgs, ClickCommand, CommandContext, ConfigManager,
    CustomCommand, InitCommand, SearchCommand, SuggestCommand, TopQueriesCommand,
    ValidateCommand, VisitCommand, DEFAULT_CONFIG_FILE,
};
use omnilytics_core::OmnilyticsError;
use omnilytics_infra::{init_logger, LoggerConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "omnilytics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Usage analytics client and omnibox query suggestions")]
#[command(long_about = r#"
Omnilytics talks to a usage analytics service: it records search, document
view and custom events for a visitor, and fetches the popular queries used
to suggest completions in a search box.

The visitor id is kept in a cookie file so consecutive runs count as the
same visitor.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults to ./omnilytics.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (json, yaml, pretty, compact, table)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Analytics service URL
    #[arg(long, global = true, env = "OMNILYTICS_SERVICE_URL")]
    service_url: Option<String>,

    /// Access token
    #[arg(long, global = true, env = "OMNILYTICS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Organization identifier
    #[arg(long, global = true)]
    organization: Option<String>,

    /// Cookie jar file holding the visitor id
    #[arg(long, global = true)]
    cookie_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current visit id
    Visit(VisitCommand),

    /// Fetch popular queries
    TopQueries(TopQueriesCommand),

    /// Send a custom event
    Custom(CustomCommand),

    /// Send search events
    Search(SearchCommand),

    /// Send a document view event
    Click(ClickCommand),

    /// Show omnibox suggestions for a partial query
    Suggest(SuggestCommand),

    /// Write a starter configuration file
    Init(InitCommand),

    /// Validate a configuration file
    Validate(ValidateCommand),

    /// Show version information
    Version,
}

impl Cli {
    fn overrides(&self) -> CliArgs {
        CliArgs {
            config_file: self.config.clone(),
            output_format: self.output.clone(),
            use_colors: self.no_color.then_some(false),
            service_url: self.service_url.clone(),
            token: self.token.clone(),
            organization: self.organization.clone(),
            cookie_file: self.cookie_file.clone(),
        }
    }

    fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                local.exists().then(|| local.to_path_buf())
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = omnilytics_cli::init() {
        eprintln!("Failed to initialize: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);

        let code = e
            .downcast_ref::<OmnilyticsError>()
            .map(exit_code_for_error)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut manager = ConfigManager::new();
    let config_path = cli.config_path();
    manager
        .load(config_path.as_deref())
        .context("Failed to load configuration")?;
    manager.merge_with_args(&cli.overrides())?;

    let (config, cli_config) = manager.into_parts();

    let mut logger = LoggerConfig::from_logging_config(&config.logging)?;
    if cli.verbose {
        logger = logger.with_level("debug");
    }
    init_logger(logger)?;

    debug!("Starting omnilytics v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        debug!("Using configuration {}", path.display());
    }

    let ctx = CommandContext::new(config, cli_config);

    match &cli.command {
        Commands::Visit(cmd) => execute_command(cmd, &ctx).await?,
        Commands::TopQueries(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Custom(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Search(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Click(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Suggest(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Init(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Validate(cmd) => execute_command(cmd, &ctx).await?,
        Commands::Version => handle_version(&ctx)?,
    }

    Ok(())
}

fn handle_version(ctx: &CommandContext) -> anyhow::Result<()> {
    let mut formatter = ctx.formatter();
    if formatter.is_human() {
        formatter.message(&omnilytics_core::version_info())?;
        formatter.message(&format!("CLI v{}", omnilytics_cli::VERSION))?;
        formatter.message(&format!("Infra v{}", omnilytics_infra::VERSION))?;
    } else {
        formatter.output(&serde_json::json!({
            "omnilytics": env!("CARGO_PKG_VERSION"),
            "core": omnilytics_core::VERSION,
            "cli": omnilytics_cli::VERSION,
            "infra": omnilytics_infra::VERSION,
        }))?;
    }
    Ok(())
}
