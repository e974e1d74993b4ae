use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use offsync::cli::args::{Cli, Commands, OutputFormat};
use offsync::cli::commands;
use offsync::config::{ColorSetting, Config, Paths};
use offsync::features::forms::{FormOutbox, SEND_FORM};
use offsync::features::sync::{ActionPile, PileOptions};
use offsync::network::{oracle_from_config, NetworkOracle, NetworkSwitch};
use offsync::storage::Database;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "offsync=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let app = App::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let output = runtime.block_on(execute(cli.command, &app))?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Settings resolved from the command line and the config file.
struct App {
    paths: Paths,
    config: Config,
    network: Arc<dyn NetworkOracle>,
    format: OutputFormat,
}

impl App {
    fn load(cli: &Cli) -> Result<Self> {
        let paths = Paths::new()?;
        let config = Config::load_from_path(&paths.config_file)?;
        apply_color(config.general.color);
        let format = cli.output.unwrap_or(config.general.default_output);

        let network: Arc<dyn NetworkOracle> = if cli.offline {
            Arc::new(NetworkSwitch::offline())
        } else if cli.online {
            Arc::new(NetworkSwitch::online())
        } else {
            Arc::from(oracle_from_config(&config.network))
        };

        Ok(Self {
            paths,
            config,
            network,
            format,
        })
    }

    /// Open the pile in the data directory, creating it if needed.
    async fn open_pile(&self, replay_pending: bool) -> Result<ActionPile> {
        self.paths.ensure_dirs()?;
        let db = Database::open_at(&self.paths.database)
            .with_context(|| format!("failed to open {}", self.paths.database.display()))?;
        let pile = ActionPile::open_with_options(
            db,
            self.network.clone(),
            PileOptions::from(&self.config),
        )
        .context("failed to load the action pile")?;
        pile.register(SEND_FORM, FormOutbox::new(self.paths.outbox.clone()));

        if replay_pending && self.config.sync.replay_on_start {
            let report = pile.replay_pile().await;
            info!(
                delivered = report.delivered,
                failed = report.failed,
                "replayed pile on start"
            );
        }
        Ok(pile)
    }
}

async fn execute(command: Commands, app: &App) -> Result<String> {
    let format = app.format;
    let output = match command {
        Commands::Completions { shell, install } => commands::completions(&shell, install)?,
        Commands::Outbox => commands::outbox(&app.paths.outbox, format)?,
        Commands::Sync => commands::sync(&app.open_pile(false).await?, format).await?,
        Commands::Submit {
            firstname,
            lastname,
        } => {
            let pile = app.open_pile(true).await?;
            commands::submit(&pile, &firstname, &lastname, format).await?
        }
        Commands::Enqueue { action, data } => {
            commands::enqueue(&app.open_pile(true).await?, &action, &data, format).await?
        }
        Commands::Status => commands::status(&app.open_pile(true).await?, format).await?,
        Commands::List { data_only } => {
            commands::list(&app.open_pile(true).await?, data_only, format).await?
        }
        Commands::Purge { action } => {
            commands::purge(&app.open_pile(true).await?, action.as_deref(), format).await?
        }
    };
    Ok(output)
}

fn apply_color(setting: ColorSetting) {
    match setting {
        ColorSetting::Always => colored::control::set_override(true),
        ColorSetting::Never => colored::control::set_override(false),
        ColorSetting::Auto => {}
    }
}
