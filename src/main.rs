use actuator::cli;
use actuator::config::Config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "actuator", version, about = "Action registry and dispatch engine")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the prompt description of the offered actions
    List {
        /// Page URL the actions are offered for
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the decision JSON Schema
    Schema {
        #[arg(long)]
        url: Option<String>,
        /// Comma-separated allow-list of action names
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,
    },
    /// Print function-calling definitions
    Functions {
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,
    },
    /// Dispatch one action and print its result
    Run {
        /// Action name
        name: String,
        /// Parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
        /// Page the tab session starts on
        #[arg(long)]
        url: Option<String>,
    },
    /// Validate a model reply and dispatch the chosen action
    Decide {
        /// Reply text, or "-" to read it from stdin
        #[arg(long)]
        reply: String,
        #[arg(long)]
        url: Option<String>,
    },
}

/// Explicit `--config`, else `config.yaml` in the home directory if present.
async fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let home_config = actuator::actuator_home().join("config.yaml");
    tokio::fs::try_exists(&home_config)
        .await
        .unwrap_or(false)
        .then_some(home_config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Tracing goes up before the config is read so config loading is logged.
    // The config's `log_level` is applied afterwards through the reload handle.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env();
    let filter_from_env = env_filter.is_ok();
    let filter_handle = {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let initial =
            env_filter.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let (filter_layer, handle) = tracing_subscriber::reload::Layer::new(initial);

        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
        handle
    };

    let path = config_path(cli.config).await;
    info!(path = ?path, "loading configuration");
    let config = Config::load_or_default(path.as_deref()).await?;

    if let (false, Some(level)) = (filter_from_env, config.log_level.as_deref()) {
        if let Err(e) = filter_handle.modify(|f| *f = tracing_subscriber::EnvFilter::new(level)) {
            warn!(error = %e, log_level = level, "failed to apply configured log level");
        }
    }

    match cli.command {
        Command::List { url } => cli::list_actions(&config, url.as_deref()),
        Command::Schema { url, include } => cli::print_schema(&config, url.as_deref(), &include),
        Command::Functions { url, include } => {
            cli::print_functions(&config, url.as_deref(), &include)
        }
        Command::Run { name, params, url } => {
            cli::run_action(&config, &name, params.as_deref(), url.as_deref()).await
        }
        Command::Decide { reply, url } => cli::decide(&config, &reply, url.as_deref()).await,
    }
}
