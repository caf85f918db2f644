//! CLI command definitions and dispatch.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config::AegisConfig;
use crate::error::AegisError;
use crate::events::{EventKind, write_event};
use crate::yabai::YabaiGateway;
use crate::yabai::signals::{self, SignalTarget};
use crate::{config, daemon, logging, schema};

pub mod control;
pub mod query;
pub mod types;

pub use control::{LayoutCommands, SpaceCommands, WindowCommands};
pub use query::QueryCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Aegis - yabai state sync and notch HUD arbitration.
#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    ///
    /// AEGIS_LOG and the configuration's logLevel take precedence.
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the sync daemon (the default when no command is given).
    Run,

    /// Query spaces, windows and icons.
    Query {
        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j', global = true)]
        json: bool,

        #[command(subcommand)]
        command: QueryCommands,
    },

    /// Space commands.
    #[command(subcommand)]
    Space(SpaceCommands),

    /// Window commands.
    #[command(subcommand)]
    Window(WindowCommands),

    /// Layout commands for the focused space.
    #[command(subcommand)]
    Layout(LayoutCommands),

    /// Manage the yabai signals that feed the event pipe.
    #[command(subcommand)]
    Signals(SignalsCommands),

    /// Forward a window manager event to the running daemon.
    ///
    /// Invoked by yabai signals. Exits quietly when no daemon is listening.
    Event {
        /// Event name, e.g. window_focused.
        name: String,

        /// Pipe to write to instead of the configured one.
        #[arg(long, value_name = "PATH")]
        pipe: Option<PathBuf>,
    },

    /// Output Aegis configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// Aegis configuration file. Can be redirected to a file for use with
    /// editors that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(aegis completions --shell zsh)"
    ///   aegis completions --shell fish > ~/.config/fish/completions/aegis.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

/// Signal management subcommands.
#[derive(Subcommand, Debug)]
pub enum SignalsCommands {
    /// Register (or re-register) every signal.
    Install,

    /// Remove every signal carrying the configured label prefix.
    Remove,
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(self) -> Result<(), AegisError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(AegisError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }

        let config = config::init();
        logging::init(self.verbose, config.log_level.as_deref());

        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => daemon::run(config),

            Commands::Query { json, command } => {
                let gateway = YabaiGateway::from_config(&config.yabai);
                block_on(query::execute(&command, json, &gateway, config))?
            }

            Commands::Space(cmd) => run_intent(cmd.intent(), config),
            Commands::Window(cmd) => run_intent(cmd.intent(), config),
            Commands::Layout(cmd) => run_intent(cmd.intent(), config),

            Commands::Signals(cmd) => block_on(execute_signals(&cmd, config))?,

            Commands::Event { name, pipe } => {
                let pipe = pipe.unwrap_or_else(|| config.events.resolved_pipe_path());
                forward_event(&name, &pipe)
            }

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "aegis", &mut io::stdout());
    }
}

/// Runs `future` on a current-thread runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, AegisError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

fn run_intent(intent: crate::commands::Intent, config: &AegisConfig) -> Result<(), AegisError> {
    let gateway = Arc::new(YabaiGateway::from_config(&config.yabai));
    block_on(control::dispatch(intent, gateway, config))?
}

async fn execute_signals(cmd: &SignalsCommands, config: &AegisConfig) -> Result<(), AegisError> {
    let gateway = YabaiGateway::from_config(&config.yabai);

    match cmd {
        SignalsCommands::Install => {
            let target = SignalTarget::for_current_exe(&config.events)?;
            let count = signals::register_signals(&gateway, &target).await?;
            println!("Registered {count} signals (pipe: {})", target.pipe.display());
        }
        SignalsCommands::Remove => {
            let count =
                signals::remove_signals(&gateway, &config.events.signal_label_prefix).await?;
            println!("Removed {count} signals");
        }
    }
    Ok(())
}

/// Writes one event line. A missing reader is not an error.
fn forward_event(name: &str, pipe: &std::path::Path) -> Result<(), AegisError> {
    if EventKind::parse(name) == EventKind::Unknown {
        return Err(AegisError::InvalidArguments(format!("Unknown event '{name}'")));
    }

    if !write_event(pipe, name.trim())? {
        tracing::debug!("cli: no reader on {}, dropped {name}", pipe.display());
    }
    Ok(())
}
