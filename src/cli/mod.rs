//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod history;
pub mod say;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::api::client::ResponsesClient;
use crate::core::appearance::system_preference;
use crate::core::config::Config;
use crate::core::conversation::ConversationStore;
use crate::core::storage::LocalStorage;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_logging, LogTarget};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Parser)]
#[command(name = "parlance")]
#[command(version)]
#[command(about = "A full-screen terminal chat front-end for hosted completion APIs")]
#[command(
    long_about = "Parlance is a full-screen terminal chat interface. Prompts are sent to a \
hosted completion API and replies are revealed word by word. The conversation and the \
light/dark theme are saved on this device.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    Your API key (required for chat and say)\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\
  PARLANCE_LOG      Log filter, e.g. parlance=debug (used with --log)\n\n\
Controls:\n\
  Enter             Send the prompt\n\
  Ctrl+B            Open the menu (new chat, recent prompts, activity, settings)\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+T            Switch between light and dark\n\
  F1                Show all key bindings\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use instead of the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to the given file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and print the reply
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Show or clear the conversation saved on this device
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Set a configuration value, or print the configuration when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// Print the saved conversation (default)
    Show,
    /// Delete the saved conversation
    Clear,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    let log_target = match (args.log.as_deref(), &command) {
        (Some(path), _) => LogTarget::File(Path::new(path)),
        (None, Commands::Chat) => LogTarget::Disabled,
        (None, _) => LogTarget::Stderr,
    };
    init_logging(log_target)?;

    match command {
        Commands::Chat => {
            let config = Config::load()?;
            let client = match build_client(&config, args.model.as_deref()) {
                Ok(client) => client,
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            };
            let storage = LocalStorage::open_default()?;
            let store = ConversationStore::new(
                storage,
                system_preference(),
                Duration::from_millis(config.word_delay_ms()),
            );
            let model = client.model().to_string();
            run_chat(store, model, Arc::new(client)).await
        }
        Commands::Say { prompt } => say::run_say(prompt, args.model).await,
        Commands::History { action } => {
            let mut storage = LocalStorage::open_default()?;
            match action.unwrap_or(HistoryAction::Show) {
                HistoryAction::Show => print!("{}", history::render_history(&storage)?),
                HistoryAction::Clear => {
                    if history::clear_history(&mut storage)? {
                        println!("✅ Cleared the saved conversation");
                    } else {
                        println!("No saved conversation to clear");
                    }
                }
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            if value.is_empty() {
                eprintln!("⚠️  Missing value. Example: parlance set {key} <value>");
                std::process::exit(1);
            }
            let value = value.join(" ");
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            if let Err(e) = config.unset_value(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

/// Require a non-blank API key.
pub fn resolve_api_key(value: Option<String>) -> Result<String, Box<dyn Error>> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| format!("{API_KEY_ENV} is not set. Export your API key and try again.").into())
}

/// Build the completion client from the environment and configuration.
pub fn build_client(config: &Config, model: Option<&str>) -> Result<ResponsesClient, Box<dyn Error>> {
    let api_key = resolve_api_key(std::env::var(API_KEY_ENV).ok())?;
    let base_url = config.resolve_base_url(std::env::var(BASE_URL_ENV).ok());
    tracing::debug!(%base_url, "using completion endpoint");
    Ok(ResponsesClient::new(
        base_url,
        api_key,
        config.generation_config(model),
    ))
}
