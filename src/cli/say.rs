//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::api::client::CompletionClient;
use crate::core::config::Config;

pub async fn run_say(prompt: Vec<String>, model: Option<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: parlance say <prompt>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let client = super::build_client(&config, model.as_deref())?;

    let mut stdout = io::stdout().lock();
    say_with(&client, &prompt, &mut stdout).await
}

/// Send a single prompt with no history and write the plain reply.
pub async fn say_with<W: Write>(
    client: &dyn CompletionClient,
    prompt: &str,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    tracing::debug!(chars = prompt.chars().count(), "sending one-shot prompt");
    let reply = client.complete(prompt, &[]).await?;
    writeln!(out, "{}", reply.trim_end())?;
    out.flush()?;
    Ok(())
}
