//! Inspect or delete the conversation saved on this device.

use std::error::Error;

use ratatui::style::Style;
use ratatui::text::Line;

use crate::core::conversation::NO_HISTORY_NOTICE;
use crate::core::message::{Message, Role};
use crate::core::storage::{LocalStorage, StorageError, MESSAGES_KEY};
use crate::ui::markup::markup_to_lines;

/// Render the saved conversation as plain text, one block per turn.
pub fn render_history(storage: &LocalStorage) -> Result<String, Box<dyn Error>> {
    let Some(saved) = storage.get_item(MESSAGES_KEY) else {
        return Ok(format!("{NO_HISTORY_NOTICE}\n"));
    };
    let messages: Vec<Message> = serde_json::from_str(saved)
        .map_err(|e| format!("Failed to parse saved chat: {e}"))?;
    if messages.is_empty() {
        return Ok(format!("{NO_HISTORY_NOTICE}\n"));
    }

    let mut out = String::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let label = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        out.push_str(label);
        out.push_str(":\n");
        for line in message_text(message) {
            out.push_str("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    Ok(out)
}

/// Remove the saved conversation. Returns whether there was one.
pub fn clear_history(storage: &mut LocalStorage) -> Result<bool, StorageError> {
    let existed = storage.get_item(MESSAGES_KEY).is_some();
    if existed {
        storage.remove_item(MESSAGES_KEY)?;
        tracing::info!("cleared saved conversation from the command line");
    }
    Ok(existed)
}

fn message_text(message: &Message) -> Vec<String> {
    match message.role {
        Role::User => message.content.split('\n').map(str::to_string).collect(),
        Role::Assistant => markup_to_lines(&message.content, Style::default(), Style::default())
            .iter()
            .map(line_text)
            .collect(),
    }
}

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
