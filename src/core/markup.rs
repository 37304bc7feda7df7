//! Conversion of model output into the markup stored in assistant messages.
//!
//! Only two constructs are recognised: `**text**` becomes `<b>text</b>` and
//! any remaining single `*` becomes a `</br>` line break. The terminal
//! renderer in [`crate::ui::markup`] understands the resulting tags.

use crate::core::message::Message;

/// Format the markdown subset emitted by the model as markup.
///
/// The input is split on `**`; odd segments are bolded and even segments are
/// copied verbatim. An unbalanced `**` therefore bolds everything after it.
pub fn format_markdown_to_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut bolded = String::with_capacity(raw.len() + 16);
    for (index, segment) in raw.split("**").enumerate() {
        if index % 2 == 1 {
            bolded.push_str("<b>");
            bolded.push_str(segment);
            bolded.push_str("</b>");
        } else {
            bolded.push_str(segment);
        }
    }

    bolded.replace('*', "</br>")
}

/// Flatten a conversation into the `User: ...` / `Assistant: ...` transcript
/// sent as the prompt, one blank line between turns.
pub fn stitch_transcript<'a, I>(messages: I) -> String
where
    I: IntoIterator<Item = &'a Message>,
{
    messages
        .into_iter()
        .map(|m| format!("{}: {}", m.role.transcript_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
