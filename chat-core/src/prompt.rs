//! Prompt builder: fixed assistant instructions, the full history, the new message.

use crate::turn::Turn;

/// Instructions placed at the top of every prompt.
pub const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful AI assistant. Respond to the user message, taking into account the chat history to provide contextually relevant responses.
IMPORTANT: Your response must be plain text only. Do not wrap your response in JSON. Do not output any schema definitions or JSON formatting.";

/// Render the single prompt sent to the backend for one exchange.
///
/// Every turn appears once, as `role: content`, in the order given. Nothing
/// is dropped or rewritten; how much history to send is the caller's call.
///
/// # Example
/// ```
/// # use chat_core::{Turn, prompt::render_prompt};
/// let history = vec![Turn::user("Hi"), Turn::model("Hello!")];
/// let prompt = render_prompt(&history, "How are you?");
/// assert!(prompt.contains("user: Hi\nmodel: Hello!\n"));
/// assert!(prompt.contains("User Message: How are you?"));
/// ```
pub fn render_prompt(history: &[Turn], message: &str) -> String {
    let history_chars: usize = history.iter().map(|t| t.content.len() + 8).sum();
    let mut out =
        String::with_capacity(ASSISTANT_INSTRUCTIONS.len() + history_chars + message.len() + 96);

    out.push_str(ASSISTANT_INSTRUCTIONS);
    out.push_str("\n\nChat History:\n");
    for turn in history {
        out.push_str(turn.role.as_str());
        out.push_str(": ");
        out.push_str(&turn.content);
        out.push('\n');
    }
    out.push_str("\nUser Message: ");
    out.push_str(message);
    out.push_str("\n\nAssistant's Plain Text Response:");
    out
}
