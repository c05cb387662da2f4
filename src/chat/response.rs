use crate::llm::{ChatMessage, Part, Role};
use serde::{Deserialize, Serialize};

pub const BUTTONS_FALLBACK_TEXT: &str = "Here are some options for you:";

/// Navigation suggestion rendered by the frontend as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavButton {
    pub text: String,
    pub url: String,
}

/// Payload returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<NavButton>,
}

/// Builds the reply from the final history and the collected buttons.
///
/// The answer is the first non-blank text part of the last model message.
/// Buttons without any text get a fixed lead-in so the reply is never blank.
pub fn assemble(history: &[ChatMessage], buttons: Vec<NavButton>) -> ChatReply {
    let text = history
        .iter()
        .rev()
        .find(|message| message.role == Role::Model)
        .and_then(|message| {
            message.parts.iter().find_map(|part| match part {
                Part::Text { text } if !text.trim().is_empty() => Some(text.trim().to_string()),
                _ => None,
            })
        });

    let response = match text {
        Some(text) => Some(text),
        None if !buttons.is_empty() => {
            tracing::warn!("model produced buttons without text, using fallback");
            Some(BUTTONS_FALLBACK_TEXT.to_string())
        }
        None => None,
    };

    ChatReply { response, buttons }
}
