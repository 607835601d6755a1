// Decoding of serialized chat prompts into role-tagged messages.
//
// Prompts arrive as the constructor dump of a chat prompt value:
// `{"kwargs": {"messages": [{"id": [.., "HumanMessage"], "kwargs": {"content": ..}}]}}`.

use serde_json::Value;

use crate::domain::entities::{ChatMessage, Role};
use crate::domain::errors::PromptError;

// Known message constructors. Anything else is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageTag {
    Human,
    Ai,
    System,
}

impl MessageTag {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "HumanMessage" => Some(MessageTag::Human),
            "AIMessage" => Some(MessageTag::Ai),
            "SystemMessage" => Some(MessageTag::System),
            _ => None,
        }
    }

    pub fn role(self) -> Role {
        match self {
            MessageTag::Human => Role::User,
            MessageTag::Ai => Role::Assistant,
            MessageTag::System => Role::System,
        }
    }
}

pub fn decode_prompt(prompt: &Value) -> Result<Vec<ChatMessage>, PromptError> {
    let messages = prompt
        .pointer("/kwargs/messages")
        .and_then(Value::as_array)
        .ok_or(PromptError::MissingMessages)?;

    messages
        .iter()
        .enumerate()
        .map(|(index, message)| decode_message(index, message))
        .collect()
}

fn decode_message(index: usize, message: &Value) -> Result<ChatMessage, PromptError> {
    // The constructor name is the last segment of the id path.
    let tag = message
        .get("id")
        .and_then(Value::as_array)
        .and_then(|path| path.last())
        .and_then(Value::as_str)
        .ok_or(PromptError::MissingTag { index })?;

    let tag = MessageTag::parse(tag).ok_or_else(|| PromptError::UnknownTag {
        index,
        tag: tag.to_string(),
    })?;

    let content = message
        .pointer("/kwargs/content")
        .and_then(text_content)
        .ok_or(PromptError::InvalidContent { index })?;

    Ok(ChatMessage {
        role: tag.role(),
        content,
    })
}

// Content is either a plain string or a list of parts; only text parts are allowed.
fn text_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(_) if part.get("type").and_then(Value::as_str) == Some("text") => {
                    part.get("text").and_then(Value::as_str)
                }
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|texts| texts.concat()),
        _ => None,
    }
}
