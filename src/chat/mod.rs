//! The chat assistant: a bounded tool-calling loop over the catalog.

pub mod context;
pub mod executor;
pub mod guard;
pub mod prompt;
pub mod response;
pub mod tools;

pub use context::RequestContext;
pub use response::{ChatReply, NavButton};
pub use tools::{RegistryError, ToolRegistry};

use crate::llm::{ChatMessage, ChatModel, ChatRequest, LlmError};
use std::sync::Arc;

/// Upper bound on model calls per chat request.
pub const MAX_MODEL_TURNS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),
    #[error("database unavailable: {0}")]
    Store(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    DispatchingTools,
    Done,
    BudgetExceeded,
}

/// History and progress of one request's exchange with the model.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub history: Vec<ChatMessage>,
    pub turns: usize,
    pub state: LoopState,
}

impl Conversation {
    pub fn new(message: &str, user_location: Option<&str>) -> Self {
        let text = match user_location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => format!("[User is currently on page: {}]\n{}", location, message),
            None => message.to_string(),
        };
        Self {
            history: vec![ChatMessage::user(text)],
            turns: 0,
            state: LoopState::AwaitingModel,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, LoopState::Done | LoopState::BudgetExceeded)
    }
}

/// Everything needed to answer chat requests; shared across requests.
pub struct Assistant {
    model: Arc<dyn ChatModel>,
    model_id: String,
    system: String,
    registry: ToolRegistry,
    max_turns: usize,
}

impl Assistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        model_id: impl Into<String>,
        system: impl Into<String>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            system: system.into(),
            registry,
            max_turns: MAX_MODEL_TURNS,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Answers one user message. Tool calls run against `ctx`; the buttons it
    /// collects end up in the reply.
    pub async fn reply(
        &self,
        ctx: &mut RequestContext,
        message: &str,
        user_location: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        let conversation = self.run(ctx, message, user_location).await?;
        if conversation.state == LoopState::BudgetExceeded {
            tracing::info!(turns = conversation.turns, "turn budget exhausted");
        }
        Ok(response::assemble(&conversation.history, ctx.take_buttons()))
    }

    /// Drives the loop until the model stops calling tools or the turn budget
    /// runs out. Model failures abort immediately without retry.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        message: &str,
        user_location: Option<&str>,
    ) -> Result<Conversation, ChatError> {
        let tools = self.registry.declarations();
        let mut conversation = Conversation::new(message, user_location);

        while !conversation.is_finished() {
            conversation.state = match conversation.state {
                LoopState::AwaitingModel => {
                    conversation.turns += 1;
                    let request = ChatRequest {
                        model: self.model_id.clone(),
                        system: self.system.clone(),
                        messages: conversation.history.clone(),
                        tools: tools.clone(),
                    };
                    let response = self.model.chat(&request).await?;
                    let wants_tools = !response.message.tool_calls().is_empty();
                    conversation.history.push(response.message);

                    if !wants_tools {
                        LoopState::Done
                    } else if conversation.turns >= self.max_turns {
                        LoopState::BudgetExceeded
                    } else {
                        LoopState::DispatchingTools
                    }
                }
                LoopState::DispatchingTools => {
                    let calls: Vec<_> = conversation
                        .history
                        .last()
                        .map(|m| m.tool_calls().into_iter().cloned().collect())
                        .unwrap_or_default();
                    tracing::info!(
                        turn = conversation.turns,
                        calls = calls.len(),
                        "executing function calls"
                    );
                    let results = calls
                        .iter()
                        .map(|call| self.registry.dispatch(call, ctx))
                        .collect();
                    conversation.history.push(ChatMessage::tool_results(results));
                    LoopState::AwaitingModel
                }
                finished => finished,
            };
        }

        Ok(conversation)
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("model_id", &self.model_id)
            .field("registry", &self.registry)
            .field("max_turns", &self.max_turns)
            .finish()
    }
}
