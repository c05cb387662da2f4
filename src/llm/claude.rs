use super::{check_status, ChatMessage, ChatRequest, ChatResponse, LlmError, Part, Role, ToolCall};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ClaudeTool>,
}

#[derive(Serialize)]
struct ClaudeTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: Vec<ClaudeBlock>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeBlock>,
}

fn build_request(request: &ChatRequest) -> ClaudeRequest {
    let messages = request
        .messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::Model => "assistant",
                // Anthropic expects tool results on the user role.
                Role::User | Role::ToolResult => "user",
            };
            let content = message
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text { text } => ClaudeBlock::Text { text: text.clone() },
                    Part::ToolCall(call) => ClaudeBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.args.clone(),
                    },
                    Part::ToolResult(result) => ClaudeBlock::ToolResult {
                        tool_use_id: result.call_id.clone(),
                        content: result.response.to_string(),
                    },
                })
                .collect();
            ClaudeMessage { role, content }
        })
        .collect();

    ClaudeRequest {
        model: request.model.clone(),
        max_tokens: 4096,
        messages,
        system: Some(request.system.clone()).filter(|s| !s.is_empty()),
        tools: request
            .tools
            .iter()
            .map(|tool| ClaudeTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.parameters.clone(),
            })
            .collect(),
    }
}

fn from_blocks(blocks: Vec<ClaudeBlock>) -> ChatMessage {
    let parts = blocks
        .into_iter()
        .filter_map(|block| match block {
            ClaudeBlock::Text { text } => Some(Part::Text { text }),
            ClaudeBlock::ToolUse { id, name, input } => Some(Part::ToolCall(ToolCall {
                id,
                name,
                args: input,
                signature: None,
            })),
            ClaudeBlock::ToolResult { .. } | ClaudeBlock::Other => None,
        })
        .collect();
    ChatMessage::model(parts)
}

pub async fn chat(config: &ClaudeConfig, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
    let client = Client::new();
    let body = build_request(request);

    let resp = client
        .post(format!("{}/v1/messages", config.base_url))
        .header("Content-Type", "application/json")
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .send()
        .await?;
    let resp = check_status(resp).await?;

    let data: ClaudeResponse = resp.json().await?;

    Ok(ChatResponse {
        message: from_blocks(data.content),
        model: request.model.clone(),
    })
}
