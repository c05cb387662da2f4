use super::{
    check_status, generated_call_id, ChatMessage, ChatRequest, ChatResponse, LlmError, Part,
    Role, ToolCall,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
}

#[derive(Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

#[derive(Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn to_messages(request: &ChatRequest) -> Vec<OpenAiMessage> {
    let mut messages = vec![OpenAiMessage {
        role: "system".to_string(),
        content: Some(request.system.clone()),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }];

    for message in &request.messages {
        match message.role {
            Role::User => messages.push(OpenAiMessage {
                role: "user".to_string(),
                content: message.text().map(str::to_string),
                tool_calls: Vec::new(),
                tool_call_id: None,
            }),
            Role::Model => messages.push(OpenAiMessage {
                role: "assistant".to_string(),
                content: message.text().map(str::to_string),
                tool_calls: message
                    .tool_calls()
                    .into_iter()
                    .map(|call| OpenAiToolCall {
                        id: Some(call.id.clone()),
                        kind: function_kind(),
                        function: OpenAiFunctionCall {
                            name: call.name.clone(),
                            arguments: call.args.to_string(),
                        },
                    })
                    .collect(),
                tool_call_id: None,
            }),
            // One `tool` message per result, correlated by call id.
            Role::ToolResult => {
                for part in &message.parts {
                    if let Part::ToolResult(result) = part {
                        messages.push(OpenAiMessage {
                            role: "tool".to_string(),
                            content: Some(result.response.to_string()),
                            tool_calls: Vec::new(),
                            tool_call_id: Some(result.call_id.clone()),
                        });
                    }
                }
            }
        }
    }
    messages
}

fn build_request(request: &ChatRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: request.model.clone(),
        messages: to_messages(request),
        tools: request
            .tools
            .iter()
            .map(|tool| OpenAiTool {
                kind: "function",
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect(),
    }
}

fn from_message(message: OpenAiMessage) -> ChatMessage {
    let mut parts = Vec::new();
    if let Some(text) = message.content.filter(|t| !t.is_empty()) {
        parts.push(Part::Text { text });
    }
    for call in message.tool_calls {
        // Unparseable arguments are passed through as a string; the registry
        // reports them back to the model as invalid.
        let args = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        parts.push(Part::ToolCall(ToolCall {
            id: call.id.unwrap_or_else(generated_call_id),
            name: call.function.name,
            args,
            signature: None,
        }));
    }
    ChatMessage::model(parts)
}

pub async fn chat(config: &OpenAiConfig, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
    let client = Client::new();
    let body = build_request(request);

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = check_status(req.send().await?).await?;

    let data: OpenAiResponse = resp.json().await?;
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::NoCandidates)?;

    Ok(ChatResponse {
        message: from_message(choice.message),
        model: request.model.clone(),
    })
}
