use super::{
    check_status, generated_call_id, ChatMessage, ChatRequest, ChatResponse, LlmError, Part,
    Role, ToolCall,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
}

#[derive(Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

fn to_content(message: &ChatMessage) -> GeminiContent {
    // Gemini carries function responses on the user role.
    let role = match message.role {
        Role::Model => "model",
        Role::User | Role::ToolResult => "user",
    };
    let parts = message
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => GeminiPart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::ToolCall(call) => GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                thought_signature: call.signature.clone(),
                ..Default::default()
            },
            Part::ToolResult(result) => GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    name: result.name.clone(),
                    response: result.response.clone(),
                }),
                ..Default::default()
            },
        })
        .collect();
    GeminiContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn build_request(request: &ChatRequest) -> GeminiRequest {
    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTool {
            function_declarations: request
                .tools
                .iter()
                .map(|tool| GeminiFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }]
    };

    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(request.system.clone()),
                ..Default::default()
            }],
        },
        contents: request.messages.iter().map(to_content).collect(),
        tools,
    }
}

fn from_content(content: GeminiContent) -> ChatMessage {
    let parts = content
        .parts
        .into_iter()
        .filter(|part| part.thought != Some(true))
        .filter_map(|part| {
            if let Some(call) = part.function_call {
                let args = if call.args.is_null() {
                    Value::Object(Default::default())
                } else {
                    call.args
                };
                Some(Part::ToolCall(ToolCall {
                    id: generated_call_id(),
                    name: call.name,
                    args,
                    signature: part.thought_signature,
                }))
            } else {
                part.text.map(|text| Part::Text { text })
            }
        })
        .collect();
    ChatMessage::model(parts)
}

pub async fn chat(config: &GeminiConfig, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
    let client = Client::new();
    let body = build_request(request);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;
    let resp = check_status(resp).await?;

    let data: GeminiResponse = resp.json().await?;
    let candidate = data
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::NoCandidates)?;

    Ok(ChatResponse {
        message: from_content(candidate.content.unwrap_or_default()),
        model: request.model.clone(),
    })
}
