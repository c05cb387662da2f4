#![allow(dead_code)]

use async_trait::async_trait;
use catalog_chat::db::models::NewProduct;
use catalog_chat::llm::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, LlmError, Part, ToolCall,
};
use catalog_chat::{Assistant, Database, ToolRegistry};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Model that replays canned replies and records every request it sees.
/// Once the queue is empty the last reply is repeated.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ChatMessage>>,
    last: Mutex<Option<ChatMessage>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ChatMessage>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let message = match next {
            Some(message) => {
                *self.last.lock().unwrap() = Some(message.clone());
                message
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or(LlmError::NoCandidates)?,
        };
        Ok(ChatResponse {
            message,
            model: request.model.clone(),
        })
    }
}

/// Model whose every call fails with an upstream API error.
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        })
    }
}

pub fn text(reply: &str) -> ChatMessage {
    ChatMessage::model(vec![Part::Text {
        text: reply.to_string(),
    }])
}

pub fn call(id: &str, name: &str, args: Value) -> Part {
    Part::ToolCall(ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        args,
        signature: None,
    })
}

pub fn calls(parts: Vec<Part>) -> ChatMessage {
    ChatMessage::model(parts)
}

pub fn query(id: &str, sql: &str) -> Part {
    call(id, "generate_query_sql", json!({ "query": sql }))
}

/// A catalog file with three products, ids 1..=3.
pub fn seeded_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("catalog.db")).unwrap();
    for (i, (name, brand, price)) in [
        ("Slim Fit Stretch", "RALPH LAUREN", 19.99),
        ("Relaxed Taper", "LEVI'S", 79.5),
        ("Skinny Ankle", "WRANGLER", 45.0),
    ]
    .into_iter()
    .enumerate()
    {
        db.insert_product(&NewProduct {
            product_id: format!("p{}", i + 1),
            product_name: name.to_string(),
            brand: brand.to_string(),
            selling_price: Some(json!({ "USD": price })),
            discount: 0.1,
            launch_on: Some("2024-03-01".to_string()),
            ..Default::default()
        })
        .unwrap();
    }
    (dir, db)
}

pub fn assistant(model: Arc<dyn ChatModel>) -> Assistant {
    Assistant::new(
        model,
        "test-model",
        "system instruction",
        ToolRegistry::catalog().unwrap(),
    )
}
