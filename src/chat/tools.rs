use super::context::RequestContext;
use super::executor;
use super::response::NavButton;
use crate::llm::{ToolCall, ToolDeclaration, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const QUERY_TOOL: &str = "generate_query_sql";
pub const BUTTONS_TOOL: &str = "show_navigation_buttons";

/// A function the model may call.
pub trait Tool: Send + Sync {
    fn declaration(&self) -> &ToolDeclaration;

    /// Runs the tool. `Err` carries a message fed back to the model.
    fn call(&self, args: Value, ctx: &mut RequestContext) -> Result<Value, String>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("tool '{name}' has an invalid parameter schema: {reason}")]
    InvalidSchema { name: String, reason: String },
}

/// Name → handler table, fixed for the life of the process.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            tools: HashMap::new(),
            order: Vec::new(),
        };
        for tool in tools {
            let declaration = tool.declaration();
            validate_schema(declaration)?;
            let name = declaration.name.clone();
            if registry.tools.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            registry.order.push(name.clone());
            registry.tools.insert(name, tool);
        }
        Ok(registry)
    }

    /// The catalog query tool plus the navigation-button tool.
    pub fn catalog() -> Result<Self, RegistryError> {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(QueryCatalogTool::new()),
            Arc::new(NavigationButtonsTool::new()),
        ];
        Self::new(tools)
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Declarations in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.declaration().clone())
            .collect()
    }

    /// Runs one invocation and wraps its outcome for the history.
    pub fn dispatch(&self, call: &ToolCall, ctx: &mut RequestContext) -> ToolResult {
        tracing::debug!(tool = %call.name, args = %call.args, "tool called");
        let response = match self.tools.get(&call.name) {
            Some(tool) => match tool.call(call.args.clone(), ctx) {
                Ok(value) => json!({ "result": value }),
                Err(error) => json!({ "error": error }),
            },
            None => {
                tracing::warn!(tool = %call.name, "model called an unknown tool");
                json!({ "error": "Function not found" })
            }
        };
        tracing::debug!(tool = %call.name, %response, "tool finished");
        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            response,
        }
    }
}

fn validate_schema(declaration: &ToolDeclaration) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidSchema {
        name: declaration.name.clone(),
        reason: reason.to_string(),
    };
    let schema = &declaration.parameters;
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(invalid("top-level type must be \"object\""));
    }
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing \"properties\" object"))?;
    if let Some(required) = schema.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| invalid("\"required\" must be an array"))?;
        for name in required {
            let name = name
                .as_str()
                .ok_or_else(|| invalid("\"required\" entries must be strings"))?;
            if !properties.contains_key(name) {
                return Err(invalid(&format!("required field '{}' is not a property", name)));
            }
        }
    }
    Ok(())
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {}: {}", tool, e))
}

// ── Catalog query ──

pub struct QueryCatalogTool {
    declaration: ToolDeclaration,
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

impl QueryCatalogTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration {
                name: QUERY_TOOL.to_string(),
                description: "Execute a READ-ONLY query against the SQLite product database. \
                    ONLY SELECT queries are allowed. Use this whenever you need jeans product data \
                    from the 'jeans' table.\n\n\
                    The jeans table contains columns: id, selling_price (JSON), discount, category_id, \
                    meta_info, product_id, pdp_url, sku, brand, department_id, last_seen_date, launch_on, \
                    mrp (JSON), product_name, feature_image_s3, channel_id, feature_list (JSON), \
                    description, style_attributes (JSON), pdp_images_s3 (JSON).\n\n\
                    For JSON fields like selling_price and mrp use SQLite JSON functions:\n\
                    - json_extract(selling_price, '$.USD') to get the USD amount as a number\n\
                    - selling_price ->> '$.USD' is equivalent"
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "A single SQLite SELECT statement over the 'jeans' table. Examples:\n\
                                - SELECT * FROM jeans LIMIT 10\n\
                                - SELECT brand, product_name, json_extract(selling_price, '$.USD') AS price FROM jeans WHERE brand = 'RALPH LAUREN' LIMIT 10\n\
                                - SELECT brand, COUNT(*) AS total FROM jeans GROUP BY brand\n\
                                - SELECT * FROM jeans WHERE discount > 0 ORDER BY discount DESC LIMIT 10\n\
                                Only SELECT statements are allowed."
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }
}

impl Default for QueryCatalogTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for QueryCatalogTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn call(&self, args: Value, ctx: &mut RequestContext) -> Result<Value, String> {
        let args: QueryArgs = parse_args(QUERY_TOOL, args)?;
        let result = executor::execute(ctx.connection(), &args.query);
        tracing::debug!(
            success = result.success,
            rows = result.row_count.unwrap_or(0),
            "catalog query finished"
        );
        serde_json::to_value(result).map_err(|e| e.to_string())
    }
}

// ── Navigation buttons ──

pub struct NavigationButtonsTool {
    declaration: ToolDeclaration,
}

#[derive(Deserialize)]
struct ButtonArgs {
    buttons: Vec<ButtonSpec>,
}

#[derive(Deserialize)]
struct ButtonSpec {
    label: String,
    target: String,
}

impl NavigationButtonsTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration {
                name: BUTTONS_TOOL.to_string(),
                description: "Show clickable navigation buttons under your reply, e.g. links to a \
                    product page (/products/<id>) or a filtered listing (/products?search=<term>). \
                    Calling this does NOT replace your answer: always also reply with a short text \
                    message."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "buttons": {
                            "type": "array",
                            "description": "Buttons to display, in order.",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "label": {"type": "string", "description": "Button caption"},
                                    "target": {"type": "string", "description": "Relative URL the button opens"}
                                },
                                "required": ["label", "target"]
                            }
                        }
                    },
                    "required": ["buttons"]
                }),
            },
        }
    }
}

impl Default for NavigationButtonsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for NavigationButtonsTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn call(&self, args: Value, ctx: &mut RequestContext) -> Result<Value, String> {
        let args: ButtonArgs = parse_args(BUTTONS_TOOL, args)?;
        let buttons: Vec<NavButton> = args
            .buttons
            .into_iter()
            .filter(|b| !b.label.trim().is_empty() && !b.target.trim().is_empty())
            .map(|b| NavButton {
                text: b.label.trim().to_string(),
                url: b.target.trim().to_string(),
            })
            .collect();
        if buttons.is_empty() {
            return Err("No valid buttons provided; each needs a label and a target".to_string());
        }

        let count = buttons.len();
        ctx.record_buttons(buttons);
        Ok(json!({
            "status": "ok",
            "buttons_recorded": count,
            "instruction": "Buttons will be shown to the user. You must still reply with a short text message."
        }))
    }
}
