pub mod rmcp_server;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: ToolInputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
        }
    }
}

impl ToolInputSchema {
    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolResult {
    /// Wrap a JSON value as a tool result. Non-object values are nested under
    /// `result` in the structured content, since that field must be an object.
    pub fn json(value: Value) -> serde_json::Result<Self> {
        let text = serde_json::to_string(&value)?;
        let structured = if value.is_object() {
            value
        } else {
            json!({ "result": value })
        };

        Ok(Self {
            content: vec![ToolContent::Text { text }],
            is_error: None,
            structured_content: Some(structured),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
            structured_content: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

fn string_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// The tools this server registers, in listing order.
pub fn expense_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "add_expense".to_string(),
            description: "Add a new expense entry to Supabase.".to_string(),
            input_schema: ToolInputSchema::default()
                .property("date", string_schema("Expense date (YYYY-MM-DD)"), true)
                .property(
                    "amount",
                    json!({ "type": "number", "description": "Amount spent" }),
                    true,
                )
                .property("category", string_schema("Expense category"), true)
                .property(
                    "subcategory",
                    json!({ "type": "string", "default": "", "description": "Optional subcategory" }),
                    false,
                )
                .property(
                    "note",
                    json!({ "type": "string", "default": "", "description": "Optional free-form note" }),
                    false,
                ),
        },
        Tool {
            name: "list_expenses".to_string(),
            description: "List expense entries within an inclusive date range.".to_string(),
            input_schema: ToolInputSchema::default()
                .property("start_date", string_schema("First date to include (YYYY-MM-DD)"), true)
                .property("end_date", string_schema("Last date to include (YYYY-MM-DD)"), true),
        },
        Tool {
            name: "summarize".to_string(),
            description: "Summarize expenses by category within an inclusive date range."
                .to_string(),
            input_schema: ToolInputSchema::default()
                .property("start_date", string_schema("First date to include (YYYY-MM-DD)"), true)
                .property("end_date", string_schema("Last date to include (YYYY-MM-DD)"), true)
                .property(
                    "category",
                    json!({ "type": ["string", "null"], "default": null, "description": "Only total this category" }),
                    false,
                ),
        },
    ]
}
