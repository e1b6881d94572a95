use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::expenses::{self, AddExpenseParams, DateRangeParams, SummarizeParams};
use crate::mcp::ToolResult;
use crate::store::ExpenseStore;

/// Dispatches tool calls by name against the shared store.
#[derive(Clone)]
pub struct ToolExecutor {
    store: Arc<dyn ExpenseStore>,
}

impl ToolExecutor {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }

    pub async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult> {
        debug!("Executing tool: {}", tool_name);
        let store = self.store.as_ref();

        match tool_name {
            "add_expense" => {
                let params: AddExpenseParams = parse_arguments(tool_name, arguments)?;
                to_result(expenses::add_expense(store, params).await?)
            }
            "list_expenses" => {
                let params: DateRangeParams = parse_arguments(tool_name, arguments)?;
                to_result(expenses::list_expenses(store, params).await?)
            }
            "summarize" => {
                let params: SummarizeParams = parse_arguments(tool_name, arguments)?;
                to_result(expenses::summarize(store, params).await?)
            }
            _ => Err(anyhow!("Tool not found: {}", tool_name)),
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(tool_name: &str, arguments: serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments)
        .with_context(|| format!("Invalid arguments for {}", tool_name))
}

fn to_result<T: Serialize>(output: T) -> Result<ToolResult> {
    let value = serde_json::to_value(output)?;
    Ok(ToolResult::json(value)?)
}
