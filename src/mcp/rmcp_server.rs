use anyhow::Result;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities,
    Tool as RmcpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::mcp::{Tool, ToolContent, ToolResult, expense_tools};
use crate::tools::ToolExecutor;

/// Adapter that bridges rmcp's ServerHandler with the expense ToolExecutor
#[derive(Clone)]
pub struct ExpenseMcpHandler {
    tools: Arc<Vec<Tool>>,
    tool_executor: ToolExecutor,
}

impl ExpenseMcpHandler {
    pub fn new(tool_executor: ToolExecutor) -> Self {
        let tools = expense_tools();
        for tool in &tools {
            info!("Registering tool: {}", tool.name);
        }

        Self {
            tools: Arc::new(tools),
            tool_executor,
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run a tool by name. Failures come back as an error result rather than
    /// a protocol error so the caller sees the message.
    pub async fn dispatch(&self, name: &str, arguments: Option<Map<String, Value>>) -> CallToolResult {
        if !self.tools.iter().any(|t| t.name == name) {
            error!("Tool not found: {}", name);
            return into_call_result(ToolResult::error(format!("Tool not found: {}", name)));
        }

        let arguments = arguments.map(Value::Object).unwrap_or(json!({}));

        match self.tool_executor.execute_tool(name, arguments).await {
            Ok(result) => into_call_result(result),
            Err(e) => {
                error!("Tool execution failed: {:#}", e);
                into_call_result(ToolResult::error(format!("Error: {:#}", e)))
            }
        }
    }

    /// Convert our Tool to rmcp's Tool format
    fn convert_to_rmcp_tool(tool: &Tool) -> RmcpTool {
        let mut schema_map = Map::new();
        schema_map.insert(
            "type".to_string(),
            Value::String(tool.input_schema.schema_type.clone()),
        );
        schema_map.insert(
            "properties".to_string(),
            Value::Object(tool.input_schema.properties.clone().into_iter().collect()),
        );
        schema_map.insert(
            "required".to_string(),
            Value::Array(
                tool.input_schema
                    .required
                    .iter()
                    .map(|s| Value::String(s.clone()))
                    .collect(),
            ),
        );

        RmcpTool {
            name: Cow::Owned(tool.name.clone()),
            title: None,
            description: Some(Cow::Owned(tool.description.clone())),
            input_schema: Arc::new(schema_map),
            output_schema: None,
            annotations: None,
            icons: None,
        }
    }

    fn server_info(protocol_version: ProtocolVersion) -> InitializeResult {
        InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ExpenseTracker".to_string(),
                version: env!("EXPENSE_MCP_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: None,
        }
    }
}

fn into_call_result(result: ToolResult) -> CallToolResult {
    let content = result
        .content
        .into_iter()
        .map(|c| match c {
            ToolContent::Text { text } => Content::text(text),
        })
        .collect();

    CallToolResult {
        content,
        is_error: result.is_error,
        meta: None,
        structured_content: result.structured_content,
    }
}

impl ServerHandler for ExpenseMcpHandler {
    async fn initialize(
        &self,
        request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        info!(
            "Initialize request received from {} with protocol version {}",
            request.client_info.name, request.protocol_version
        );

        if context.peer.peer_info().is_none() {
            context.peer.set_peer_info(request.clone());
        }

        let client_version = request.protocol_version.to_string();
        let protocol_version = match client_version.as_str() {
            "2025-06-18" => ProtocolVersion::V_2025_06_18,
            "2025-03-26" => ProtocolVersion::V_2025_03_26,
            "2024-11-05" => ProtocolVersion::V_2024_11_05,
            _ => {
                info!(
                    "Client requested unsupported version {}, using latest supported",
                    client_version
                );
                ProtocolVersion::LATEST
            }
        };

        Ok(Self::server_info(protocol_version))
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("List tools request received");

        Ok(ListToolsResult {
            tools: self.tools.iter().map(Self::convert_to_rmcp_tool).collect(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Call tool request received: {}", request.name);
        Ok(self.dispatch(&request.name, request.arguments).await)
    }

    fn get_info(&self) -> InitializeResult {
        Self::server_info(ProtocolVersion::LATEST)
    }
}

pub async fn run_server(handler: ExpenseMcpHandler) -> Result<()> {
    info!("Starting MCP server on stdio");

    use rmcp::ServiceExt;
    use rmcp::transport::stdio;

    let service = handler.serve(stdio()).await?;

    // Block until the client disconnects
    service.waiting().await?;

    Ok(())
}

pub async fn run_server_http(handler: ExpenseMcpHandler, port: u16) -> Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    };

    let service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting MCP server on http://{}/mcp", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn handler() -> ExpenseMcpHandler {
        ExpenseMcpHandler::new(ToolExecutor::new(Arc::new(MemoryStore::new())))
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[test]
    fn test_rmcp_tool_schema_shape() {
        let handler = handler();
        let tool = ExpenseMcpHandler::convert_to_rmcp_tool(&handler.tools()[1]);

        assert_eq!(tool.name, "list_expenses");
        assert_eq!(tool.input_schema.get("type"), Some(&json!("object")));
        assert_eq!(
            tool.input_schema.get("required"),
            Some(&json!(["start_date", "end_date"]))
        );
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_error_result() {
        let result = handler().dispatch("delete_expense", None).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_dispatch_bad_arguments_is_error_result() {
        let result = handler()
            .dispatch("list_expenses", args(json!({ "start_date": "2024-01-01" })))
            .await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_dispatch_add_returns_structured_status() {
        let result = handler()
            .dispatch(
                "add_expense",
                args(json!({ "date": "2024-01-01", "amount": 3.5, "category": "food" })),
            )
            .await;

        assert_ne!(result.is_error, Some(true));
        assert_eq!(
            result.structured_content,
            Some(json!({ "status": "ok", "id": 1 }))
        );
    }
}
