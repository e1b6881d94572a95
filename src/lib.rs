pub mod config;
pub mod expenses;
pub mod mcp;
pub mod store;
pub mod tools;

pub use config::Config;
pub use mcp::rmcp_server::{
    ExpenseMcpHandler, run_server as run_rmcp_server, run_server_http as run_rmcp_server_http,
};
pub use store::{ExpenseStore, MemoryStore, PostgrestStore};
pub use tools::ToolExecutor;
