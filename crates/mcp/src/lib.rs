// MCP (Model Context Protocol) server relaying tool calls to the BugRelay API

pub mod config;
pub mod framing;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::RelayArgs;
pub use server::{McpServer, ServerError};
