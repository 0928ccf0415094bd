// MCP (Model Context Protocol) tool server for Fathom's upstream bridges

pub mod http;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
