//! Shared handlers for CLI and MCP.

pub mod conversation;
pub mod reel;
