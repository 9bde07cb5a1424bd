//! MCP Server implementation for the gig marketplace.

use rmcp::{
    ServerHandler, tool, tool_handler, tool_router,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{self, Overrides};
use crate::handlers::{conversation, reel};

/// MCP Server for marketplace operations.
#[derive(Clone)]
pub struct MarketMcpServer {
    overrides: Overrides,
    tool_router: ToolRouter<Self>,
}

impl MarketMcpServer {
    pub fn new(overrides: Overrides) -> Self {
        Self {
            overrides,
            tool_router: Self::tool_router(),
        }
    }

    fn build_client(&self) -> Result<gigmarket::MarketClient, McpError> {
        config::build_client(&self.overrides)
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    fn build_authed_client(&self) -> Result<gigmarket::MarketClient, McpError> {
        config::build_authed_client(&self.overrides)
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
        serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    fn ok(text: String) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

/// Bad input is the caller's fault; everything else is ours.
fn api_error(e: anyhow::Error) -> McpError {
    match e.downcast_ref::<gigmarket::Error>() {
        Some(gigmarket::Error::InvalidArgument(msg)) => McpError::invalid_params(msg.clone(), None),
        _ => McpError::internal_error(e.to_string(), None),
    }
}

// Parameter structs
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReelFeedParams {
    /// Reels per page, 10-50 (default: 20)
    #[serde(default = "default_reel_limit")]
    pub limit: u32,
    /// Number of pages to walk from the newest reel (default: 1)
    #[serde(default = "default_page")]
    pub pages: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConversationMessagesParams {
    /// Conversation ID
    pub conversation_id: String,
    /// Page number, 1 is newest (default: 1)
    #[serde(default = "default_page")]
    pub page: u32,
    /// Messages per page, at most 50 (default: 50)
    #[serde(default = "default_message_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MessageSendParams {
    /// Conversation ID
    pub conversation_id: String,
    /// Message text, at most 2000 characters
    pub text: String,
}

fn default_page() -> u32 { 1 }
fn default_reel_limit() -> u32 { 20 }
fn default_message_limit() -> u32 { 50 }

#[tool_router]
impl MarketMcpServer {
    #[tool(description = "List the newest freelancer reels")]
    async fn reel_feed(&self, params: Parameters<ReelFeedParams>) -> Result<CallToolResult, McpError> {
        let client = self.build_client()?;
        let result = reel::fetch_feed(&client, params.0.limit, params.0.pages)
            .await
            .map_err(api_error)?;
        Self::ok(Self::to_json(&result)?)
    }

    #[tool(description = "List your conversations (requires authentication)")]
    async fn conversation_list(&self) -> Result<CallToolResult, McpError> {
        let client = self.build_authed_client()?;
        let conversations = conversation::list(&client).await.map_err(api_error)?;
        Self::ok(Self::to_json(&conversations)?)
    }

    #[tool(description = "Read one page of a conversation, oldest message first (requires authentication)")]
    async fn conversation_messages(&self, params: Parameters<ConversationMessagesParams>) -> Result<CallToolResult, McpError> {
        let client = self.build_authed_client()?;
        let p = params.0;
        let result = conversation::messages(&client, &p.conversation_id, p.page, p.limit)
            .await
            .map_err(api_error)?;
        Self::ok(Self::to_json(&result)?)
    }

    #[tool(description = "Send a message to a conversation (requires authentication)")]
    async fn message_send(&self, params: Parameters<MessageSendParams>) -> Result<CallToolResult, McpError> {
        let client = self.build_authed_client()?;
        let message = conversation::send(&client, &params.0.conversation_id, &params.0.text)
            .await
            .map_err(api_error)?;
        Self::ok(format!("Message sent (message ID: {})", message.id))
    }
}

#[tool_handler]
impl ServerHandler for MarketMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "gigm-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }
}

/// Run the MCP Server.
pub async fn run_server(overrides: Overrides) -> anyhow::Result<()> {
    use rmcp::transport::io::stdio;

    tracing::info!("Starting gigm MCP server");

    let server = MarketMcpServer::new(overrides);
    let service = rmcp::serve_server(server, stdio()).await?;

    tracing::info!("gigm MCP server ready");
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params: ReelFeedParams = serde_json::from_str("{}").unwrap();
        assert_eq!((params.limit, params.pages), (20, 1));

        let params: ConversationMessagesParams =
            serde_json::from_str(r#"{"conversation_id": "c1"}"#).unwrap();
        assert_eq!((params.page, params.limit), (1, 50));
    }

    #[test]
    fn test_invalid_argument_maps_to_invalid_params() {
        let err = api_error(gigmarket::Error::InvalidArgument("too long".into()).into());
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = api_error(anyhow::anyhow!("boom"));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}
