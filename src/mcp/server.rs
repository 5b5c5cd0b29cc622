//! Obsidian MCP service: the tool catalog and its handlers

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use crate::core::client::VaultClient;
use crate::mcp::format::tool_response;
use crate::mcp::params::{
    ComplexSearchParams, ContentParams, ExecuteCommandParams, FileContentParams, FileParams,
    ListFilesParams, OpenDocumentParams, PatchFileParams, PatchPeriodicNoteParams,
    PeriodicContentParams, PeriodicNoteParams, SearchParams,
};

/// The MCP-facing service. Owns the vault client and the tool router; both
/// are immutable after construction and shared read-only by every session.
#[derive(Clone)]
pub struct ObsidianService {
    vault: Arc<VaultClient>,
    tool_router: ToolRouter<Self>,
}

impl ObsidianService {
    pub fn new(vault: VaultClient) -> Self {
        Self {
            vault: Arc::new(vault),
            tool_router: Self::tool_router(),
        }
    }

    /// The registered catalog, for the `tools` CLI command.
    pub fn catalog() -> Vec<rmcp::model::Tool> {
        Self::tool_router().list_all()
    }
}

#[tool_router]
impl ObsidianService {
    #[tool(description = "Get status information from Obsidian")]
    async fn obsidian_get_status(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.get_status().await))
    }

    // Active file

    #[tool(description = "Get content of the currently active file in Obsidian")]
    async fn obsidian_get_active_file(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.get_active_file().await))
    }

    #[tool(description = "Update the content of the currently active file in Obsidian")]
    async fn obsidian_update_active_file(
        &self,
        params: Parameters<ContentParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.update_active_file(&params.0.content).await))
    }

    #[tool(description = "Append content to the currently active file in Obsidian")]
    async fn obsidian_append_to_active_file(
        &self,
        params: Parameters<ContentParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.append_to_active_file(&params.0.content).await))
    }

    #[tool(description = "Delete the currently active file in Obsidian")]
    async fn obsidian_delete_active_file(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.delete_active_file().await))
    }

    // Vault files

    #[tool(description = "Get content of a file")]
    async fn obsidian_get_file(
        &self,
        params: Parameters<FileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.get_file(&params.0.filename).await))
    }

    #[tool(description = "Create a new file or update an existing one")]
    async fn obsidian_create_or_update_file(
        &self,
        params: Parameters<FileContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let FileContentParams { filename, content } = params.0;
        Ok(tool_response(&self.vault.create_or_update_file(&filename, &content).await))
    }

    #[tool(description = "Append content to a file")]
    async fn obsidian_append_to_file(
        &self,
        params: Parameters<FileContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let FileContentParams { filename, content } = params.0;
        Ok(tool_response(&self.vault.append_to_file(&filename, &content).await))
    }

    #[tool(description = "Delete a file")]
    async fn obsidian_delete_file(
        &self,
        params: Parameters<FileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.delete_file(&params.0.filename).await))
    }

    #[tool(description = "Patch a file: insert content relative to a heading, block reference, or frontmatter field")]
    async fn obsidian_patch_file(
        &self,
        params: Parameters<PatchFileParams>,
    ) -> Result<CallToolResult, McpError> {
        let PatchFileParams { filename, patch } = params.0;
        Ok(tool_response(&self.vault.patch_file(&filename, &patch).await))
    }

    #[tool(description = "List files in a directory")]
    async fn obsidian_list_files(
        &self,
        params: Parameters<ListFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.list_directory(&params.0.path).await))
    }

    // Search

    #[tool(description = "Search for content in vault")]
    async fn obsidian_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let SearchParams { query, context_length } = params.0;
        Ok(tool_response(&self.vault.search(&query, context_length).await))
    }

    #[tool(description = "Search the vault with a structured query: a JsonLogic expression or a Dataview DQL string")]
    async fn obsidian_complex_search(
        &self,
        params: Parameters<ComplexSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let ComplexSearchParams { query, query_format } = params.0;
        Ok(tool_response(&self.vault.search_complex(&query, query_format).await))
    }

    // Documents and commands

    #[tool(description = "Open a document in Obsidian")]
    async fn obsidian_open_document(
        &self,
        params: Parameters<OpenDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let OpenDocumentParams { filename, new_leaf } = params.0;
        Ok(tool_response(&self.vault.open_document(&filename, new_leaf).await))
    }

    #[tool(description = "List available commands in Obsidian")]
    async fn obsidian_list_commands(&self) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.get_commands().await))
    }

    #[tool(description = "Execute a command in Obsidian")]
    async fn obsidian_execute_command(
        &self,
        params: Parameters<ExecuteCommandParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.execute_command(&params.0.command_id).await))
    }

    // Periodic notes

    #[tool(description = "Get content of a periodic note (daily, weekly, monthly, quarterly, or yearly)")]
    async fn obsidian_get_periodic_note(
        &self,
        params: Parameters<PeriodicNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.get_periodic_note(params.0.period).await))
    }

    #[tool(description = "Update the content of a periodic note")]
    async fn obsidian_update_periodic_note(
        &self,
        params: Parameters<PeriodicContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let PeriodicContentParams { period, content } = params.0;
        Ok(tool_response(&self.vault.update_periodic_note(period, &content).await))
    }

    #[tool(description = "Append content to a periodic note")]
    async fn obsidian_append_to_periodic_note(
        &self,
        params: Parameters<PeriodicContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let PeriodicContentParams { period, content } = params.0;
        Ok(tool_response(&self.vault.append_to_periodic_note(period, &content).await))
    }

    #[tool(description = "Delete a periodic note")]
    async fn obsidian_delete_periodic_note(
        &self,
        params: Parameters<PeriodicNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_response(&self.vault.delete_periodic_note(params.0.period).await))
    }

    #[tool(description = "Patch a periodic note: insert content relative to a heading, block reference, or frontmatter field")]
    async fn obsidian_patch_periodic_note(
        &self,
        params: Parameters<PatchPeriodicNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        let PatchPeriodicNoteParams { period, patch } = params.0;
        Ok(tool_response(&self.vault.patch_periodic_note(period, &patch).await))
    }
}

#[tool_handler]
impl ServerHandler for ObsidianService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Obsidian MCP server. Read, write, search, and command an Obsidian vault through the Local REST API.".to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
