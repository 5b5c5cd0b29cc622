//! Parameter structures for MCP tools

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::core::client::{PatchSpec, Period, QueryFormat};

/// Parameters for tools that write to the active file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContentParams {
    /// Markdown content, passed through verbatim
    #[schemars(description = "Content for the file")]
    pub content: String,
}

/// Parameters for tools addressing one vault file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileParams {
    /// Vault-relative path
    #[schemars(description = "Path to the file (relative to vault root)")]
    pub filename: String,
}

/// Parameters for tools writing to one vault file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileContentParams {
    /// Vault-relative path
    #[schemars(description = "Path to the file (relative to vault root)")]
    pub filename: String,
    /// Markdown content, passed through verbatim
    #[schemars(description = "Content for the file")]
    pub content: String,
}

/// Parameters for obsidian_patch_file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchFileParams {
    /// Vault-relative path
    #[schemars(description = "Path to the file (relative to vault root)")]
    pub filename: String,
    #[serde(flatten)]
    pub patch: PatchSpec,
}

/// Parameters for obsidian_list_files
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Directory to list; empty means the vault root
    #[schemars(description = "Path to list (relative to vault root)")]
    #[serde(default)]
    pub path: String,
}

/// Parameters for obsidian_search
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Full-text query
    #[schemars(description = "Search query")]
    pub query: String,
    /// Characters of context to include around each match (default: 100)
    #[schemars(description = "How much context to include around matches (default: 100)")]
    #[serde(default = "default_context_length")]
    pub context_length: u32,
}

pub fn default_context_length() -> u32 {
    100
}

/// Parameters for obsidian_complex_search
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplexSearchParams {
    /// JsonLogic expression, or a Dataview DQL string
    #[schemars(description = "Structured query: a JsonLogic object, or a Dataview DQL string")]
    pub query: Value,
    /// Query dialect: jsonlogic or dataview
    #[schemars(description = "Query format: 'jsonlogic' or 'dataview'")]
    pub query_format: QueryFormat,
}

/// Parameters for obsidian_open_document
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenDocumentParams {
    /// Vault-relative path
    #[schemars(description = "Path to the file (relative to vault root)")]
    pub filename: String,
    /// Open in a new leaf instead of reusing the current one
    #[schemars(description = "Whether to open in a new leaf")]
    #[serde(default)]
    pub new_leaf: bool,
}

/// Parameters for obsidian_execute_command
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommandParams {
    /// Obsidian command identifier, as listed by obsidian_list_commands
    #[schemars(description = "ID of the command to execute")]
    pub command_id: String,
}

/// Parameters for tools addressing one periodic note
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PeriodicNoteParams {
    /// Periodic note granularity
    #[schemars(description = "Period: daily, weekly, monthly, quarterly, or yearly")]
    pub period: Period,
}

/// Parameters for tools writing to one periodic note
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PeriodicContentParams {
    /// Periodic note granularity
    #[schemars(description = "Period: daily, weekly, monthly, quarterly, or yearly")]
    pub period: Period,
    /// Markdown content, passed through verbatim
    #[schemars(description = "Content for the note")]
    pub content: String,
}

/// Parameters for obsidian_patch_periodic_note
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchPeriodicNoteParams {
    /// Periodic note granularity
    #[schemars(description = "Period: daily, weekly, monthly, quarterly, or yearly")]
    pub period: Period,
    #[serde(flatten)]
    pub patch: PatchSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_names_the_field() {
        let err = serde_json::from_value::<FileParams>(json!({})).unwrap_err();
        assert!(err.to_string().contains("filename"), "got: {err}");

        let err = serde_json::from_value::<ContentParams>(json!({})).unwrap_err();
        assert!(err.to_string().contains("content"), "got: {err}");

        let err = serde_json::from_value::<ExecuteCommandParams>(json!({})).unwrap_err();
        assert!(err.to_string().contains("commandId"), "got: {err}");
    }

    #[test]
    fn list_files_path_defaults_to_vault_root() {
        let params: ListFilesParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.path, "");
    }

    #[test]
    fn search_context_length_defaults_to_100() {
        let params: SearchParams = serde_json::from_value(json!({"query": "meeting"})).unwrap();
        assert_eq!(params.context_length, 100);

        let params: SearchParams =
            serde_json::from_value(json!({"query": "meeting", "contextLength": 20})).unwrap();
        assert_eq!(params.context_length, 20);
    }

    #[test]
    fn open_document_new_leaf_defaults_to_false() {
        let params: OpenDocumentParams =
            serde_json::from_value(json!({"filename": "Inbox.md"})).unwrap();
        assert!(!params.new_leaf);
    }

    #[test]
    fn patch_params_flatten_the_shared_contract() {
        let params: PatchFileParams = serde_json::from_value(json!({
            "filename": "Projects.md",
            "operation": "append",
            "targetType": "heading",
            "target": "Backlog",
            "content": "- follow up"
        }))
        .unwrap();
        assert_eq!(params.patch.target, "Backlog");

        let err = serde_json::from_value::<PatchPeriodicNoteParams>(json!({
            "period": "daily",
            "operation": "insert",
            "targetType": "heading",
            "target": "Log",
            "content": "x"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("operation") || err.to_string().contains("variant"));
    }

    #[test]
    fn query_format_membership_is_enforced() {
        let err = serde_json::from_value::<ComplexSearchParams>(json!({
            "query": "TABLE file.name",
            "queryFormat": "sql"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("variant") || err.to_string().contains("queryFormat"));
    }
}
