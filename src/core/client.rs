//! Async client for the Obsidian Local REST API
//!
//! Every operation resolves to a [`VaultResponse`]: either the payload the
//! API returned or a structured `{status, statusText, data}` failure. The
//! client never surfaces transport errors as `Err`; callers render the
//! failure shape back to the MCP peer instead of aborting the request.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::core::config::ServerConfig;

const MARKDOWN: &str = "text/markdown";
const JSONLOGIC: &str = "application/vnd.olrapi.jsonlogic+json";
const DATAVIEW_DQL: &str = "application/vnd.olrapi.dataview.dql+txt";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Successful payload of a vault operation.
///
/// `Text` carries markdown bodies through verbatim; `Json` holds structured
/// responses, including the explicit `null` case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Json(Value),
}

/// The REST API's error shape, preserved field-for-field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultFailure {
    pub status: u16,
    pub status_text: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// Mirror of the REST response wrapper: at most one of `data`/`error` is
/// set, and bodiless success responses set neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VaultFailure>,
}

impl VaultResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: Some(Payload::Text(text.into())),
            error: None,
        }
    }

    pub fn json(value: Value) -> Self {
        Self {
            data: Some(Payload::Json(value)),
            error: None,
        }
    }

    /// A 2xx response with no body (e.g. `PUT /active/` answers 204).
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn failure(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            data: None,
            error: Some(VaultFailure {
                status,
                status_text: status_text.into(),
                data,
            }),
        }
    }

    /// Transport-level failures carry the original client's fallback shape:
    /// status 500, statusText "Error", message as detail.
    pub fn transport_failure(err: &reqwest::Error) -> Self {
        Self::failure(500, "Error", Value::String(err.to_string()))
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Periodic note granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::Yearly => "yearly",
        }
    }
}

/// How patch content is combined with the located target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    Append,
    Prepend,
    Replace,
}

impl PatchOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOperation::Append => "append",
            PatchOperation::Prepend => "prepend",
            PatchOperation::Replace => "replace",
        }
    }
}

/// What kind of document element a patch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatchTargetType {
    Heading,
    Block,
    Frontmatter,
}

impl PatchTargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchTargetType::Heading => "heading",
            PatchTargetType::Block => "block",
            PatchTargetType::Frontmatter => "frontmatter",
        }
    }
}

/// Structured-search query dialects accepted by `POST /search/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    Jsonlogic,
    Dataview,
}

/// Shared parameter contract of every patch tool.
///
/// On the wire these become instruction headers next to a raw markdown
/// body; the REST API distinguishes directive metadata from payload bytes.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchSpec {
    /// Whether to append, prepend, or replace relative to the target
    #[schemars(description = "Patch operation: append, prepend, or replace")]
    pub operation: PatchOperation,
    /// Kind of element the target names
    #[schemars(description = "Target type: heading, block, or frontmatter")]
    pub target_type: PatchTargetType,
    /// Target identifier (e.g. a heading path or block reference)
    #[schemars(description = "Target to patch (heading path, block reference, or frontmatter field)")]
    pub target: String,
    /// Content to insert
    #[schemars(description = "Content to insert")]
    pub content: String,
    /// Delimiter between nested heading levels (default "::")
    #[schemars(description = "Delimiter for nested heading targets (default '::')")]
    #[serde(default)]
    pub target_delimiter: Option<String>,
    /// Trim whitespace around the located target before matching
    #[schemars(description = "Trim whitespace around the target before matching")]
    #[serde(default)]
    pub trim_target_whitespace: Option<bool>,
}

/// What a 2xx body should be read as.
enum Expect {
    Text,
    Json,
    Empty,
}

/// HTTP client for the Obsidian Local REST API.
///
/// Holds the bearer credential in a default header and accepts the API's
/// self-signed certificate. No per-call timeout is imposed.
pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
}

impl VaultClient {
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ClientError::InvalidApiKey)?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    // Status

    pub async fn get_status(&self) -> VaultResponse {
        self.dispatch(self.request(Method::GET, "/"), Expect::Json)
            .await
    }

    // Active file

    pub async fn get_active_file(&self) -> VaultResponse {
        self.dispatch(self.request(Method::GET, "/active/"), Expect::Text)
            .await
    }

    pub async fn update_active_file(&self, content: &str) -> VaultResponse {
        self.dispatch(self.markdown_body(Method::PUT, "/active/", content), Expect::Empty)
            .await
    }

    pub async fn append_to_active_file(&self, content: &str) -> VaultResponse {
        self.dispatch(self.markdown_body(Method::POST, "/active/", content), Expect::Empty)
            .await
    }

    pub async fn delete_active_file(&self) -> VaultResponse {
        self.dispatch(self.request(Method::DELETE, "/active/"), Expect::Empty)
            .await
    }

    // Vault files

    pub async fn get_file(&self, filename: &str) -> VaultResponse {
        self.dispatch(self.request(Method::GET, &vault_path(filename)), Expect::Text)
            .await
    }

    pub async fn create_or_update_file(&self, filename: &str, content: &str) -> VaultResponse {
        self.dispatch(
            self.markdown_body(Method::PUT, &vault_path(filename), content),
            Expect::Empty,
        )
        .await
    }

    pub async fn append_to_file(&self, filename: &str, content: &str) -> VaultResponse {
        self.dispatch(
            self.markdown_body(Method::POST, &vault_path(filename), content),
            Expect::Empty,
        )
        .await
    }

    pub async fn delete_file(&self, filename: &str) -> VaultResponse {
        self.dispatch(self.request(Method::DELETE, &vault_path(filename)), Expect::Empty)
            .await
    }

    pub async fn patch_file(&self, filename: &str, patch: &PatchSpec) -> VaultResponse {
        self.dispatch(self.patch_request(&vault_path(filename), patch), Expect::Text)
            .await
    }

    // Directories

    pub async fn list_directory(&self, path: &str) -> VaultResponse {
        let endpoint = if path.is_empty() {
            "/vault/".to_string()
        } else {
            format!("/vault/{}/", encode_path(path.trim_end_matches('/')))
        };
        self.dispatch(self.request(Method::GET, &endpoint), Expect::Json)
            .await
    }

    // Search

    pub async fn search(&self, query: &str, context_length: u32) -> VaultResponse {
        let request = self
            .request(Method::POST, "/search/simple/")
            .query(&[("query", query.to_string()), ("contextLength", context_length.to_string())]);
        self.dispatch(request, Expect::Json).await
    }

    pub async fn search_complex(&self, query: &Value, format: QueryFormat) -> VaultResponse {
        let request = match format {
            QueryFormat::Jsonlogic => self
                .request(Method::POST, "/search/")
                .header(CONTENT_TYPE, JSONLOGIC)
                .body(query.to_string()),
            QueryFormat::Dataview => {
                // DQL queries are raw text, not JSON-encoded strings.
                let Some(dql) = query.as_str() else {
                    return VaultResponse::failure(
                        400,
                        "Bad Request",
                        Value::String("query must be a string when queryFormat is 'dataview'".into()),
                    );
                };
                self.request(Method::POST, "/search/")
                    .header(CONTENT_TYPE, DATAVIEW_DQL)
                    .body(dql.to_string())
            }
        };
        self.dispatch(request, Expect::Json).await
    }

    // Documents and commands

    pub async fn open_document(&self, filename: &str, new_leaf: bool) -> VaultResponse {
        let request = self
            .request(Method::POST, &format!("/open/{}", encode_path(filename)))
            .query(&[("newLeaf", new_leaf.to_string())]);
        self.dispatch(request, Expect::Empty).await
    }

    pub async fn get_commands(&self) -> VaultResponse {
        self.dispatch(self.request(Method::GET, "/commands/"), Expect::Json)
            .await
    }

    pub async fn execute_command(&self, command_id: &str) -> VaultResponse {
        let endpoint = format!("/commands/{}/", encode_path(command_id));
        self.dispatch(self.request(Method::POST, &endpoint), Expect::Empty)
            .await
    }

    // Periodic notes

    pub async fn get_periodic_note(&self, period: Period) -> VaultResponse {
        self.dispatch(self.request(Method::GET, &periodic_path(period)), Expect::Text)
            .await
    }

    pub async fn update_periodic_note(&self, period: Period, content: &str) -> VaultResponse {
        self.dispatch(
            self.markdown_body(Method::PUT, &periodic_path(period), content),
            Expect::Empty,
        )
        .await
    }

    pub async fn append_to_periodic_note(&self, period: Period, content: &str) -> VaultResponse {
        self.dispatch(
            self.markdown_body(Method::POST, &periodic_path(period), content),
            Expect::Empty,
        )
        .await
    }

    pub async fn delete_periodic_note(&self, period: Period) -> VaultResponse {
        self.dispatch(self.request(Method::DELETE, &periodic_path(period)), Expect::Empty)
            .await
    }

    pub async fn patch_periodic_note(&self, period: Period, patch: &PatchSpec) -> VaultResponse {
        self.dispatch(self.patch_request(&periodic_path(period), patch), Expect::Text)
            .await
    }

    // Request plumbing

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn markdown_body(&self, method: Method, path: &str, content: &str) -> RequestBuilder {
        self.request(method, path)
            .header(CONTENT_TYPE, MARKDOWN)
            .body(content.to_string())
    }

    fn patch_request(&self, path: &str, patch: &PatchSpec) -> RequestBuilder {
        let mut request = self
            .request(Method::PATCH, path)
            .header(CONTENT_TYPE, MARKDOWN)
            .header("Operation", patch.operation.as_str())
            .header("Target-Type", patch.target_type.as_str())
            .header("Target", encode_directive(&patch.target));
        if let Some(delimiter) = &patch.target_delimiter {
            request = request.header("Target-Delimiter", encode_directive(delimiter));
        }
        if let Some(trim) = patch.trim_target_whitespace {
            request = request.header("Trim-Target-Whitespace", if trim { "true" } else { "false" });
        }
        request.body(patch.content.clone())
    }

    async fn dispatch(&self, request: RequestBuilder, expect: Expect) -> VaultResponse {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "vault request failed before a response arrived");
                return VaultResponse::transport_failure(&err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Self::error_response(status, response).await;
        }

        match expect {
            Expect::Empty => VaultResponse::empty(),
            Expect::Text => match response.text().await {
                Ok(text) => VaultResponse::text(text),
                Err(err) => VaultResponse::transport_failure(&err),
            },
            Expect::Json => match response.text().await {
                Ok(body) => match serde_json::from_str(&body) {
                    Ok(value) => VaultResponse::json(value),
                    Err(err) => VaultResponse::failure(
                        500,
                        "Error",
                        Value::String(format!("invalid JSON body: {err}")),
                    ),
                },
                Err(err) => VaultResponse::transport_failure(&err),
            },
        }
    }

    async fn error_response(status: StatusCode, response: reqwest::Response) -> VaultResponse {
        let status_text = status.canonical_reason().unwrap_or("Error").to_string();
        let body = response.text().await.unwrap_or_default();
        let detail = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        VaultResponse::failure(status.as_u16(), status_text, detail)
    }
}

fn vault_path(filename: &str) -> String {
    format!("/vault/{}", encode_path(filename))
}

fn periodic_path(period: Period) -> String {
    format!("/periodic/{}/", period.as_str())
}

/// Percent-encode a vault-relative path, keeping `/` separators intact so
/// nested note paths address the right endpoint.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if is_path_safe(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

// RFC 3986 pchar set, minus the percent escape itself.
fn is_path_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_'
                | b'.'
                | b'~'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b':'
                | b'@'
        )
}

/// Encode a patch directive for transport in a header. The REST API
/// URL-decodes directive headers, so `%` and anything outside visible
/// ASCII must be escaped here.
fn encode_directive(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'%' => out.push_str("%25"),
            0x21..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_wrapper_serializes_with_the_rest_field_names() {
        let response = VaultResponse::failure(404, "Not Found", json!({"errorCode": 40401}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "error": {
                    "status": 404,
                    "statusText": "Not Found",
                    "data": {"errorCode": 40401}
                }
            })
        );
    }

    #[test]
    fn empty_response_serializes_to_an_empty_object() {
        let value = serde_json::to_value(VaultResponse::empty()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn text_payload_serializes_untagged() {
        let value = serde_json::to_value(VaultResponse::text("# Heading")).unwrap();
        assert_eq!(value, json!({"data": "# Heading"}));
    }

    #[test]
    fn path_encoding_keeps_separators_and_escapes_spaces() {
        assert_eq!(encode_path("Daily Notes/2025-01-01.md"), "Daily%20Notes/2025-01-01.md");
        assert_eq!(encode_path("notes/휴가.md"), "notes/%ED%9C%B4%EA%B0%80.md");
        assert_eq!(encode_path("plain.md"), "plain.md");
    }

    #[test]
    fn directive_encoding_escapes_percent_and_non_ascii() {
        assert_eq!(encode_directive("Heading::Sub"), "Heading::Sub");
        assert_eq!(encode_directive("100% done"), "100%25%20done");
        assert_eq!(encode_directive("메모"), "%EB%A9%94%EB%AA%A8");
    }

    #[test]
    fn period_and_patch_enums_reject_unknown_values() {
        assert!(serde_json::from_value::<Period>(json!("hourly")).is_err());
        assert!(serde_json::from_value::<PatchOperation>(json!("splice")).is_err());
        assert!(serde_json::from_value::<PatchTargetType>(json!("paragraph")).is_err());
        assert_eq!(
            serde_json::from_value::<Period>(json!("weekly")).unwrap(),
            Period::Weekly
        );
    }

    #[test]
    fn patch_spec_uses_camel_case_wire_names() {
        let patch: PatchSpec = serde_json::from_value(json!({
            "operation": "replace",
            "targetType": "heading",
            "target": "Projects::Active",
            "content": "- new item",
            "trimTargetWhitespace": true
        }))
        .unwrap();
        assert_eq!(patch.operation, PatchOperation::Replace);
        assert_eq!(patch.target_type, PatchTargetType::Heading);
        assert_eq!(patch.trim_target_whitespace, Some(true));
        assert_eq!(patch.target_delimiter, None);
    }
}
