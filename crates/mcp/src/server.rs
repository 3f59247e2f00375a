use serde_json::{json, Value};
use std::sync::Arc;

use sdlc_toolbox_core::{CallError, LogLevel, LogRecord, ToolContext, ToolRegistry};

use crate::transport::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// One MCP session over a shared set of tools.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    initialized: bool,
    log_level: LogLevel,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            initialized: false,
            log_level: LogLevel::Debug,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle one incoming message and return the outgoing messages in the
    /// order they must be sent: log notifications first, then the response.
    pub fn handle_request(&mut self, input: &str) -> Vec<String> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("unparseable message: {}", e);
                let resp = JsonRpcResponse::error(None, PARSE_ERROR, "Parse error");
                return vec![encode(&resp)];
            }
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return Vec::new();
        }

        if request.jsonrpc.as_deref() != Some("2.0") {
            let resp = JsonRpcResponse::error(request.id, INVALID_REQUEST, "Invalid Request");
            return vec![encode(&resp)];
        }

        tracing::debug!(method = %request.method, "handling request");

        let mut outgoing = Vec::new();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "ping" => JsonRpcResponse::success(request.id.clone(), json!({})),
            "tools/list" => self.handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(&request, &mut outgoing),
            "logging/setLevel" => self.handle_set_level(&request),
            _ => JsonRpcResponse::error(
                request.id.clone(),
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        outgoing.push(encode(&response));
        outgoing
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                tracing::info!(server = %self.registry.name(), "client initialized");
            }
            other => tracing::debug!(method = %other, "ignoring notification"),
        }
    }

    fn handle_initialize(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);

        let version = requested
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(PROTOCOL_VERSION);

        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": version,
                "capabilities": {
                    "tools": {},
                    "logging": {}
                },
                "serverInfo": {
                    "name": self.registry.name(),
                    "version": self.registry.version()
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .registry
            .descriptors()
            .map(|d| {
                json!({
                    "name": d.name,
                    "description": d.description,
                    "inputSchema": d.input_schema()
                })
            })
            .collect();

        JsonRpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    fn handle_tools_call(
        &self,
        request: &JsonRpcRequest,
        outgoing: &mut Vec<String>,
    ) -> JsonRpcResponse {
        let params = match &request.params {
            Some(p) => p,
            None => {
                return JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Missing params")
            }
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Missing tool name");
        };

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let mut ctx = ToolContext::with_min_level(name, self.log_level);
        let result = self.registry.call(name, arguments, &mut ctx);

        outgoing.extend(
            ctx.into_records()
                .into_iter()
                .map(|record| encode(&log_notification(name, record))),
        );

        match result {
            Ok(outcome) => JsonRpcResponse::success(request.id.clone(), outcome.to_call_result()),
            Err(CallError::UnknownTool(tool)) => JsonRpcResponse::error(
                request.id.clone(),
                METHOD_NOT_FOUND,
                format!("Unknown tool: {}", tool),
            ),
            Err(e @ CallError::InvalidArguments { .. }) => JsonRpcResponse::success(
                request.id.clone(),
                json!({
                    "content": [{
                        "type": "text",
                        "text": e.to_string()
                    }],
                    "isError": true
                }),
            ),
        }
    }

    fn handle_set_level(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let level = request
            .params
            .as_ref()
            .and_then(|p| p.get("level"))
            .and_then(Value::as_str)
            .and_then(LogLevel::parse);

        match level {
            Some(level) => {
                self.log_level = level;
                JsonRpcResponse::success(request.id.clone(), json!({}))
            }
            None => JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Invalid log level"),
        }
    }
}

fn log_notification(tool: &str, record: LogRecord) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "notifications/message",
        json!({
            "level": record.level,
            "logger": tool,
            "data": record.message
        }),
    )
}

fn encode<T: serde::Serialize>(message: &T) -> String {
    // Serializing these types cannot fail: every map key is a string.
    serde_json::to_string(message).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdlc_toolbox_core::{ParamDescriptor, ParamType, Tool, ToolDescriptor, ToolOutcome};

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new("Demo", "9.9.9");
        registry
            .register(Tool::new(
                ToolDescriptor::new("echo", "Echo a message").param(ParamDescriptor::required(
                    "message",
                    ParamType::String,
                    "What to echo",
                )),
                |args, ctx| {
                    ctx.debug("echoing");
                    ctx.info(format!("message is {} bytes", args.str("message").len()));
                    ToolOutcome::Text(args.str("message").to_string())
                },
            ))
            .unwrap();
        McpServer::new(Arc::new(registry))
    }

    fn call(server: &mut McpServer, body: Value) -> Vec<Value> {
        server
            .handle_request(&body.to_string())
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }

    #[test]
    fn initialize_negotiates_version() {
        let mut server = server();
        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 0, "method": "initialize",
                    "params": { "protocolVersion": "2025-03-26" } }),
        );
        assert_eq!(out[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(out[0]["result"]["serverInfo"]["name"], "Demo");

        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": { "protocolVersion": "1999-01-01" } }),
        );
        assert_eq!(out[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn initialized_notification_sets_state() {
        let mut server = server();
        let out = server.handle_request(
            &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        );
        assert!(out.is_empty());
        assert!(server.is_initialized());
    }

    #[test]
    fn call_emits_logs_before_response() {
        let mut server = server();
        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                    "params": { "name": "echo", "arguments": { "message": "hi" } } }),
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["method"], "notifications/message");
        assert_eq!(out[0]["params"]["level"], "debug");
        assert_eq!(out[0]["params"]["logger"], "echo");
        assert_eq!(out[1]["params"]["level"], "info");
        assert_eq!(out[2]["id"], 2);
        assert_eq!(out[2]["result"]["content"][0]["text"], "hi");
    }

    #[test]
    fn set_level_filters_context_logs() {
        let mut server = server();
        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "logging/setLevel",
                    "params": { "level": "info" } }),
        );
        assert_eq!(out[0]["result"], json!({}));

        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                    "params": { "name": "echo", "arguments": { "message": "hi" } } }),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["params"]["level"], "info");
    }

    #[test]
    fn invalid_arguments_are_a_tool_error() {
        let mut server = server();
        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call",
                    "params": { "name": "echo", "arguments": {} } }),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["result"]["isError"], true);
        assert!(out[0]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("missing required argument 'message'"));
    }

    #[test]
    fn unknown_tool_is_method_not_found() {
        let mut server = server();
        let out = call(
            &mut server,
            json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call",
                    "params": { "name": "nope" } }),
        );
        assert_eq!(out[0]["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn missing_version_is_invalid_request() {
        let mut server = server();
        let out = call(&mut server, json!({ "id": 7, "method": "ping" }));
        assert_eq!(out[0]["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn null_id_is_answered_with_null_id() {
        let mut server = server();
        let out = call(&mut server, json!({ "jsonrpc": "2.0", "id": null, "method": "ping" }));
        assert_eq!(out.len(), 1);
        assert!(out[0].get("id").is_some());
        assert_eq!(out[0]["id"], Value::Null);
        assert_eq!(out[0]["result"], json!({}));
    }
}
