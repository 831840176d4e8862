//! aria2 JSON-RPC wire types
//!
//! See: https://aria2.github.io/manual/en/html/aria2c.html#rpc-interface

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const ADD_URI_METHOD: &str = "aria2.addUri";

/// A JSON-RPC 2.0 request with positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    /// Build an `aria2.addUri` call for a single URI.
    ///
    /// Params are `[uris, options]`, preceded by `"token:<secret>"` when the
    /// daemon runs with `--rpc-secret`.
    pub fn add_uri(id: u64, uri: &str, options: Map<String, Value>, secret: Option<&str>) -> Self {
        let mut params = Vec::with_capacity(3);
        if let Some(secret) = secret {
            params.push(Value::String(format!("token:{}", secret)));
        }
        params.push(Value::Array(vec![Value::String(uri.to_string())]));
        params.push(Value::Object(options));

        Self {
            jsonrpc: JSONRPC_VERSION,
            method: ADD_URI_METHOD,
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,

    #[serde(default)]
    pub result: Option<Value>,

    #[serde(default)]
    pub error: Option<RpcError>,

    /// Echo of the request id; `null` when the server could not parse the request
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcResponse {
    /// Whether the response echoes `id`, as a number or its decimal string.
    pub fn answers(&self, id: u64) -> bool {
        match &self.id {
            Some(Value::Number(n)) => n.as_u64() == Some(id),
            Some(Value::String(s)) => s == &id.to_string(),
            _ => false,
        }
    }

    /// Printable form of the echoed id
    pub fn id_display(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "null".to_string(),
        }
    }

    /// GID aria2 assigned to the new download.
    pub fn gid(&self) -> Option<String> {
        match &self.result {
            Some(Value::String(gid)) => Some(gid.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Structured JSON-RPC error
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_uri_serialization() {
        let mut options = Map::new();
        options.insert("split".to_string(), json!("4"));
        options.insert("dir".to_string(), json!("/dl/docs"));

        let request = RpcRequest::add_uri(1000, "http://x/a.txt", options, None);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "aria2.addUri",
                "params": [["http://x/a.txt"], {"split": "4", "dir": "/dl/docs"}],
                "id": 1000
            })
        );
    }

    #[test]
    fn test_add_uri_with_secret() {
        let request = RpcRequest::add_uri(7, "http://x/a", Map::new(), Some("s3cret"));

        assert_eq!(request.params.len(), 3);
        assert_eq!(request.params[0], json!("token:s3cret"));
        assert_eq!(request.params[1], json!(["http://x/a"]));
    }

    #[test]
    fn test_success_response() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":"2089b05ecca3d829","id":1000}"#)
                .unwrap();

        assert!(response.error.is_none());
        assert!(response.answers(1000));
        assert!(!response.answers(1001));
        assert_eq!(response.gid().as_deref(), Some("2089b05ecca3d829"));
    }

    #[test]
    fn test_error_response() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":1,"message":"Unauthorized"},"id":"1001"}"#,
        )
        .unwrap();

        assert_eq!(
            response.error,
            Some(RpcError {
                code: 1,
                message: "Unauthorized".to_string()
            })
        );
        assert!(response.answers(1001));
        assert!(response.gid().is_none());
    }

    #[test]
    fn test_null_id() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error."},"id":null}"#,
        )
        .unwrap();

        assert!(!response.answers(1000));
        assert_eq!(response.id_display(), "null");
    }
}
