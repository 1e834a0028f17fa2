use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incoming request line. Clients may send a `jsonrpc` member or other
/// extras; they are ignored. A missing `method` dispatches as the empty
/// string and falls out as an unknown method.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Responses are flat JSON objects, not an RPC envelope: the handler's
/// payload goes out as-is, with the request id merged in when one was given.
pub fn attach_id(mut response: Value, id: Option<Value>) -> Value {
    if let Some(id) = id {
        if let Some(obj) = response.as_object_mut() {
            obj.insert("id".to_string(), id);
        }
    }
    response
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}
