use serde::Deserialize;
use serde_json::Value;

/// Envelope returned by the query endpoint. `result` is required: a body
/// without it is a malformed response, while `"result": null` is a valid
/// empty lookup.
#[derive(Deserialize, Debug)]
pub struct QueryResponse {
    pub result: Value,
    #[serde(default)]
    pub ms: Option<u64>,
}
