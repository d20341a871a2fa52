use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;

/// Cache key: endpoint name plus canonically serialized arguments.
///
/// serde_json's default map is a BTreeMap, so object keys serialize in
/// sorted order at every nesting level and two argument objects that
/// differ only in insertion order produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    pub endpoint: String,
    pub args: String,
}

impl QueryKey {
    pub fn new(endpoint: &str, args: &Value) -> Result<Self, ApiError> {
        let serialized = serde_json::to_string(args)
            .map_err(|e| ApiError::InvalidArgs(format!("{}: {}", endpoint, e)))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            args: serialized,
        })
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}
