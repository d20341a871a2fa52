use serde::{Deserialize, Serialize};

/// A user account from the placeholder content API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
}
