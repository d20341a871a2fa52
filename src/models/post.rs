use serde::{Deserialize, Serialize};

/// A blog post from the placeholder content API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}
