use serde::{Deserialize, Serialize};

/// Id used for collection tags, so that an empty list is still
/// invalidatable by writes against the collection.
pub const LIST_ID: &str = "LIST";

/// Invalidation tag: a logical resource (`kind` + id) or a resource
/// collection (`kind` alone, or `kind` + `LIST`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub kind: String,
    pub id: Option<String>,
}

impl Tag {
    /// Tag covering every entry of a kind, e.g. `Vacancies`.
    pub fn of(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: None,
        }
    }

    /// Collection tag, e.g. `{Posts, LIST}`.
    pub fn list(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: Some(LIST_ID.to_string()),
        }
    }

    /// Per-resource tag, e.g. `{Posts, 42}`.
    pub fn id(kind: &str, id: impl ToString) -> Self {
        Self {
            kind: kind.to_string(),
            id: Some(id.to_string()),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_id_tags_differ() {
        assert_ne!(Tag::list("Posts"), Tag::id("Posts", 1));
        assert_eq!(Tag::id("Posts", 1), Tag::id("Posts", "1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tag::of("Vacancies").to_string(), "Vacancies");
        assert_eq!(Tag::id("Vacancy", "42").to_string(), "Vacancy/42");
    }
}
