//! Declarative endpoint registry.
//!
//! Every endpoint registers once at construction time with:
//! - a request builder `fn(&args) -> RequestDescriptor`
//! - for queries: a pure `provides` function deriving invalidation tags
//!   from `(result, args)`, plus an optional response transform and an
//!   optional idle-retention override
//! - for mutations: a pure `invalidates` function declaring which tags
//!   go stale after the write succeeds
//!
//! The cache consults the registry by name and never hardcodes URLs or
//! tag logic itself.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_json::Value;

use crate::api::{ApiError, RequestDescriptor};
use crate::cache::Tag;
use crate::config::Config;

pub mod hh;
pub mod jobs;
pub mod posts;
pub mod users;

type BuildFn = Box<dyn Fn(&Value) -> Result<RequestDescriptor, ApiError> + Send + Sync>;
type TagsFn = Box<dyn Fn(&Value, &Value) -> HashSet<Tag> + Send + Sync>;
type TransformFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

pub struct QueryEndpoint {
    pub name: &'static str,
    build: BuildFn,
    provides: TagsFn,
    transform: Option<TransformFn>,
    /// Per-endpoint override of the cache-wide idle retention.
    pub keep_unused_for: Option<Duration>,
}

impl QueryEndpoint {
    pub fn new(
        name: &'static str,
        build: impl Fn(&Value) -> Result<RequestDescriptor, ApiError> + Send + Sync + 'static,
        provides: impl Fn(&Value, &Value) -> HashSet<Tag> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            build: Box::new(build),
            provides: Box::new(provides),
            transform: None,
            keep_unused_for: None,
        }
    }

    pub fn with_keep_unused(mut self, keep: Duration) -> Self {
        self.keep_unused_for = Some(keep);
        self
    }

    pub fn with_transform(
        mut self,
        transform: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn request(&self, args: &Value) -> Result<RequestDescriptor, ApiError> {
        (self.build)(args)
    }

    pub fn tags(&self, result: &Value, args: &Value) -> HashSet<Tag> {
        (self.provides)(result, args)
    }

    /// Normalize a raw response before it is cached.
    pub fn apply_transform(&self, raw: Value) -> Value {
        match &self.transform {
            Some(transform) => transform(raw),
            None => raw,
        }
    }
}

pub struct MutationEndpoint {
    pub name: &'static str,
    build: BuildFn,
    invalidates: TagsFn,
}

impl MutationEndpoint {
    pub fn new(
        name: &'static str,
        build: impl Fn(&Value) -> Result<RequestDescriptor, ApiError> + Send + Sync + 'static,
        invalidates: impl Fn(&Value, &Value) -> HashSet<Tag> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            build: Box::new(build),
            invalidates: Box::new(invalidates),
        }
    }

    pub fn request(&self, args: &Value) -> Result<RequestDescriptor, ApiError> {
        (self.build)(args)
    }

    pub fn tags(&self, result: &Value, args: &Value) -> HashSet<Tag> {
        (self.invalidates)(result, args)
    }
}

#[derive(Default)]
pub struct EndpointRegistry {
    queries: HashMap<&'static str, QueryEndpoint>,
    mutations: HashMap<&'static str, MutationEndpoint>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every endpoint both upstream APIs expose.
    pub fn standard(config: &Config) -> Self {
        let mut registry = Self::new();
        posts::register(&mut registry, &config.content_base_url);
        users::register(&mut registry, &config.content_base_url);
        jobs::register(&mut registry, &config.content_base_url);
        hh::register(&mut registry, &config.hh_base_url);
        registry
    }

    pub fn register_query(&mut self, endpoint: QueryEndpoint) {
        debug_assert!(
            !self.queries.contains_key(endpoint.name),
            "duplicate query endpoint {}",
            endpoint.name
        );
        self.queries.insert(endpoint.name, endpoint);
    }

    pub fn register_mutation(&mut self, endpoint: MutationEndpoint) {
        debug_assert!(
            !self.mutations.contains_key(endpoint.name),
            "duplicate mutation endpoint {}",
            endpoint.name
        );
        self.mutations.insert(endpoint.name, endpoint);
    }

    pub fn query(&self, name: &str) -> Result<&QueryEndpoint, ApiError> {
        self.queries
            .get(name)
            .ok_or_else(|| ApiError::UnknownEndpoint(name.to_string()))
    }

    pub fn mutation(&self, name: &str) -> Result<&MutationEndpoint, ApiError> {
        self.mutations
            .get(name)
            .ok_or_else(|| ApiError::UnknownEndpoint(name.to_string()))
    }
}

/// Standard list tagging: one tag per item id in the result array plus
/// the collection tag. An empty (or non-array) result still provides
/// the collection tag so future writes can invalidate the empty view.
pub fn item_and_list_tags(result: &Value, kind: &str) -> HashSet<Tag> {
    let mut tags = HashSet::new();
    if let Some(items) = result.as_array() {
        for item in items {
            if let Some(tag) = id_tag(kind, item.get("id")) {
                tags.insert(tag);
            }
        }
    }
    tags.insert(Tag::list(kind));
    tags
}

/// Build a per-resource tag from a JSON id, which both APIs send as
/// either a number or a string.
pub fn id_tag(kind: &str, id: Option<&Value>) -> Option<Tag> {
    match id? {
        Value::Number(n) => Some(Tag::id(kind, n)),
        Value::String(s) => Some(Tag::id(kind, s)),
        _ => None,
    }
}

/// Extract a path id from endpoint arguments, accepting the same
/// number-or-string forms as `id_tag`.
pub fn require_id(endpoint: &str, args: &Value) -> Result<String, ApiError> {
    match args {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => Err(ApiError::InvalidArgs(format!(
            "{}: expected an id, got {}",
            endpoint, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_and_list_tags() {
        let tags = item_and_list_tags(&json!([{"id": 1}, {"id": 2}]), "Posts");
        assert_eq!(tags.len(), 3);
        assert!(tags.contains(&Tag::list("Posts")));
        assert!(tags.contains(&Tag::id("Posts", 1)));
        assert!(tags.contains(&Tag::id("Posts", 2)));
    }

    #[test]
    fn test_empty_result_still_provides_list_tag() {
        let tags = item_and_list_tags(&json!([]), "Posts");
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&Tag::list("Posts")));
    }

    #[test]
    fn test_require_id_accepts_number_and_string() {
        assert_eq!(require_id("ep", &json!(7)).unwrap(), "7");
        assert_eq!(require_id("ep", &json!("hh-113")).unwrap(), "hh-113");
        assert!(matches!(
            require_id("ep", &json!({"id": 7})),
            Err(ApiError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_unknown_endpoint_errors() {
        let registry = EndpointRegistry::new();
        assert!(matches!(
            registry.query("nope"),
            Err(ApiError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn test_standard_registry_resolves_all_endpoints() {
        let registry = EndpointRegistry::standard(&Config::default());
        for name in [
            posts::GET_POSTS,
            posts::GET_POST_BY_ID,
            users::GET_USERS,
            users::GET_USER_BY_ID,
            jobs::SEARCH_JOBS,
            jobs::GET_JOB_BY_ID,
            jobs::GET_RECOMMENDED_JOBS,
            hh::SEARCH_VACANCIES,
            hh::GET_VACANCY_BY_ID,
            hh::GET_AREAS,
            hh::GET_SIMILAR_VACANCIES,
            hh::SEARCH_EMPLOYERS,
            hh::GET_EMPLOYER_BY_ID,
        ] {
            assert!(registry.query(name).is_ok(), "missing query {}", name);
        }
        for name in [
            posts::CREATE_POST,
            posts::UPDATE_POST,
            posts::DELETE_POST,
            users::CREATE_USER,
            users::UPDATE_USER,
            jobs::BOOKMARK_JOB,
            jobs::APPLY_FOR_JOB,
        ] {
            assert!(registry.mutation(name).is_ok(), "missing mutation {}", name);
        }
    }
}
