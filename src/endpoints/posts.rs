//! Post endpoints against the placeholder content API.
//!
//! `delete_post` invalidates both the per-post tag and the list tag, so
//! a subscribed posts list refetches after a delete even though the
//! deleted post no longer appears in any result.

use std::collections::HashSet;

use serde_json::Value;

use crate::api::RequestDescriptor;
use crate::cache::Tag;

use super::{
    id_tag, item_and_list_tags, require_id, EndpointRegistry, MutationEndpoint, QueryEndpoint,
};

pub const GET_POSTS: &str = "get_posts";
pub const GET_POST_BY_ID: &str = "get_post_by_id";
pub const CREATE_POST: &str = "create_post";
pub const UPDATE_POST: &str = "update_post";
pub const DELETE_POST: &str = "delete_post";

const KIND: &str = "Posts";

pub fn register(registry: &mut EndpointRegistry, base_url: &str) {
    let base = base_url.trim_end_matches('/').to_string();

    registry.register_query(QueryEndpoint::new(
        GET_POSTS,
        {
            let base = base.clone();
            move |_args| Ok(RequestDescriptor::get(format!("{}/posts", base)))
        },
        |result, _args| item_and_list_tags(result, KIND),
    ));

    registry.register_query(QueryEndpoint::new(
        GET_POST_BY_ID,
        {
            let base = base.clone();
            move |args| {
                let id = require_id(GET_POST_BY_ID, args)?;
                Ok(RequestDescriptor::get(format!("{}/posts/{}", base, id)))
            }
        },
        |_result, args| {
            let mut tags = HashSet::new();
            if let Some(tag) = id_tag(KIND, Some(args)) {
                tags.insert(tag);
            }
            tags
        },
    ));

    registry.register_mutation(MutationEndpoint::new(
        CREATE_POST,
        {
            let base = base.clone();
            move |args| {
                Ok(RequestDescriptor::post(format!("{}/posts", base)).with_body(args.clone()))
            }
        },
        |_result, _args| [Tag::list(KIND)].into_iter().collect(),
    ));

    registry.register_mutation(MutationEndpoint::new(
        UPDATE_POST,
        {
            let base = base.clone();
            move |args| {
                let id = require_id(UPDATE_POST, args.get("id").unwrap_or(&Value::Null))?;
                let mut patch = args.clone();
                if let Some(map) = patch.as_object_mut() {
                    map.remove("id");
                }
                Ok(RequestDescriptor::patch(format!("{}/posts/{}", base, id)).with_body(patch))
            }
        },
        |_result, args| id_tag(KIND, args.get("id")).into_iter().collect(),
    ));

    registry.register_mutation(MutationEndpoint::new(
        DELETE_POST,
        {
            let base = base.clone();
            move |args| {
                let id = require_id(DELETE_POST, args)?;
                Ok(RequestDescriptor::delete(format!("{}/posts/{}", base, id)))
            }
        },
        |_result, args| {
            let mut tags: HashSet<Tag> = id_tag(KIND, Some(args)).into_iter().collect();
            tags.insert(Tag::list(KIND));
            tags
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use reqwest::Method;
    use serde_json::json;

    fn registry() -> EndpointRegistry {
        let mut registry = EndpointRegistry::new();
        register(&mut registry, "https://api.example.com/");
        registry
    }

    #[test]
    fn test_get_post_by_id_builds_url() {
        let registry = registry();
        let req = registry
            .query(GET_POST_BY_ID)
            .unwrap()
            .request(&json!(7))
            .unwrap();
        assert_eq!(req.url, "https://api.example.com/posts/7");
        assert_eq!(req.method, Method::GET);
    }

    #[test]
    fn test_update_post_strips_id_from_patch_body() {
        let registry = registry();
        let req = registry
            .mutation(UPDATE_POST)
            .unwrap()
            .request(&json!({"id": 3, "title": "new"}))
            .unwrap();
        assert_eq!(req.url, "https://api.example.com/posts/3");
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.body, Some(json!({"title": "new"})));
    }

    #[test]
    fn test_delete_post_invalidates_item_and_list() {
        let registry = registry();
        let tags = registry
            .mutation(DELETE_POST)
            .unwrap()
            .tags(&Value::Null, &json!(1));
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&Tag::id(KIND, 1)));
        assert!(tags.contains(&Tag::list(KIND)));
    }

    #[test]
    fn test_create_post_invalidates_list_only() {
        let registry = registry();
        let tags = registry
            .mutation(CREATE_POST)
            .unwrap()
            .tags(&json!({"id": 101}), &json!({"title": "t"}));
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&Tag::list(KIND)));
    }

    #[test]
    fn test_bad_args_error() {
        let registry = registry();
        assert!(matches!(
            registry.query(GET_POST_BY_ID).unwrap().request(&json!({})),
            Err(ApiError::InvalidArgs(_))
        ));
    }
}
