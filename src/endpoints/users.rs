//! User endpoints against the placeholder content API.

use std::collections::HashSet;

use serde_json::Value;

use crate::api::RequestDescriptor;
use crate::cache::Tag;

use super::{
    id_tag, item_and_list_tags, require_id, EndpointRegistry, MutationEndpoint, QueryEndpoint,
};

pub const GET_USERS: &str = "get_users";
pub const GET_USER_BY_ID: &str = "get_user_by_id";
pub const CREATE_USER: &str = "create_user";
pub const UPDATE_USER: &str = "update_user";

const KIND: &str = "Users";

pub fn register(registry: &mut EndpointRegistry, base_url: &str) {
    let base = base_url.trim_end_matches('/').to_string();

    registry.register_query(QueryEndpoint::new(
        GET_USERS,
        {
            let base = base.clone();
            move |_args| Ok(RequestDescriptor::get(format!("{}/users", base)))
        },
        |result, _args| item_and_list_tags(result, KIND),
    ));

    registry.register_query(QueryEndpoint::new(
        GET_USER_BY_ID,
        {
            let base = base.clone();
            move |args| {
                let id = require_id(GET_USER_BY_ID, args)?;
                Ok(RequestDescriptor::get(format!("{}/users/{}", base, id)))
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
        CREATE_USER,
        {
            let base = base.clone();
            move |args| {
                Ok(RequestDescriptor::post(format!("{}/users", base)).with_body(args.clone()))
            }
        },
        |_result, _args| [Tag::list(KIND)].into_iter().collect(),
    ));

    registry.register_mutation(MutationEndpoint::new(
        UPDATE_USER,
        {
            let base = base.clone();
            move |args| {
                let id = require_id(UPDATE_USER, args.get("id").unwrap_or(&Value::Null))?;
                let mut patch = args.clone();
                if let Some(map) = patch.as_object_mut() {
                    map.remove("id");
                }
                Ok(RequestDescriptor::patch(format!("{}/users/{}", base, id)).with_body(patch))
            }
        },
        |_result, args| id_tag(KIND, args.get("id")).into_iter().collect(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_user_invalidates_only_that_user() {
        let mut registry = EndpointRegistry::new();
        register(&mut registry, "https://api.example.com");

        let tags = registry
            .mutation(UPDATE_USER)
            .unwrap()
            .tags(&json!({}), &json!({"id": 5, "name": "n"}));
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&Tag::id(KIND, 5)));
    }
}
