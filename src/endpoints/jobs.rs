//! Job-search endpoints.
//!
//! The backend answers search requests in a loose `{results, ...}`
//! shape; `normalize_search_response` converts it to the `JobPage`
//! contract before caching, splitting comma-separated requirement
//! strings and defaulting missing paging fields.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::api::{request::query_params, ApiError, RequestDescriptor};
use crate::cache::Tag;

use super::{id_tag, EndpointRegistry, MutationEndpoint, QueryEndpoint};

pub const SEARCH_JOBS: &str = "search_jobs";
pub const GET_JOB_BY_ID: &str = "get_job_by_id";
pub const GET_RECOMMENDED_JOBS: &str = "get_recommended_jobs";
pub const BOOKMARK_JOB: &str = "bookmark_job";
pub const APPLY_FOR_JOB: &str = "apply_for_job";

const KIND: &str = "Jobs";
const RECOMMENDED_KIND: &str = "RecommendedJobs";

/// Normalize a raw search response into the `JobPage` shape.
pub fn normalize_search_response(raw: Value) -> Value {
    let results = raw.get("results").and_then(|r| r.as_array()).cloned();
    let Some(results) = results else {
        return json!({
            "jobs": [],
            "totalResults": 0,
            "page": 1,
            "totalPages": 1,
        });
    };

    let jobs: Vec<Value> = results
        .into_iter()
        .map(|mut job| {
            // Requirements arrive as a comma-separated string.
            let requirements = match job.get("requirements") {
                Some(Value::String(s)) => s
                    .split(',')
                    .map(|r| Value::String(r.trim().to_string()))
                    .collect(),
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            if let Some(map) = job.as_object_mut() {
                map.insert("requirements".to_string(), Value::Array(requirements));
            }
            job
        })
        .collect();

    json!({
        "jobs": jobs,
        "totalResults": raw.get("totalResults").and_then(|v| v.as_u64()).unwrap_or(0),
        "page": raw.get("page").and_then(|v| v.as_u64()).unwrap_or(1),
        "totalPages": raw.get("totalPages").and_then(|v| v.as_u64()).unwrap_or(1),
    })
}

fn job_page_tags(result: &Value) -> HashSet<Tag> {
    let mut tags = HashSet::new();
    if let Some(jobs) = result.get("jobs").and_then(|j| j.as_array()) {
        for job in jobs {
            if let Some(tag) = id_tag(KIND, job.get("id")) {
                tags.insert(tag);
            }
        }
    }
    tags.insert(Tag::list(KIND));
    tags
}

pub fn register(registry: &mut EndpointRegistry, base_url: &str) {
    let base = base_url.trim_end_matches('/').to_string();

    registry.register_query(
        QueryEndpoint::new(
            SEARCH_JOBS,
            {
                let base = base.clone();
                move |args| {
                    Ok(RequestDescriptor::get(format!("{}/jobs/search", base))
                        .with_params(query_params(args)))
                }
            },
            |result, _args| job_page_tags(result),
        )
        .with_transform(normalize_search_response),
    );

    registry.register_query(QueryEndpoint::new(
        GET_JOB_BY_ID,
        {
            let base = base.clone();
            move |args| {
                let id = args.as_i64().ok_or_else(|| {
                    ApiError::InvalidArgs(format!("{}: expected a numeric id", GET_JOB_BY_ID))
                })?;
                Ok(RequestDescriptor::get(format!("{}/jobs/{}", base, id)))
            }
        },
        |_result, args| id_tag(KIND, Some(args)).into_iter().collect(),
    ));

    registry.register_query(QueryEndpoint::new(
        GET_RECOMMENDED_JOBS,
        {
            let base = base.clone();
            move |_args| Ok(RequestDescriptor::get(format!("{}/jobs/recommended", base)))
        },
        |_result, _args| [Tag::of(RECOMMENDED_KIND)].into_iter().collect(),
    ));

    registry.register_mutation(MutationEndpoint::new(
        BOOKMARK_JOB,
        {
            let base = base.clone();
            move |args| {
                let id = args.as_i64().ok_or_else(|| {
                    ApiError::InvalidArgs(format!("{}: expected a numeric id", BOOKMARK_JOB))
                })?;
                Ok(RequestDescriptor::post(format!("{}/jobs/{}/bookmark", base, id)))
            }
        },
        // Bookmarks are tracked server-side only; nothing cached depends on them.
        |_result, _args| HashSet::new(),
    ));

    registry.register_mutation(MutationEndpoint::new(
        APPLY_FOR_JOB,
        {
            let base = base.clone();
            move |args| {
                let job_id = args.get("jobId").and_then(|v| v.as_i64()).ok_or_else(|| {
                    ApiError::InvalidArgs(format!("{}: missing jobId", APPLY_FOR_JOB))
                })?;
                let mut body = args.clone();
                if let Some(map) = body.as_object_mut() {
                    map.remove("jobId");
                }
                Ok(RequestDescriptor::post(format!("{}/jobs/{}/apply", base, job_id))
                    .with_body(body))
            }
        },
        |_result, _args| HashSet::new(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobPage;

    #[test]
    fn test_normalize_splits_requirement_strings() {
        let raw = json!({
            "results": [{
                "id": 1,
                "title": "Backend engineer",
                "company": "Acme",
                "location": "Remote",
                "description": "d",
                "salary": "100k",
                "postedDate": "2024-01-05",
                "requirements": "rust, tokio, sql",
                "type": "remote"
            }],
            "totalResults": 1,
            "page": 1,
            "totalPages": 1
        });
        let page: JobPage = serde_json::from_value(normalize_search_response(raw)).unwrap();
        assert_eq!(page.jobs[0].requirements, vec!["rust", "tokio", "sql"]);
        assert_eq!(page.total_results, 1);
    }

    #[test]
    fn test_normalize_handles_unknown_shape() {
        let page: JobPage =
            serde_json::from_value(normalize_search_response(json!({"unexpected": true})))
                .unwrap();
        assert!(page.jobs.is_empty());
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_search_jobs_provides_item_and_list_tags() {
        let mut registry = EndpointRegistry::new();
        register(&mut registry, "https://api.example.com");

        let result = json!({"jobs": [{"id": 1}, {"id": 2}], "totalResults": 2});
        let tags = registry
            .query(SEARCH_JOBS)
            .unwrap()
            .tags(&result, &json!({}));
        assert!(tags.contains(&Tag::id(KIND, 1)));
        assert!(tags.contains(&Tag::id(KIND, 2)));
        assert!(tags.contains(&Tag::list(KIND)));
    }

    #[test]
    fn test_apply_for_job_moves_id_into_url() {
        let mut registry = EndpointRegistry::new();
        register(&mut registry, "https://api.example.com");

        let req = registry
            .mutation(APPLY_FOR_JOB)
            .unwrap()
            .request(&json!({"jobId": 9, "coverLetter": "hi"}))
            .unwrap();
        assert_eq!(req.url, "https://api.example.com/jobs/9/apply");
        assert_eq!(req.body, Some(json!({"coverLetter": "hi"})));
    }
}
