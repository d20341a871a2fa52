//! HeadHunter API endpoints.
//!
//! All read-only: the HH public API exposes no writes this client uses.
//! The areas dictionary changes rarely, so its entries keep for a day
//! after the last subscriber instead of the default minute.

use std::time::Duration;

use serde_json::Value;

use crate::api::{request::query_params, ApiError, RequestDescriptor};
use crate::cache::Tag;

use super::{id_tag, EndpointRegistry, QueryEndpoint};

pub const SEARCH_VACANCIES: &str = "search_vacancies";
pub const GET_VACANCY_BY_ID: &str = "get_vacancy_by_id";
pub const GET_AREAS: &str = "get_areas";
pub const GET_SIMILAR_VACANCIES: &str = "get_similar_vacancies";
pub const SEARCH_EMPLOYERS: &str = "search_employers";
pub const GET_EMPLOYER_BY_ID: &str = "get_employer_by_id";

/// Idle retention for the areas dictionary.
const AREAS_KEEP_SECS: u64 = 86_400;

/// Default page size for vacancy search.
const DEFAULT_PER_PAGE: u64 = 20;

fn require_str_id(endpoint: &str, args: &Value) -> Result<String, ApiError> {
    match args {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ApiError::InvalidArgs(format!(
            "{}: expected a vacancy/employer id, got {}",
            endpoint, other
        ))),
    }
}

pub fn register(registry: &mut EndpointRegistry, base_url: &str) {
    let base = base_url.trim_end_matches('/').to_string();

    registry.register_query(QueryEndpoint::new(
        SEARCH_VACANCIES,
        {
            let base = base.clone();
            move |args| {
                let mut params = query_params(args);
                if !params.iter().any(|(k, _)| k == "per_page") {
                    params.push(("per_page".to_string(), DEFAULT_PER_PAGE.to_string()));
                }
                Ok(RequestDescriptor::get(format!("{}/vacancies", base)).with_params(params))
            }
        },
        |_result, _args| [Tag::of("Vacancies")].into_iter().collect(),
    ));

    registry.register_query(QueryEndpoint::new(
        GET_VACANCY_BY_ID,
        {
            let base = base.clone();
            move |args| {
                let id = require_str_id(GET_VACANCY_BY_ID, args)?;
                Ok(RequestDescriptor::get(format!("{}/vacancies/{}", base, id)))
            }
        },
        |_result, args| id_tag("Vacancy", Some(args)).into_iter().collect(),
    ));

    registry.register_query(
        QueryEndpoint::new(
            GET_AREAS,
            {
                let base = base.clone();
                move |_args| Ok(RequestDescriptor::get(format!("{}/areas", base)))
            },
            |_result, _args| [Tag::of("Areas")].into_iter().collect(),
        )
        .with_keep_unused(Duration::from_secs(AREAS_KEEP_SECS)),
    );

    registry.register_query(QueryEndpoint::new(
        GET_SIMILAR_VACANCIES,
        {
            let base = base.clone();
            move |args| {
                let id = require_str_id(GET_SIMILAR_VACANCIES, args)?;
                Ok(RequestDescriptor::get(format!(
                    "{}/vacancies/{}/similar_vacancies",
                    base, id
                )))
            }
        },
        |_result, args| id_tag("SimilarVacancies", Some(args)).into_iter().collect(),
    ));

    registry.register_query(QueryEndpoint::new(
        SEARCH_EMPLOYERS,
        {
            let base = base.clone();
            move |args| {
                Ok(RequestDescriptor::get(format!("{}/employers", base))
                    .with_params(query_params(args)))
            }
        },
        |_result, _args| [Tag::of("Employers")].into_iter().collect(),
    ));

    registry.register_query(QueryEndpoint::new(
        GET_EMPLOYER_BY_ID,
        {
            let base = base.clone();
            move |args| {
                let id = require_str_id(GET_EMPLOYER_BY_ID, args)?;
                Ok(RequestDescriptor::get(format!("{}/employers/{}", base, id)))
            }
        },
        |_result, args| id_tag("Employer", Some(args)).into_iter().collect(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> EndpointRegistry {
        let mut registry = EndpointRegistry::new();
        register(&mut registry, "https://api.hh.ru");
        registry
    }

    #[test]
    fn test_search_defaults_page_size() {
        let req = registry()
            .query(SEARCH_VACANCIES)
            .unwrap()
            .request(&json!({"text": "rust"}))
            .unwrap();
        assert!(req
            .params
            .contains(&("per_page".to_string(), "20".to_string())));
        assert!(req.params.contains(&("text".to_string(), "rust".to_string())));
    }

    #[test]
    fn test_search_respects_explicit_page_size() {
        let req = registry()
            .query(SEARCH_VACANCIES)
            .unwrap()
            .request(&json!({"per_page": 50}))
            .unwrap();
        let sizes: Vec<_> = req.params.iter().filter(|(k, _)| k == "per_page").collect();
        assert_eq!(sizes, vec![&("per_page".to_string(), "50".to_string())]);
    }

    #[test]
    fn test_areas_keep_unused_override() {
        let registry = registry();
        let endpoint = registry.query(GET_AREAS).unwrap();
        assert_eq!(
            endpoint.keep_unused_for,
            Some(Duration::from_secs(86_400))
        );
    }

    #[test]
    fn test_vacancy_tags_carry_the_id() {
        let tags = registry()
            .query(GET_VACANCY_BY_ID)
            .unwrap()
            .tags(&json!({}), &json!("12345"));
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&Tag::id("Vacancy", "12345")));
    }

    #[test]
    fn test_similar_vacancies_url() {
        let req = registry()
            .query(GET_SIMILAR_VACANCIES)
            .unwrap()
            .request(&json!("42"))
            .unwrap();
        assert_eq!(req.url, "https://api.hh.ru/vacancies/42/similar_vacancies");
    }
}
