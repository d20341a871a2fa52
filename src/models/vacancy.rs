//! HeadHunter API models.
//!
//! Field names follow the HH wire format (already snake_case), so no
//! renames are needed. Most nested objects are optional in practice;
//! the API omits them freely depending on the vacancy.

use serde::{Deserialize, Serialize};

/// Generic `{id, name}` dictionary entry the HH API uses everywhere
/// (schedule, experience, area, employment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdName {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salary {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub currency: String,
    pub gross: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoUrls {
    pub original: Option<String>,
    #[serde(rename = "90")]
    pub small: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employer {
    pub name: String,
    pub logo_urls: Option<LogoUrls>,
    pub alternate_url: Option<String>,
}

/// Search-result highlight fragments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snippet {
    pub requirement: Option<String>,
    pub responsibility: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: String,
    pub name: String,
    pub alternate_url: String,
    pub salary: Option<Salary>,
    pub employer: Employer,
    #[serde(default)]
    pub snippet: Snippet,
    pub schedule: Option<IdName>,
    pub experience: Option<IdName>,
    pub published_at: String,
    pub area: IdName,
}

/// One page of vacancy search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyPage {
    pub items: Vec<Vacancy>,
    pub found: u64,
    pub pages: u64,
    pub per_page: u64,
    pub page: u64,
}

/// A region in the HH area tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// Work-experience filter values accepted by vacancy search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Experience {
    NoExperience,
    Between1And3,
    Between3And6,
    MoreThan6,
}

/// Employment-type filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Employment {
    Full,
    Part,
    Project,
    Volunteer,
    Probation,
}

/// Work-schedule filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Schedule {
    FullDay,
    Shift,
    Flexible,
    Remote,
    FlyInFlyOut,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacancySearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Region id from the areas dictionary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_with_salary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Experience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment: Option<Employment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    /// Search window in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vacancy_parses_hh_payload() {
        let payload = json!({
            "id": "93353083",
            "name": "Rust developer",
            "alternate_url": "https://hh.ru/vacancy/93353083",
            "salary": {"from": 250000, "to": null, "currency": "RUR", "gross": false},
            "employer": {
                "name": "Acme",
                "logo_urls": {"original": "https://img/acme.png", "90": null},
                "alternate_url": "https://hh.ru/employer/1"
            },
            "snippet": {"requirement": "Rust, tokio", "responsibility": null},
            "schedule": {"id": "remote", "name": "Удаленная работа"},
            "experience": {"id": "between3And6", "name": "От 3 до 6 лет"},
            "published_at": "2024-02-12T10:15:00+0300",
            "area": {"id": "1", "name": "Москва"}
        });
        let vacancy: Vacancy = serde_json::from_value(payload).unwrap();
        assert_eq!(vacancy.id, "93353083");
        assert_eq!(vacancy.salary.as_ref().unwrap().from, Some(250000));
        assert!(vacancy.salary.as_ref().unwrap().to.is_none());
        assert_eq!(vacancy.schedule.as_ref().unwrap().id, "remote");
    }

    #[test]
    fn test_vacancy_tolerates_missing_snippet() {
        let payload = json!({
            "id": "1",
            "name": "n",
            "alternate_url": "u",
            "salary": null,
            "employer": {"name": "e", "logo_urls": null, "alternate_url": null},
            "published_at": "2024-01-01T00:00:00+0300",
            "area": {"id": "2", "name": "Санкт-Петербург"},
            "schedule": null,
            "experience": null
        });
        let vacancy: Vacancy = serde_json::from_value(payload).unwrap();
        assert!(vacancy.snippet.requirement.is_none());
    }

    #[test]
    fn test_experience_serializes_wire_values() {
        assert_eq!(
            serde_json::to_string(&Experience::Between1And3).unwrap(),
            "\"between1And3\""
        );
        assert_eq!(
            serde_json::to_string(&Schedule::FlyInFlyOut).unwrap(),
            "\"flyInFlyOut\""
        );
    }

    #[test]
    fn test_area_tree_is_recursive() {
        let payload = json!([
            {"id": "113", "name": "Россия", "areas": [
                {"id": "1", "name": "Москва", "areas": []}
            ]}
        ]);
        let areas: Vec<Area> = serde_json::from_value(payload).unwrap();
        assert_eq!(areas[0].areas[0].name, "Москва");
    }
}
