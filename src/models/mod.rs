//! Typed payloads for the two upstream APIs.
//!
//! - `Post`, `User`: placeholder content API entities
//! - `Job`, `JobPage`, `JobSearchParams`: the mock job-search backend
//! - `Vacancy`, `VacancyPage`, `Area`, `Employer`: HeadHunter API
//!
//! The cache itself stores raw `serde_json::Value`; these types exist
//! for endpoint argument construction and for consumers that want
//! structure back out of `QuerySubscription::data`.

pub mod job;
pub mod post;
pub mod user;
pub mod vacancy;

pub use job::{Job, JobPage, JobSearchParams, JobType};
pub use post::Post;
pub use user::User;
pub use vacancy::{
    Area, Employer, Employment, Experience, IdName, Salary, Schedule, Snippet, Vacancy,
    VacancyPage, VacancySearchParams,
};
