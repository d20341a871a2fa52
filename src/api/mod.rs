//! HTTP transport layer.
//!
//! Endpoints describe requests declaratively as a `RequestDescriptor`;
//! the `Transport` trait performs them. `HttpTransport` is the reqwest
//! implementation used in production; tests substitute a mock that
//! counts calls and serves canned payloads.
//!
//! All transport failures normalize into the `ApiError` taxonomy, and
//! errors cached inside entries use the smaller, cloneable `QueryError`
//! shape.

pub mod client;
pub mod error;
pub mod request;

pub use client::{HttpTransport, Transport};
pub use error::{ApiError, QueryError};
pub use request::RequestDescriptor;
