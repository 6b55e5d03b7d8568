//! # searchkit - search engine REST client
//!
//! A Rust client for a search engine service. Besides a thin blocking HTTP layer it
//! provides the two pieces that carry real invariants:
//!
//! - Canonical query strings: typed, optional filter and pagination objects render
//!   their present fields in a fixed order with canonical scalar encodings, and parse
//!   back from that form.
//! - Tenant tokens: HMAC-signed JWTs embedding per-index search rules, an API key
//!   prefix and an optional expiry.
//!
//! Both are pure and do no I/O.
//!
//! ## Query strings
//!
//! ```
//! use searchkit::{DocumentsQuery, Query};
//!
//! let query = DocumentsQuery::new()
//!     .with_limit(2)
//!     .with_offset(99)
//!     .with_fields(["name", "title"]);
//!
//! assert_eq!(query.render()?.as_str(), "?fields=name,title&limit=2&offset=99");
//! # Ok::<(), searchkit::SearchError>(())
//! ```
//!
//! ## Tenant tokens
//!
//! ```
//! use chrono::{Duration, Utc};
//! use searchkit::{build_tenant_token, ApiKeyClaim, IndexRules, SearchRules};
//!
//! let api_key = "d0552b41536279a0ad88bd595327b96f01176a60c2243e906c52ac02375f9bc4";
//! let rules = SearchRules::new()
//!     .index("medical_records", Some(IndexRules::new().with_filter("user_id = 1")));
//!
//! let token = build_tenant_token(
//!     &rules,
//!     &ApiKeyClaim::new(api_key),
//!     api_key,
//!     Some(Utc::now() + Duration::hours(1)),
//! )?;
//! assert_eq!(token.split('.').count(), 3);
//! # Ok::<(), searchkit::SearchError>(())
//! ```
//!
//! ## Client
//!
//! ```no_run
//! use searchkit::{Config, SearchClient, TaskStatus, TasksQuery};
//!
//! let client = SearchClient::new(
//!     Config::new("http://localhost:7700").with_api_key("masterKey"),
//! )?;
//!
//! let tasks = client.get_tasks(&TasksQuery::new().with_statuses([TaskStatus::Failed]))?;
//! println!("{} failed tasks on this page", tasks.results.len());
//! # Ok::<(), searchkit::SearchError>(())
//! ```

pub mod claims;
pub mod client;
pub mod encoding;
pub mod error;
pub mod params;
pub mod query;
pub mod response;
pub mod rest;
pub mod time;
pub mod token;

// Re-export main types for convenience
pub use claims::{ApiKeyClaim, IndexRules, SearchRules, TenantClaims};
pub use client::Config;
pub use encoding::{FromQueryValue, ToQueryValue};
pub use error::{Result, SearchError};
pub use params::{DocumentsQuery, IndexesQuery, KeysQuery, TaskStatus, TaskType, TasksQuery};
pub use query::{Query, QueryString};
pub use response::{ApiErrorBody, Results, TasksResults};
pub use rest::SearchClient;
pub use time::Time;
pub use token::{
    build_tenant_token, build_tenant_token_with, peek_claims, verify_tenant_token, HmacSigner,
    TokenSigner,
};
