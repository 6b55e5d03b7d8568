use crate::claims::{ApiKeyClaim, SearchRules};
use crate::client::{create_http_client, Config};
use crate::error::{Result, SearchError};
use crate::params::{DocumentsQuery, IndexesQuery, KeysQuery, TasksQuery};
use crate::query::{Query, QueryString};
use crate::response::{ApiErrorBody, Results, TasksResults};
use crate::token::build_tenant_token;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Request, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use url::Url;

/// Blocking client for the search service REST API
#[derive(Debug, Clone)]
pub struct SearchClient {
    /// HTTP client
    pub client: Client,
    /// Configuration
    pub config: Config,
}

impl SearchClient {
    /// Create a client for the given configuration
    pub fn new(config: Config) -> Result<Self> {
        Ok(SearchClient {
            client: create_http_client(&config)?,
            config,
        })
    }

    /// Build a request for `path` with a rendered query string appended
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Endpoint path starting with `/`
    /// * `query` - Canonical query string, possibly empty
    /// * `headers` - Extra headers; the bearer credential is added when an API key is configured
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &QueryString,
        headers: &[(&str, &str)],
    ) -> Result<Request> {
        if !path.starts_with('/') {
            return Err(SearchError::RequestBuild(format!(
                "path must start with '/': {}",
                path
            )));
        }

        let url = Url::parse(&format!("{}{}", self.config.base_url(), query.append_to(path)))?;
        let mut request = self.client.request(method, url);

        if let Some(ref api_key) = self.config.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", api_key));
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        Ok(request.build()?)
    }

    /// Send a request. Non-2xx responses are decoded into [`SearchError::Api`]
    /// when the body is a service error, [`SearchError::Http`] otherwise.
    pub fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let start = Instant::now();
        let response = self.client.execute(request)?;
        let status = response.status();

        tracing::debug!(
            %method,
            %path,
            elapsed = ?start.elapsed(),
            status = status.as_u16(),
            "search request completed"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text()?;
        let error = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(api_error) => api_error.into_error(status.as_u16()),
            Err(_) => SearchError::Http {
                status: status.as_u16(),
                body,
            },
        };
        tracing::warn!(%method, %path, error = %error, "search request failed");
        Err(error)
    }

    fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let request = self.build_request(Method::GET, path, &query.render()?, &[])?;
        let body = self.execute(request)?.bytes()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// List documents of an index
    pub fn get_documents<T: DeserializeOwned>(
        &self,
        index_uid: &str,
        query: &DocumentsQuery,
    ) -> Result<Results<T>> {
        if index_uid.is_empty() || index_uid.contains(&['/', '?', '#'][..]) {
            return Err(SearchError::RequestBuild(format!(
                "invalid index uid: {:?}",
                index_uid
            )));
        }
        self.get_json(&format!("/indexes/{}/documents", index_uid), query)
    }

    /// List indexes
    pub fn get_indexes(&self, query: &IndexesQuery) -> Result<Results<Value>> {
        self.get_json("/indexes", query)
    }

    /// List API keys
    pub fn get_keys(&self, query: &KeysQuery) -> Result<Results<Value>> {
        self.get_json("/keys", query)
    }

    /// List tasks
    pub fn get_tasks(&self, query: &TasksQuery) -> Result<TasksResults> {
        self.get_json("/tasks", query)
    }

    /// Build a tenant token from the configured API key, which serves as both the
    /// key claim and the signing secret
    pub fn generate_tenant_token(
        &self,
        search_rules: &SearchRules,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| SearchError::Signing("no API key configured".to_string()))?;
        build_tenant_token(search_rules, &ApiKeyClaim::new(api_key), api_key, expires_at)
    }
}
