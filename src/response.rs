use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SearchError;

/// Offset-paginated listing returned by `/indexes`, `/keys` and `/indexes/{uid}/documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results<T> {
    pub results: Vec<T>,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

/// Cursor-paginated listing returned by `/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksResults<T = Value> {
    pub results: Vec<T>,
    pub limit: usize,
    pub from: Option<u64>,
    /// Pass as `TasksQuery::next` to fetch the following page
    pub next: Option<u64>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl<T> TasksResults<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Error body sent by the service with non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub code: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl ApiErrorBody {
    pub fn into_error(self, status: u16) -> SearchError {
        SearchError::Api {
            message: self.message,
            code: self.code,
            error_type: self.error_type,
            link: self.link,
            status,
        }
    }
}
