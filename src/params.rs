//! Query parameter objects for the list endpoints.
//!
//! Field order in the rendered string is fixed per resource and independent of the
//! order in which fields were set. An empty list renders as an absent field; the
//! `with_*` setters store it as `None` so that parsing a rendered query gives back
//! an equal object.

use crate::encoding::wire_enum;
use crate::error::Result;
use crate::query::{Query, QueryReader, QueryString, QueryWriter};
use crate::time::Time;

/// Empty lists render as absent fields, so the setters store them as unset
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parameters for `GET /indexes/{uid}/documents`.
///
/// Canonical order: `fields`, `limit`, `offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentsQuery {
    /// Attributes to return for each document. `Some` of an empty list renders like `None`.
    pub fields: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DocumentsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = non_empty(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl Query for DocumentsQuery {
    fn render(&self) -> Result<QueryString> {
        let mut writer = QueryWriter::new();
        writer
            .field("fields", self.fields.as_ref())?
            .field("limit", self.limit.as_ref())?
            .field("offset", self.offset.as_ref())?;
        Ok(writer.finish())
    }

    fn parse(query: &str) -> Result<Self> {
        let mut reader = QueryReader::new(query)?;
        let parsed = DocumentsQuery {
            fields: reader.take("fields")?,
            limit: reader.take("limit")?,
            offset: reader.take("offset")?,
        };
        reader.finish()?;
        Ok(parsed)
    }
}

/// Offset/limit pagination shared by the index and key listings
macro_rules! paginated_query {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            pub limit: Option<usize>,
            pub offset: Option<usize>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn with_limit(mut self, limit: usize) -> Self {
                self.limit = Some(limit);
                self
            }

            pub fn with_offset(mut self, offset: usize) -> Self {
                self.offset = Some(offset);
                self
            }
        }

        impl Query for $name {
            fn render(&self) -> Result<QueryString> {
                let mut writer = QueryWriter::new();
                writer
                    .field("limit", self.limit.as_ref())?
                    .field("offset", self.offset.as_ref())?;
                Ok(writer.finish())
            }

            fn parse(query: &str) -> Result<Self> {
                let mut reader = QueryReader::new(query)?;
                let parsed = $name {
                    limit: reader.take("limit")?,
                    offset: reader.take("offset")?,
                };
                reader.finish()?;
                Ok(parsed)
            }
        }
    };
}

paginated_query! {
    /// Parameters for `GET /indexes`. Canonical order: `limit`, `offset`.
    IndexesQuery
}

paginated_query! {
    /// Parameters for `GET /keys`. Canonical order: `limit`, `offset`.
    KeysQuery
}

wire_enum! {
    /// Kind of asynchronous task
    pub enum TaskType {
        IndexCreation => "indexCreation",
        IndexUpdate => "indexUpdate",
        IndexDeletion => "indexDeletion",
        IndexSwap => "indexSwap",
        DocumentAdditionOrUpdate => "documentAdditionOrUpdate",
        DocumentDeletion => "documentDeletion",
        SettingsUpdate => "settingsUpdate",
        DumpCreation => "dumpCreation",
        TaskCancelation => "taskCancelation",
        TaskDeletion => "taskDeletion",
        SnapshotCreation => "snapshotCreation",
    }
}

wire_enum! {
    /// Lifecycle state of an asynchronous task
    pub enum TaskStatus {
        Enqueued => "enqueued",
        Processing => "processing",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
    }
}

/// Parameters for `GET /tasks`.
///
/// Canonical order: `indexUids`, `types`, `statuses`, `uids`, `canceledBy`,
/// `beforeEnqueuedAt`, `afterEnqueuedAt`, `beforeStartedAt`, `afterStartedAt`,
/// `beforeFinishedAt`, `afterFinishedAt`, `from`, `limit`, `next`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksQuery {
    pub index_uids: Option<Vec<String>>,
    pub types: Option<Vec<TaskType>>,
    pub statuses: Option<Vec<TaskStatus>>,
    pub uids: Option<Vec<u64>>,
    /// Uids of the cancelation tasks that canceled the listed tasks
    pub canceled_by: Option<Vec<u64>>,
    pub before_enqueued_at: Option<Time>,
    pub after_enqueued_at: Option<Time>,
    pub before_started_at: Option<Time>,
    pub after_started_at: Option<Time>,
    pub before_finished_at: Option<Time>,
    pub after_finished_at: Option<Time>,
    /// Uid of the first task returned
    pub from: Option<u64>,
    pub limit: Option<usize>,
    /// Cursor returned by a previous page
    pub next: Option<u64>,
}

impl TasksQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_uids<I, S>(mut self, index_uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_uids = non_empty(index_uids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = TaskType>) -> Self {
        self.types = non_empty(types.into_iter().collect());
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = non_empty(statuses.into_iter().collect());
        self
    }

    pub fn with_uids(mut self, uids: impl IntoIterator<Item = u64>) -> Self {
        self.uids = non_empty(uids.into_iter().collect());
        self
    }

    pub fn with_canceled_by(mut self, uids: impl IntoIterator<Item = u64>) -> Self {
        self.canceled_by = non_empty(uids.into_iter().collect());
        self
    }

    pub fn with_before_enqueued_at(mut self, at: impl Into<Time>) -> Self {
        self.before_enqueued_at = Some(at.into());
        self
    }

    pub fn with_after_enqueued_at(mut self, at: impl Into<Time>) -> Self {
        self.after_enqueued_at = Some(at.into());
        self
    }

    pub fn with_before_started_at(mut self, at: impl Into<Time>) -> Self {
        self.before_started_at = Some(at.into());
        self
    }

    pub fn with_after_started_at(mut self, at: impl Into<Time>) -> Self {
        self.after_started_at = Some(at.into());
        self
    }

    pub fn with_before_finished_at(mut self, at: impl Into<Time>) -> Self {
        self.before_finished_at = Some(at.into());
        self
    }

    pub fn with_after_finished_at(mut self, at: impl Into<Time>) -> Self {
        self.after_finished_at = Some(at.into());
        self
    }

    pub fn with_from(mut self, from: u64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_next(mut self, next: u64) -> Self {
        self.next = Some(next);
        self
    }
}

impl Query for TasksQuery {
    fn render(&self) -> Result<QueryString> {
        let mut writer = QueryWriter::new();
        writer
            .field("indexUids", self.index_uids.as_ref())?
            .field("types", self.types.as_ref())?
            .field("statuses", self.statuses.as_ref())?
            .field("uids", self.uids.as_ref())?
            .field("canceledBy", self.canceled_by.as_ref())?
            .field("beforeEnqueuedAt", self.before_enqueued_at.as_ref())?
            .field("afterEnqueuedAt", self.after_enqueued_at.as_ref())?
            .field("beforeStartedAt", self.before_started_at.as_ref())?
            .field("afterStartedAt", self.after_started_at.as_ref())?
            .field("beforeFinishedAt", self.before_finished_at.as_ref())?
            .field("afterFinishedAt", self.after_finished_at.as_ref())?
            .field("from", self.from.as_ref())?
            .field("limit", self.limit.as_ref())?
            .field("next", self.next.as_ref())?;
        Ok(writer.finish())
    }

    fn parse(query: &str) -> Result<Self> {
        let mut reader = QueryReader::new(query)?;
        let parsed = TasksQuery {
            index_uids: reader.take("indexUids")?,
            types: reader.take("types")?,
            statuses: reader.take("statuses")?,
            uids: reader.take("uids")?,
            canceled_by: reader.take("canceledBy")?,
            before_enqueued_at: reader.take("beforeEnqueuedAt")?,
            after_enqueued_at: reader.take("afterEnqueuedAt")?,
            before_started_at: reader.take("beforeStartedAt")?,
            after_started_at: reader.take("afterStartedAt")?,
            before_finished_at: reader.take("beforeFinishedAt")?,
            after_finished_at: reader.take("afterFinishedAt")?,
            from: reader.take("from")?,
            limit: reader.take("limit")?,
            next: reader.take("next")?,
        };
        reader.finish()?;
        Ok(parsed)
    }
}
