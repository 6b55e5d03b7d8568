//! Canonical query strings.
//!
//! Every query object renders its present fields in a fixed order, one `name=value`
//! pair per field, joined with `&` and prefixed with `?`. An object with no present
//! field renders as the empty string.

use std::collections::HashMap;
use std::fmt;

use crate::encoding::{FromQueryValue, ToQueryValue};
use crate::error::{Result, SearchError};

/// A rendered, canonical query string: either empty or `?name=value&...`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryString(String);

impl QueryString {
    /// The empty query string
    pub fn empty() -> Self {
        QueryString(String::new())
    }

    /// The query string, including its leading `?` when non-empty
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no field was rendered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Append this query string to a path or URL
    pub fn append_to(&self, path: &str) -> String {
        format!("{}{}", path, self.0)
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<QueryString> for String {
    fn from(q: QueryString) -> Self {
        q.0
    }
}

/// A typed query parameter object with a canonical textual form
pub trait Query: Sized {
    /// Render present fields in canonical order
    fn render(&self) -> Result<QueryString>;

    /// Parse a query string produced by [`Query::render`]
    fn parse(query: &str) -> Result<Self>;
}

/// Accumulates `name=value` pairs in the order fields are written
#[derive(Debug, Default)]
pub struct QueryWriter {
    pairs: Vec<(&'static str, String)>,
}

impl QueryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a field if it is present and does not encode as absent
    pub fn field<T: ToQueryValue>(&mut self, name: &'static str, value: Option<&T>) -> Result<&mut Self> {
        if let Some(value) = value {
            if !value.is_absent() {
                debug_assert!(
                    self.pairs.iter().all(|(existing, _)| *existing != name),
                    "query field written twice"
                );
                self.pairs.push((name, value.to_query_value()?));
            }
        }
        Ok(self)
    }

    pub fn finish(&self) -> QueryString {
        if self.pairs.is_empty() {
            return QueryString::empty();
        }
        let joined = self
            .pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");
        QueryString(format!("?{}", joined))
    }
}

/// Splits a query string into raw pairs and hands out typed fields by name
#[derive(Debug)]
pub struct QueryReader<'a> {
    pairs: HashMap<&'a str, &'a str>,
}

impl<'a> QueryReader<'a> {
    /// Split `query` into pairs. A leading `?` is optional.
    pub fn new(query: &'a str) -> Result<Self> {
        let body = query.strip_prefix('?').unwrap_or(query);
        let mut pairs = HashMap::new();
        if body.is_empty() {
            return Ok(QueryReader { pairs });
        }

        for pair in body.split('&') {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| SearchError::Parse(format!("'{}' is not a name=value pair", pair)))?;
            if name.is_empty() {
                return Err(SearchError::Parse(format!("'{}' has an empty name", pair)));
            }
            if value.is_empty() {
                return Err(SearchError::Parse(format!("field '{}' has an empty value", name)));
            }
            if pairs.insert(name, value).is_some() {
                return Err(SearchError::Parse(format!("field '{}' appears more than once", name)));
            }
        }

        Ok(QueryReader { pairs })
    }

    /// Take a field, decoding it if present
    pub fn take<T: FromQueryValue>(&mut self, name: &str) -> Result<Option<T>> {
        self.pairs
            .remove(name)
            .map(|raw| {
                T::from_query_value(raw)
                    .map_err(|e| SearchError::Parse(format!("field '{}': {}", name, e)))
            })
            .transpose()
    }

    /// Fail if any field was not taken
    pub fn finish(self) -> Result<()> {
        let mut unknown: Vec<&str> = self.pairs.into_keys().collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(SearchError::Parse(format!("unknown field(s): {}", unknown.join(", "))))
    }
}
