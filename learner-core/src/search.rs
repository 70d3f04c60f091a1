//! Search query normalisation
//!
//! Search requests arrive as untyped JSON maps. [`normalize`] turns such a
//! map into a [`SearchQuery`] that the storage query layer can consume:
//! optional fields are copied only when present, integer fields are coerced
//! to `i32` whatever JSON number shape they arrived in, and paging is clamped
//! to [`MAX_LIMIT`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::keys;

/// Maximum number of documents a single search may page through
pub const MAX_LIMIT: i32 = 10_000;

/// Page size used when the request does not name one
pub const DEFAULT_LIMIT: i32 = 250;

/// An integer as it may arrive from upstream JSON decoding.
///
/// Small integers are sometimes widened to big integers before they reach
/// us, which shows up either as an unsigned or float number or as a string
/// of digits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WideInt {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Digits(String),
}

impl WideInt {
    /// Coerce to `i32`, saturating at the type bounds.
    ///
    /// Fractional floats are truncated. Returns `None` for strings that are
    /// not a base-10 integer and for NaN.
    pub fn to_i32(&self) -> Option<i32> {
        let wide: i128 = match self {
            WideInt::Signed(v) => i128::from(*v),
            WideInt::Unsigned(v) => i128::from(*v),
            WideInt::Float(v) if v.is_nan() => return None,
            WideInt::Float(v) => {
                return Some(v.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
            }
            WideInt::Digits(s) => return parse_digits(s.trim()),
        };
        Some(wide.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
    }
}

fn parse_digits(s: &str) -> Option<i32> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let saturated = match digits.parse::<i128>() {
        Ok(v) => v.min(i128::from(i32::MAX) + 1),
        // More digits than i128 holds
        Err(_) => i128::from(i32::MAX) + 1,
    };
    let signed = if negative { -saturated } else { saturated };
    Some(signed.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
}

/// Typed view of the raw search payload, every field optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub query_fields: Option<Vec<String>>,
    pub facets: Option<Vec<HashMap<String, Option<String>>>>,
    pub fields: Option<Vec<String>>,
    pub filters: Option<Value>,
    pub exists: Option<Value>,
    pub not_exists: Option<Value>,
    pub sort_by: Option<HashMap<String, Option<String>>>,
    pub offset: Option<WideInt>,
    pub limit: Option<WideInt>,
    pub group_query: Option<Vec<Map<String, Value>>>,
    pub soft_constraints: Option<HashMap<String, WideInt>>,
}

impl SearchRequest {
    /// Extract the known search keys from a raw payload.
    ///
    /// A key holding a value of the wrong shape is treated as absent.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        Self {
            query: field(raw, keys::QUERY),
            query_fields: field(raw, keys::QUERY_FIELDS),
            facets: field(raw, keys::FACETS),
            fields: field(raw, keys::FIELDS),
            filters: raw.get(keys::FILTERS).cloned(),
            exists: raw.get(keys::EXISTS).cloned(),
            not_exists: raw.get(keys::NOT_EXISTS).cloned(),
            sort_by: field(raw, keys::SORT_BY),
            offset: field(raw, keys::OFFSET),
            limit: field(raw, keys::LIMIT),
            group_query: field(raw, keys::GROUP_QUERY),
            soft_constraints: field(raw, keys::SOFT_CONSTRAINTS),
        }
    }
}

fn field<T: DeserializeOwned>(raw: &Map<String, Value>, key: &str) -> Option<T> {
    let value = raw.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Ignoring search field '{}' with unexpected shape: {}", key, e);
            None
        }
    }
}

/// Normalised search query handed to the storage query layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_fields: Option<Vec<String>>,

    /// Facet field to facet type; a null type means a plain terms facet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<HashMap<String, Option<String>>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    /// Filter, exists and not-exists clauses, keyed by their request key
    #[serde(default)]
    pub additional_properties: Map<String, Value>,

    /// Field to sort direction; a null direction leaves the default order
    #[serde(default)]
    pub sort_by: HashMap<String, Option<String>>,

    pub offset: i32,

    pub limit: i32,

    #[serde(default)]
    pub group_query: Vec<Map<String, Value>>,

    #[serde(default)]
    pub soft_constraints: HashMap<String, i32>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            query_fields: None,
            facets: None,
            fields: None,
            additional_properties: Map::new(),
            sort_by: HashMap::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            group_query: Vec::new(),
            soft_constraints: HashMap::new(),
        }
    }
}

impl SearchQuery {
    /// Normalise a JSON value; anything but an object yields the default query
    pub fn from_value(raw: &Value) -> Self {
        match raw.as_object() {
            Some(map) => normalize(map),
            None => {
                debug!("Search payload is not an object, using default query");
                Self::default()
            }
        }
    }

    pub fn filters(&self) -> Option<&Value> {
        self.additional_properties.get(keys::FILTERS)
    }

    pub fn exists(&self) -> Option<&Value> {
        self.additional_properties.get(keys::EXISTS)
    }

    pub fn not_exists(&self) -> Option<&Value> {
        self.additional_properties.get(keys::NOT_EXISTS)
    }

    /// Clamp paging so neither the page nor its end passes [`MAX_LIMIT`].
    ///
    /// The second clamp uses the already clamped limit. An offset beyond
    /// [`MAX_LIMIT`] leaves an empty page rather than a negative limit.
    fn clamp_paging(&mut self) {
        self.offset = self.offset.max(0);
        self.limit = self.limit.max(0);
        if self.limit > MAX_LIMIT {
            self.limit = MAX_LIMIT;
        }
        if self.offset.saturating_add(self.limit) > MAX_LIMIT {
            self.limit = (MAX_LIMIT - self.offset).max(0);
        }
    }
}

impl From<SearchRequest> for SearchQuery {
    fn from(request: SearchRequest) -> Self {
        let mut search = SearchQuery {
            query: request.query,
            query_fields: request.query_fields,
            facets: request.facets,
            fields: request.fields,
            ..SearchQuery::default()
        };

        for (key, value) in [
            (keys::FILTERS, request.filters),
            (keys::EXISTS, request.exists),
            (keys::NOT_EXISTS, request.not_exists),
        ] {
            if let Some(value) = value {
                search.additional_properties.insert(key.to_string(), value);
            }
        }

        if let Some(sort_by) = request.sort_by {
            search.sort_by.extend(sort_by);
        }
        if let Some(offset) = request.offset.as_ref().and_then(WideInt::to_i32) {
            search.offset = offset;
        }
        if let Some(limit) = request.limit.as_ref().and_then(WideInt::to_i32) {
            search.limit = limit;
        }
        search.clamp_paging();

        if let Some(group_query) = request.group_query {
            search.group_query.extend(group_query);
        }
        if let Some(constraints) = request.soft_constraints {
            search.soft_constraints = constraints
                .into_iter()
                .filter_map(|(key, weight)| match weight.to_i32() {
                    Some(weight) => Some((key, weight)),
                    None => {
                        debug!("Dropping soft constraint '{}' with non-integer weight", key);
                        None
                    }
                })
                .collect();
        }

        search
    }
}

/// Convert a raw search payload into a [`SearchQuery`]. Never fails.
pub fn normalize(raw: &Map<String, Value>) -> SearchQuery {
    SearchQuery::from(SearchRequest::from_map(raw))
}
