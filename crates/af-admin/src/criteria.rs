//! Listing criteria
//!
//! Query-string parameters shared by every listing endpoint, and helpers
//! for building MongoDB filter documents from them.

use std::collections::HashMap;

use bson::{doc, Document};

/// Page size applied when the request carries no usable `limit`.
pub const DEFAULT_LIMIT: i64 = 10;

/// Parsed listing parameters. Resource-specific criteria builders read the
/// typed fields plus `raw` for any extra filters they recognise.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub term: Option<String>,
    pub app_id: Option<String>,
    pub offset: u64,
    pub limit: i64,
    pub sort: Document,
    pub without_data: bool,
    pub format: Option<String>,
    pub raw: HashMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            term: None,
            app_id: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: doc! { "created_at": -1 },
            without_data: false,
            format: None,
            raw: HashMap::new(),
        }
    }
}

impl ListParams {
    /// Build from already-decoded query parameters. Unusable numeric values
    /// fall back to the defaults rather than failing the request.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut params = Self::default();

        params.term = non_blank(query.get("term"));
        params.app_id = non_blank(query.get("app_id"));
        params.format = non_blank(query.get("format"));

        if let Some(offset) = query.get("offset").and_then(|v| v.parse::<u64>().ok()) {
            params.offset = offset;
        }
        if let Some(limit) = query.get("limit").and_then(|v| v.parse::<i64>().ok()) {
            params.limit = limit.max(0);
        }
        if let Some(sort) = non_blank(query.get("sort")) {
            params.sort = build_sort(&sort);
        }
        params.without_data = query
            .get("without_data")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        params.raw = query.clone();
        params
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse `field` or `field:asc,other:desc` into a sort document, keeping
/// field order. Unknown directions sort ascending.
pub fn build_sort(spec: &str) -> Document {
    let mut sort = Document::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (field, direction) = match part.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim()),
            None => (part, "asc"),
        };
        if field.is_empty() {
            continue;
        }
        let order = if direction.eq_ignore_ascii_case("desc") { -1 } else { 1 };
        sort.insert(field, order);
    }
    if sort.is_empty() {
        doc! { "created_at": -1 }
    } else {
        sort
    }
}

/// Case-insensitive substring condition on one field. The term is escaped
/// so it matches literally rather than as a pattern.
pub fn term_condition(field: &str, term: &str) -> Document {
    doc! { field: { "$regex": regex::escape(term), "$options": "i" } }
}

/// `$or` of substring conditions over several fields, for search terms.
pub fn term_criteria(fields: &[&str], term: &str) -> Document {
    let conditions: Vec<Document> = fields
        .iter()
        .map(|field| term_condition(field, term))
        .collect();
    doc! { "$or": conditions }
}

/// Combine non-empty condition documents with `$and`. Zero conditions is
/// an empty filter; a single condition is returned as-is.
pub fn and_criteria(conditions: Vec<Document>) -> Document {
    let mut conditions: Vec<Document> = conditions.into_iter().filter(|c| !c.is_empty()).collect();
    match conditions.len() {
        0 => Document::new(),
        1 => conditions.remove(0),
        _ => doc! { "$and": conditions },
    }
}
