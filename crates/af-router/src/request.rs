//! Inbound request extraction.
//!
//! Query-string parsing is independent of path matching; body parsing is
//! attempted opportunistically and never fails a match.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::template::PathTemplate;

/// Parse a raw query string into a flat mapping. `+` is treated as a space
/// and both keys and values are percent-decoded.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .unwrap_or(spaced)
}

/// A live inbound request reduced to the pieces service dispatch needs:
/// bound path parameters, flat query parameters, and an optional structured
/// payload. Computed fresh per request against one template.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub path_params: IndexMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub payload: Option<Value>,
}

impl ServiceRequest {
    /// Match `path` against `template` and, on success, extract the full
    /// request. A body that fails to parse as JSON leaves `payload` unset
    /// rather than aborting the match.
    pub fn extract(
        template: &PathTemplate,
        path: &str,
        query: &str,
        body: &[u8],
    ) -> Option<Self> {
        let matched = template.matches(path)?;
        Some(Self {
            path_params: matched.path_params,
            query_params: parse_query(query),
            payload: serde_json::from_slice(body).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_flat_mapping() {
        let params = parse_query("term=billing&offset=0&limit=5");
        assert_eq!(params["term"], "billing");
        assert_eq!(params["offset"], "0");
        assert_eq!(params["limit"], "5");
    }

    #[test]
    fn test_parse_query_decodes_components() {
        let params = parse_query("q=a%20b&name=x+y");
        assert_eq!(params["q"], "a b");
        assert_eq!(params["name"], "x y");
    }

    #[test]
    fn test_parse_query_empty_and_bare_keys() {
        let params = parse_query("");
        assert!(params.is_empty());

        let params = parse_query("flag&x=1");
        assert_eq!(params["flag"], "");
        assert_eq!(params["x"], "1");
    }

    #[test]
    fn test_extract_with_json_body() {
        let template = PathTemplate::compile("/orders/:id").unwrap();
        let request =
            ServiceRequest::extract(&template, "/orders/42", "qs=1", br#"{"total": 10}"#)
                .unwrap();
        assert_eq!(request.path_params["id"], "42");
        assert_eq!(request.query_params["qs"], "1");
        assert_eq!(request.payload.unwrap()["total"], 10);
    }

    #[test]
    fn test_extract_bad_body_leaves_payload_unset() {
        let template = PathTemplate::compile("/orders/:id").unwrap();
        let request =
            ServiceRequest::extract(&template, "/orders/42", "", b"not json").unwrap();
        assert!(request.payload.is_none());
    }

    #[test]
    fn test_extract_no_match_is_none() {
        let template = PathTemplate::compile("/orders/:id").unwrap();
        assert!(ServiceRequest::extract(&template, "/other/42", "", b"{}").is_none());
    }
}
