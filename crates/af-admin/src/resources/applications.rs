//! Service applications
//!
//! Bridging and local service applications share one record shape: a
//! namespace, the listening path live requests arrive under, and a
//! reference to the specification they were generated from. The two tokens
//! differ only in their backing collection.

use bson::Document;
use serde_json::{json, Map, Value};

use crate::criteria::{and_criteria, term_criteria, ListParams};
use crate::error::Result;
use crate::registry::{
    Action, CriteriaBuilder, ParamsBuilder, ResourceDescriptor, ResponseFormatter, UpdateContext,
};
use crate::serialize::{bson_to_json, datetime_field};
use crate::validation::{extract_data, FormatRules, Rule, Schema, ValueType};

pub fn descriptor(token: &'static str, collection: &'static str) -> ResourceDescriptor {
    ResourceDescriptor::new(token, collection)
        .with_criteria(ApplicationCriteria)
        .with_params(ApplicationParams)
        .with_formatter(ApplicationFormatter)
}

pub struct ApplicationCriteria;

impl CriteriaBuilder for ApplicationCriteria {
    fn build(&self, params: &ListParams) -> Document {
        let mut conditions = Vec::new();
        if let Some(term) = &params.term {
            conditions.push(term_criteria(&["namespace", "listening_path"], term));
        }
        and_criteria(conditions)
    }
}

fn create_schema() -> Schema {
    Schema::new()
        .allow(&[], &["namespace", "listening_path", "specification"])
        .allow(&["specification"], &["id", "title"])
        .rule(&[], Rule::required("namespace").expect(ValueType::String))
        .rule(&[], Rule::optional("listening_path").expect(ValueType::String))
        .rule(&[], Rule::required("specification").expect(ValueType::Object))
        .rule(&["specification"], Rule::required("id").expect(ValueType::String))
}

fn update_schema() -> Schema {
    Schema::new()
        .allow(&[], &["listening_path"])
        .rule(&[], Rule::required("listening_path").expect(ValueType::String))
}

/// Create takes a namespace plus the specification reference the app is
/// generated from; update can only move the listening path.
pub struct ApplicationParams;

impl ParamsBuilder for ApplicationParams {
    fn build(
        &self,
        action: Action,
        body: &Value,
        _ctx: Option<&UpdateContext>,
    ) -> Result<Document> {
        let mut data = extract_data(body)?;
        let schema = match action {
            Action::Create => create_schema(),
            Action::Update => update_schema(),
        };
        schema.validate(&mut data, &FormatRules::default())?;
        let fields = bson::to_document(&Value::Object(data))?;
        Ok(fields)
    }
}

pub struct ApplicationFormatter;

impl ResponseFormatter for ApplicationFormatter {
    fn format(&self, record: &Document, with_details: bool) -> Value {
        let mut out = Map::new();
        out.insert(
            "id".to_string(),
            json!(record.get_str("_id").unwrap_or_default()),
        );
        out.insert(
            "namespace".to_string(),
            json!(record.get_str("namespace").unwrap_or_default()),
        );
        out.insert(
            "listening_path".to_string(),
            json!(record.get_str("listening_path").unwrap_or_default()),
        );
        if with_details {
            if let Ok(token) = record.get_str("access_token") {
                out.insert("access_token".to_string(), json!(token));
            }
            out.insert("specification".to_string(), specification_ref(record));
            out.insert("services".to_string(), service_refs(record));
            if let Some(created) = datetime_field(record, "created_at") {
                out.insert("created_at".to_string(), json!(created));
            }
            if let Some(updated) = datetime_field(record, "updated_at") {
                out.insert("updated_at".to_string(), json!(updated));
            }
        }
        Value::Object(out)
    }
}

fn specification_ref(record: &Document) -> Value {
    match record.get_document("specification") {
        Ok(spec) => json!({
            "id": spec.get_str("id").unwrap_or_default(),
            "title": spec.get_str("title").unwrap_or_default(),
        }),
        Err(_) => Value::Null,
    }
}

fn service_refs(record: &Document) -> Value {
    if let Ok(services) = record.get_array("services") {
        let refs = services
            .iter()
            .filter_map(|s| s.as_document())
            .map(|s| {
                json!({
                    "id": s.get_str("id").unwrap_or_default(),
                    "listen": s.get("listen").map(bson_to_json).unwrap_or(Value::Null),
                    "active": s.get_bool("active").unwrap_or(false),
                })
            })
            .collect();
        return Value::Array(refs);
    }
    record
        .get_array("service_ids")
        .map(|ids| {
            Value::Array(
                ids.iter()
                    .map(|id| json!({ "id": bson_to_json(id) }))
                    .collect(),
            )
        })
        .unwrap_or_else(|_| json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_create_requires_namespace_and_specification() {
        let err = ApplicationParams
            .build(Action::Create, &json!({"data": {"namespace": "sales"}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "The parameter specification is required");

        let body = json!({"data": {
            "namespace": "sales",
            "specification": { "id": "spec-1" },
        }});
        let fields = ApplicationParams.build(Action::Create, &body, None).unwrap();
        assert_eq!(fields.get_str("namespace").unwrap(), "sales");
    }

    #[test]
    fn test_create_rejects_unknown_specification_key() {
        let body = json!({"data": {
            "namespace": "sales",
            "specification": { "id": "spec-1", "url": "http://x" },
        }});
        let err = ApplicationParams.build(Action::Create, &body, None).unwrap_err();
        assert_eq!(err.to_string(), "Unexpected 'url' parameter");
    }

    #[test]
    fn test_update_only_accepts_listening_path() {
        let err = ApplicationParams
            .build(Action::Update, &json!({"data": {"namespace": "x"}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected 'namespace' parameter");

        let fields = ApplicationParams
            .build(Action::Update, &json!({"data": {"listening_path": "billing"}}), None)
            .unwrap();
        assert_eq!(fields.get_str("listening_path").unwrap(), "billing");
    }

    #[test]
    fn test_formatter_details_add_references() {
        let record = doc! {
            "_id": "app-1",
            "namespace": "sales",
            "listening_path": "billing",
            "access_token": "tok",
            "specification": { "id": "spec-1", "title": "Billing API" },
            "service_ids": ["svc-1", "svc-2"],
        };
        let summary = ApplicationFormatter.format(&record, false);
        assert_eq!(summary["namespace"], json!("sales"));
        assert!(summary.get("access_token").is_none());

        let details = ApplicationFormatter.format(&record, true);
        assert_eq!(details["specification"]["title"], json!("Billing API"));
        assert_eq!(details["services"][1]["id"], json!("svc-2"));
        assert_eq!(details["access_token"], json!("tok"));
    }

    #[test]
    fn test_criteria_term_over_namespace_and_path() {
        let mut params = ListParams::default();
        params.term = Some("billing".to_string());
        let filter = ApplicationCriteria.build(&params);
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }
}
