//! Bridging services
//!
//! A bridging service declares a listen endpoint (method plus path
//! template) and a target endpoint it forwards to. Services are created by
//! application setup; the admin surface only lists, inspects, updates, and
//! deletes them.

use bson::{doc, Bson, Document};
use serde_json::{json, Map, Value};

use crate::criteria::{and_criteria, term_criteria, ListParams};
use crate::error::{AdminError, Result};
use crate::registry::{
    Action, CriteriaBuilder, ParamsBuilder, ResourceDescriptor, ResponseFormatter, UpdateContext,
};
use crate::serialize::{bson_to_json, datetime_field};
use crate::validation::{extract_data, FormatRules, FormatSpec, Rule, Schema, ValueType};

pub const SERVICE_METHODS: &[&str] = &["get", "post", "put", "delete"];

/// Segments of word characters and hyphens, each optionally a `:name`
/// placeholder, with an optional leading slash.
pub const SERVICE_PATH_PATTERN: &str = r"(?i)^/?:?\w[\w-]*(/:?\w[\w-]*)*$";

pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("bridging_services", "bridging_services")
        .with_criteria(ServiceCriteria)
        .with_params(BridgingServiceParams)
        .with_formatter(ServiceFormatter)
}

/// Local services share the listen/target record shape and search fields
/// but keep the permissive default write schema.
pub fn local_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("local_services", "local_services")
        .with_criteria(ServiceCriteria)
        .with_formatter(ServiceFormatter)
}

/// `term` searches the listen endpoint; `app_id` narrows to one
/// application.
pub struct ServiceCriteria;

impl CriteriaBuilder for ServiceCriteria {
    fn build(&self, params: &ListParams) -> Document {
        let mut conditions = Vec::new();
        if let Some(term) = &params.term {
            conditions.push(term_criteria(&["listen.method", "listen.path"], term));
        }
        if let Some(app_id) = &params.app_id {
            conditions.push(doc! { "application_id": app_id });
        }
        and_criteria(conditions)
    }
}

fn update_schema() -> Schema {
    Schema::new()
        .allow(&[], &["listen", "target"])
        .allow(&["listen"], &["method", "path"])
        .allow(&["target"], &["headers", "parameters", "template_parameters"])
        .rule(&[], Rule::required("listen").expect(ValueType::Object))
        .rule(&[], Rule::optional("target").expect(ValueType::Object))
        .rule(
            &["listen"],
            Rule::required("method")
                .expect(ValueType::String)
                .format(FormatSpec::OneOf(SERVICE_METHODS)),
        )
        .rule(
            &["listen"],
            Rule::required("path")
                .expect(ValueType::String)
                .format(FormatSpec::Pattern(SERVICE_PATH_PATTERN)),
        )
        .rule(&["target"], Rule::optional("headers").expect(ValueType::Array))
        .rule(&["target"], Rule::optional("parameters").expect(ValueType::Array))
        .rule(
            &["target"],
            Rule::optional("template_parameters").expect(ValueType::Array),
        )
}

/// Bridging services cannot be created directly; they are provisioned by
/// application setup. Updates validate against the narrow listen/target
/// schema; a `target` patch merges over the stored target so its id, path,
/// and method survive (the allow-list never lets the client resend them).
pub struct BridgingServiceParams;

impl ParamsBuilder for BridgingServiceParams {
    fn build(
        &self,
        action: Action,
        body: &Value,
        ctx: Option<&UpdateContext>,
    ) -> Result<Document> {
        if action == Action::Create {
            return Err(AdminError::unimplemented("Service not available"));
        }
        let mut data = extract_data(body)?;
        update_schema().validate(&mut data, &FormatRules::default())?;
        let mut fields = bson::to_document(&Value::Object(data))?;
        if let Some(ctx) = ctx {
            let patch = fields.get_document("target").ok().cloned();
            let stored = ctx.existing.get_document("target").ok().cloned();
            if let (Some(patch), Some(stored)) = (patch, stored) {
                let mut merged = stored;
                for (key, value) in patch {
                    merged.insert(key, value);
                }
                fields.insert("target", merged);
            }
        }
        Ok(fields)
    }
}

pub struct ServiceFormatter;

impl ResponseFormatter for ServiceFormatter {
    fn format(&self, record: &Document, with_details: bool) -> Value {
        let mut out = Map::new();
        out.insert(
            "id".to_string(),
            json!(record.get_str("_id").unwrap_or_default()),
        );
        out.insert("listen".to_string(), endpoint(record, "listen"));
        out.insert("target".to_string(), endpoint(record, "target"));
        out.insert(
            "active".to_string(),
            json!(record.get_bool("active").unwrap_or(false)),
        );
        out.insert("priority".to_string(), priority(record));
        out.insert("application".to_string(), application_ref(record));
        if with_details {
            for key in ["parameters", "headers", "template_parameters"] {
                out.insert(key.to_string(), kvd_list(record, key));
            }
        }
        if let Some(created) = datetime_field(record, "created_at") {
            out.insert("created_at".to_string(), json!(created));
        }
        if let Some(updated) = datetime_field(record, "updated_at") {
            out.insert("updated_at".to_string(), json!(updated));
        }
        Value::Object(out)
    }
}

fn endpoint(record: &Document, field: &str) -> Value {
    match record.get_document(field) {
        Ok(ep) => json!({
            "method": ep.get_str("method").unwrap_or_default(),
            "path": ep.get_str("path").unwrap_or_default(),
        }),
        Err(_) => Value::Null,
    }
}

fn priority(record: &Document) -> Value {
    match record.get("priority") {
        Some(value) => bson_to_json(value),
        None => json!(0),
    }
}

fn application_ref(record: &Document) -> Value {
    if let Ok(app) = record.get_document("application") {
        return bson_to_json(&Bson::Document(app.clone()));
    }
    json!({ "id": record.get_str("application_id").unwrap_or_default() })
}

/// Key/value/description triples declared on the target endpoint.
fn kvd_list(record: &Document, key: &str) -> Value {
    record
        .get_document("target")
        .ok()
        .and_then(|target| target.get_array(key).ok())
        .map(|items| Value::Array(items.iter().map(bson_to_json).collect()))
        .unwrap_or_else(|| json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Document {
        doc! {
            "_id": "svc-1",
            "listen": { "method": "get", "path": "/orders/:id" },
            "target": {
                "method": "get",
                "path": "/internal/orders/:id",
                "headers": [{ "key": "Accept", "value": "application/json", "description": "" }],
            },
            "active": true,
            "priority": 2,
            "application_id": "app-1",
            "created_at": bson::DateTime::from_millis(0),
        }
    }

    #[test]
    fn test_create_is_not_available() {
        let err = BridgingServiceParams
            .build(Action::Create, &json!({"data": {}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Service not available");
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn test_update_rejects_unexpected_key() {
        let err = BridgingServiceParams
            .build(Action::Update, &json!({"data": {"owner": "x"}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected 'owner' parameter");
    }

    #[test]
    fn test_update_rejects_bad_method() {
        let body = json!({"data": {"listen": {"method": "patch", "path": "/x"}}});
        let err = BridgingServiceParams
            .build(Action::Update, &body, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "The parameter data[listen][method] is not valid");
    }

    #[test]
    fn test_update_rejects_bad_path() {
        let body = json!({"data": {"listen": {"method": "get", "path": "/a//b"}}});
        let err = BridgingServiceParams
            .build(Action::Update, &body, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "The parameter data[listen][path] is not valid");
    }

    #[test]
    fn test_update_accepts_valid_body() {
        let body = json!({"data": {
            "listen": { "method": "post", "path": "/users/:id/orders" },
            "target": { "headers": [] },
        }});
        let fields = BridgingServiceParams.build(Action::Update, &body, None).unwrap();
        let listen = fields.get_document("listen").unwrap();
        assert_eq!(listen.get_str("method").unwrap(), "post");
    }

    #[test]
    fn test_update_preserves_stored_target_fields() {
        let existing = doc! {
            "_id": "svc-1",
            "listen": { "method": "get", "path": "/orders/:id" },
            "target": {
                "id": "tgt-1",
                "method": "get",
                "path": "/internal/orders/:id",
                "headers": [{ "key": "X-Trace", "value": "1", "description": "" }],
            },
        };
        let ctx = UpdateContext {
            id: "svc-1".to_string(),
            existing: existing.clone(),
        };
        let body = json!({"data": {
            "listen": { "method": "get", "path": "/orders/:id" },
            "target": { "headers": [] },
        }});

        let fields = BridgingServiceParams
            .build(Action::Update, &body, Some(&ctx))
            .unwrap();
        let merged = crate::repository::merge_fields(&existing, fields);

        let target = merged.get_document("target").unwrap();
        assert_eq!(target.get_str("id").unwrap(), "tgt-1");
        assert_eq!(target.get_str("path").unwrap(), "/internal/orders/:id");
        assert_eq!(target.get_str("method").unwrap(), "get");
        assert!(target.get_array("headers").unwrap().is_empty());
    }

    #[test]
    fn test_criteria_combines_term_and_app() {
        let mut params = ListParams::default();
        params.term = Some("orders".to_string());
        params.app_id = Some("app-1".to_string());
        let filter = ServiceCriteria.build(&params);
        let and = filter.get_array("$and").unwrap();
        assert_eq!(and.len(), 2);
    }

    #[test]
    fn test_empty_criteria_matches_all() {
        assert!(ServiceCriteria.build(&ListParams::default()).is_empty());
    }

    #[test]
    fn test_formatter_summary_and_details() {
        let summary = ServiceFormatter.format(&record(), false);
        assert_eq!(summary["id"], json!("svc-1"));
        assert_eq!(summary["listen"]["path"], json!("/orders/:id"));
        assert_eq!(summary["application"]["id"], json!("app-1"));
        assert!(summary.get("headers").is_none());

        let details = ServiceFormatter.format(&record(), true);
        assert_eq!(details["headers"][0]["key"], json!("Accept"));
        assert_eq!(details["parameters"], json!([]));
    }
}
