//! API specifications
//!
//! Stored specification documents: a title plus the raw specification text
//! applications are generated from. Addressable as `open_api_spec` with
//! `api_spec` kept as an alias.

use bson::Document;
use serde_json::{json, Map, Value};

use crate::criteria::{and_criteria, term_condition, ListParams};
use crate::error::Result;
use crate::registry::{
    Action, CriteriaBuilder, ParamsBuilder, ResourceDescriptor, ResponseFormatter, UpdateContext,
};
use crate::serialize::datetime_field;
use crate::validation::{extract_data, FormatRules, Rule, Schema, ValueType};

pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("open_api_spec", "specifications")
        .with_criteria(SpecificationCriteria)
        .with_params(SpecificationParams)
        .with_formatter(SpecificationFormatter)
}

pub struct SpecificationCriteria;

impl CriteriaBuilder for SpecificationCriteria {
    fn build(&self, params: &ListParams) -> Document {
        let mut conditions = Vec::new();
        if let Some(term) = &params.term {
            conditions.push(term_condition("title", term));
        }
        and_criteria(conditions)
    }
}

fn schema(action: Action) -> Schema {
    let title = Rule {
        required: action == Action::Create,
        ..Rule::required("title").expect(ValueType::String)
    };
    let specification = Rule {
        required: action == Action::Create,
        ..Rule::required("specification").expect(ValueType::String)
    };
    Schema::new()
        .allow(&[], &["title", "specification"])
        .rule(&[], title)
        .rule(&[], specification)
}

pub struct SpecificationParams;

impl ParamsBuilder for SpecificationParams {
    fn build(
        &self,
        action: Action,
        body: &Value,
        _ctx: Option<&UpdateContext>,
    ) -> Result<Document> {
        let mut data = extract_data(body)?;
        schema(action).validate(&mut data, &FormatRules::default())?;
        let fields = bson::to_document(&Value::Object(data))?;
        Ok(fields)
    }
}

/// The raw specification text is large; only details include it.
pub struct SpecificationFormatter;

impl ResponseFormatter for SpecificationFormatter {
    fn format(&self, record: &Document, with_details: bool) -> Value {
        let mut out = Map::new();
        out.insert(
            "id".to_string(),
            json!(record.get_str("_id").unwrap_or_default()),
        );
        out.insert(
            "title".to_string(),
            json!(record.get_str("title").unwrap_or_default()),
        );
        if with_details {
            out.insert(
                "specification".to_string(),
                json!(record.get_str("specification").unwrap_or_default()),
            );
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

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_create_requires_title_and_specification() {
        let err = SpecificationParams
            .build(Action::Create, &json!({"data": {"title": "Billing"}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "The parameter specification is required");
    }

    #[test]
    fn test_update_fields_are_optional() {
        let fields = SpecificationParams
            .build(Action::Update, &json!({"data": {"title": "Billing v2"}}), None)
            .unwrap();
        assert_eq!(fields.get_str("title").unwrap(), "Billing v2");
        assert!(fields.get_str("specification").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SpecificationParams
            .build(Action::Create, &json!({"data": {"version": 3}}), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected 'version' parameter");
    }

    #[test]
    fn test_formatter_hides_body_in_summaries() {
        let record = doc! {
            "_id": "spec-1",
            "title": "Billing API",
            "specification": "openapi: 3.0.0",
        };
        let summary = SpecificationFormatter.format(&record, false);
        assert!(summary.get("specification").is_none());
        let details = SpecificationFormatter.format(&record, true);
        assert_eq!(details["specification"], json!("openapi: 3.0.0"));
    }
}
