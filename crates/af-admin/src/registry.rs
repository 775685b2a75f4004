//! Resource Registry
//!
//! Maps URL model tokens to descriptors carrying a collection name plus the
//! capability implementations (criteria builder, params builder, response
//! formatter) for that resource type. Unknown tokens resolve to
//! [`AdminError::InvalidModel`].

use std::collections::HashMap;
use std::sync::Arc;

use bson::Document;
use serde_json::Value;

use crate::criteria::{and_criteria, term_condition, ListParams};
use crate::error::{AdminError, Result};
use crate::serialize::record_to_json;
use crate::validation::{extract_data, FormatRules};

/// Write operation a params builder is validating for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
}

/// Context available to params builders during an update.
#[derive(Debug, Clone)]
pub struct UpdateContext {
    pub id: String,
    pub existing: Document,
}

/// Turns listing parameters into a MongoDB filter.
pub trait CriteriaBuilder: Send + Sync {
    fn build(&self, params: &ListParams) -> Document;
}

/// Validates a request body and produces the document fields to write.
pub trait ParamsBuilder: Send + Sync {
    fn build(&self, action: Action, body: &Value, ctx: Option<&UpdateContext>) -> Result<Document>;
}

/// Renders a stored record for a response body.
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, record: &Document, with_details: bool) -> Value;
}

/// No extra filters beyond an optional `term` substring match on `name`.
struct DefaultCriteria;

impl CriteriaBuilder for DefaultCriteria {
    fn build(&self, params: &ListParams) -> Document {
        let mut conditions = Vec::new();
        if let Some(term) = &params.term {
            conditions.push(term_condition("name", term));
        }
        and_criteria(conditions)
    }
}

/// Accepts any object body without an allow-list; create requires a
/// non-empty payload.
struct DefaultParams;

impl ParamsBuilder for DefaultParams {
    fn build(
        &self,
        action: Action,
        body: &Value,
        _ctx: Option<&UpdateContext>,
    ) -> Result<Document> {
        let data = extract_data(body)?;
        if action == Action::Create && data.is_empty() {
            return Err(AdminError::validation("The parameter data is required"));
        }
        let fields = bson::to_document(&Value::Object(data))?;
        Ok(fields)
    }
}

/// Renders every stored field; details add nothing.
struct DefaultFormatter;

impl ResponseFormatter for DefaultFormatter {
    fn format(&self, record: &Document, _with_details: bool) -> Value {
        record_to_json(record)
    }
}

/// Everything the generic handlers need to serve one resource type.
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub token: &'static str,
    pub collection: &'static str,
    pub criteria: Arc<dyn CriteriaBuilder>,
    pub params: Arc<dyn ParamsBuilder>,
    pub formatter: Arc<dyn ResponseFormatter>,
    pub format_rules: Arc<FormatRules>,
}

impl ResourceDescriptor {
    pub fn new(token: &'static str, collection: &'static str) -> Self {
        Self {
            token,
            collection,
            criteria: Arc::new(DefaultCriteria),
            params: Arc::new(DefaultParams),
            formatter: Arc::new(DefaultFormatter),
            format_rules: Arc::new(FormatRules::default()),
        }
    }

    pub fn with_criteria(mut self, criteria: impl CriteriaBuilder + 'static) -> Self {
        self.criteria = Arc::new(criteria);
        self
    }

    pub fn with_params(mut self, params: impl ParamsBuilder + 'static) -> Self {
        self.params = Arc::new(params);
        self
    }

    pub fn with_formatter(mut self, formatter: impl ResponseFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn with_format_rules(mut self, rules: FormatRules) -> Self {
        self.format_rules = Arc::new(rules);
        self
    }
}

/// Token to descriptor lookup for every admin endpoint.
#[derive(Default)]
pub struct ResourceRegistry {
    descriptors: HashMap<&'static str, Arc<ResourceDescriptor>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ResourceDescriptor) {
        self.descriptors
            .insert(descriptor.token, Arc::new(descriptor));
    }

    /// Register a second token resolving to an already-registered
    /// descriptor.
    pub fn register_alias(&mut self, alias: &'static str, token: &str) {
        if let Some(descriptor) = self.descriptors.get(token) {
            self.descriptors.insert(alias, Arc::clone(descriptor));
        }
    }

    pub fn resolve(&self, token: &str) -> Result<Arc<ResourceDescriptor>> {
        self.descriptors
            .get(token)
            .cloned()
            .ok_or(AdminError::InvalidModel)
    }

    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<&'static str> = self.descriptors.keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }
}
