//! Record storage
//!
//! Records are loosely typed BSON documents keyed by a string `_id`. The
//! [`RecordStore`] trait is the seam the handlers talk through; the Mongo
//! implementation maps each resource descriptor to its collection.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::Database;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::criteria::ListParams;
use crate::error::Result;
use crate::registry::ResourceDescriptor;

/// Every call receives the authenticated [`RequestContext`] explicitly;
/// implementations never read identity from ambient state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        id: &str,
    ) -> Result<Option<Document>>;

    async fn query(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        filter: Document,
        params: &ListParams,
    ) -> Result<Vec<Document>>;

    async fn count(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        filter: Document,
    ) -> Result<u64>;

    /// Insert `fields` as a new record, returning the stored document with
    /// its generated id and timestamps.
    async fn create(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        fields: Document,
    ) -> Result<Document>;

    /// Merge `fields` over the existing record, returning the stored
    /// document. The caller has already confirmed the record exists.
    async fn update(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        existing: Document,
        fields: Document,
    ) -> Result<Document>;

    async fn delete(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        id: &str,
    ) -> Result<()>;
}

/// Apply update fields over a stored record: top-level keys are replaced,
/// `id`/`_id` from the payload are ignored, `updated_at` is bumped.
pub fn merge_fields(existing: &Document, fields: Document) -> Document {
    let mut merged = existing.clone();
    for (key, value) in fields {
        if key == "id" || key == "_id" {
            continue;
        }
        merged.insert(key, value);
    }
    merged.insert("updated_at", Bson::DateTime(bson::DateTime::now()));
    merged
}

/// Stamp a new record: generated string id plus creation timestamps.
/// Caller-supplied `id`/`_id` fields are discarded.
pub fn new_record(fields: Document) -> Document {
    let mut record = Document::new();
    record.insert("_id", Uuid::new_v4().to_string());
    for (key, value) in fields {
        if key == "id" || key == "_id" {
            continue;
        }
        record.insert(key, value);
    }
    let now = Bson::DateTime(bson::DateTime::now());
    record.insert("created_at", now.clone());
    record.insert("updated_at", now);
    record
}

pub struct MongoRecordStore {
    db: Database,
}

impl MongoRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, descriptor: &ResourceDescriptor) -> mongodb::Collection<Document> {
        self.db.collection(descriptor.collection)
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn find(
        &self,
        _ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        id: &str,
    ) -> Result<Option<Document>> {
        let record = self
            .collection(descriptor)
            .find_one(doc! { "_id": id })
            .await?;
        Ok(record)
    }

    async fn query(
        &self,
        _ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        filter: Document,
        params: &ListParams,
    ) -> Result<Vec<Document>> {
        let cursor = self
            .collection(descriptor)
            .find(filter)
            .sort(params.sort.clone())
            .skip(params.offset)
            .limit(params.limit)
            .await?;
        let records = cursor.try_collect().await?;
        Ok(records)
    }

    async fn count(
        &self,
        _ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        filter: Document,
    ) -> Result<u64> {
        let total = self.collection(descriptor).count_documents(filter).await?;
        Ok(total)
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        fields: Document,
    ) -> Result<Document> {
        let mut record = new_record(fields);
        record.insert("tenant_id", ctx.tenant_id.clone());
        self.collection(descriptor).insert_one(&record).await?;
        Ok(record)
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        existing: Document,
        fields: Document,
    ) -> Result<Document> {
        let merged = merge_fields(&existing, fields);
        let id = merged.get_str("_id").unwrap_or_default().to_string();
        self.collection(descriptor)
            .replace_one(doc! { "_id": id }, &merged)
            .await?;
        Ok(merged)
    }

    async fn delete(
        &self,
        _ctx: &RequestContext,
        descriptor: &ResourceDescriptor,
        id: &str,
    ) -> Result<()> {
        self.collection(descriptor)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_stamps_id_and_timestamps() {
        let record = new_record(doc! { "name": "hook", "id": "attacker-chosen" });
        let id = record.get_str("_id").unwrap();
        assert_eq!(id.len(), 36);
        assert_ne!(id, "attacker-chosen");
        assert_eq!(record.get_str("name").unwrap(), "hook");
        assert!(record.get_datetime("created_at").is_ok());
        assert!(record.get_datetime("updated_at").is_ok());
    }

    #[test]
    fn test_merge_replaces_top_level_and_keeps_rest() {
        let existing = doc! {
            "_id": "abc",
            "listen": { "method": "get", "path": "/old" },
            "active": true,
            "created_at": bson::DateTime::from_millis(0),
        };
        let merged = merge_fields(
            &existing,
            doc! { "listen": { "method": "post", "path": "/new" }, "id": "evil" },
        );
        assert_eq!(merged.get_str("_id").unwrap(), "abc");
        assert_eq!(
            merged.get_document("listen").unwrap().get_str("path").unwrap(),
            "/new"
        );
        assert_eq!(merged.get_bool("active").unwrap(), true);
        assert!(merged.get_datetime("updated_at").is_ok());
    }
}
