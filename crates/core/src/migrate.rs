//! Multi-step schema workflows composed from [`SchemaClient`] operations.
//!
//! The remote API has no transactions, so none of these workflows roll back.
//! Each step runs only after the previous one succeeded, and the first failure
//! aborts the workflow, leaving the remote state at the last completed step.
//!
//! # Field rename
//!
//! 1. read the old field's definition
//! 2. refuse to continue if the new field already exists
//! 3. create the new field from the old definition
//! 4. copy every non-null value from the old field to the new one
//! 5. drop the old field
//!
//! Items whose old value is absent or null are skipped, never nulled out in
//! the new field. A failure during step 4 leaves the data partially copied and
//! the old field intact. Re-running the rename then stops at step 2; finish by
//! hand with [`Migrator::copy_field_data`] and [`SchemaClient::drop_field`].

use serde_json::Value;
use tracing::info;

use crate::accessor::SchemaClient;
use crate::diff::{DiffOutcome, DiffReporter};
use crate::error::AdminError;
use crate::model::{CollectionDefinition, RelationDescriptor};
use crate::transport::Transport;

pub struct Migrator<T> {
    client: SchemaClient<T>,
    reporter: DiffReporter,
}

impl<T: Transport> Migrator<T> {
    pub fn new(client: SchemaClient<T>, reporter: DiffReporter) -> Self {
        Migrator { client, reporter }
    }

    pub fn client(&self) -> &SchemaClient<T> {
        &self.client
    }

    pub fn reporter(&self) -> &DiffReporter {
        &self.reporter
    }

    /// Rename `old_field` to `new_field` by copy-then-drop. Returns the number
    /// of items whose value was copied.
    pub fn rename_field(
        &self,
        collection: &str,
        old_field: &str,
        new_field: &str,
    ) -> Result<usize, AdminError> {
        if old_field == new_field {
            return Err(AdminError::validation(format!(
                "cannot rename field '{}' in collection '{}' to itself",
                old_field, collection
            )));
        }

        info!(collection, old_field, new_field, "renaming field");

        let definition = self.client.get_field_definition(collection, old_field)?;

        if self.client.field_exists(collection, new_field)? {
            return Err(AdminError::validation(format!(
                "field '{new}' already exists in collection '{c}'; a previous rename may have \
                 stopped part way. Finish it with `copy_field_data {c} {old} {new}` followed by \
                 `drop_field {c} {old}`",
                c = collection,
                old = old_field,
                new = new_field
            )));
        }

        info!(collection, field = new_field, "creating field");
        self.client
            .create_field_from(collection, new_field, &definition)?;

        info!(collection, old_field, new_field, "moving data");
        let copied = self.copy_field_data(collection, old_field, new_field)?;

        self.client.drop_field(collection, old_field)?;
        info!(collection, old_field, new_field, copied, "rename complete");
        Ok(copied)
    }

    /// Copy every present, non-null value of `from_field` into `to_field`.
    ///
    /// Stops at the first item whose update does not return 200; items updated
    /// before that point stay updated.
    pub fn copy_field_data(
        &self,
        collection: &str,
        from_field: &str,
        to_field: &str,
    ) -> Result<usize, AdminError> {
        let items = self.client.list_items(collection, &["id", from_field])?;

        let mut copied = 0;
        for item in &items {
            let Some(value) = item.value(from_field) else {
                continue;
            };
            let response = self
                .client
                .update_item_field(collection, item.id, to_field, value)?;
            if response.status != 200 {
                return Err(AdminError::Remote {
                    context: format!(
                        "PATCH /items/{}/{} (field '{}', {} of {} items copied)",
                        collection,
                        item.id,
                        to_field,
                        copied,
                        items.len()
                    ),
                    status: response.status,
                    body: response.body,
                });
            }
            copied += 1;
        }
        Ok(copied)
    }

    /// PATCH a collection and report whether its definition actually changed.
    pub fn patch(&self, schema: &CollectionDefinition) -> Result<DiffOutcome, AdminError> {
        let collection = schema.name();
        info!(collection, "patching collection");

        let before = self.client.get_collection(collection)?;
        self.client.patch_collection(collection, schema.document())?;
        let after = self.client.get_collection(collection)?;

        let outcome = self.reporter.compare(collection, &before, &after)?;
        info!(collection, "patched collection");
        Ok(outcome)
    }

    /// Parse a schema document and PATCH the collection it names.
    pub fn patch_document(&self, document: Value) -> Result<DiffOutcome, AdminError> {
        self.patch(&CollectionDefinition::from_document(document)?)
    }

    /// Delete every M2O relation matching the descriptor. Returns how many
    /// were deleted; finding none is not an error.
    pub fn delete_m2o_relation(&self, relation: &RelationDescriptor) -> Result<usize, AdminError> {
        info!(%relation, "deleting relations");
        let ids = self.client.find_relations(relation)?;
        if ids.is_empty() {
            return Ok(0);
        }
        self.client.delete_relations_by_id(&ids)?;
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, ScriptedTransport};
    use serde_json::json;

    fn migrator(dir: &std::path::Path) -> Migrator<ScriptedTransport> {
        Migrator::new(
            SchemaClient::new(ScriptedTransport::new()),
            DiffReporter::new(dir),
        )
    }

    #[test]
    fn rename_to_same_name_is_rejected_locally() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        let err = m.rename_field("posts", "title", "title").unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
        assert!(m.client().transport().requests().is_empty());
    }

    #[test]
    fn rename_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        m.client()
            .transport()
            .respond_json(200, json!({"data": {"id": 1, "field": "title", "datatype": "VARCHAR"}}))
            .respond_json(200, json!({"data": {"id": 2, "field": "headline", "datatype": "VARCHAR"}}));

        let err = m.rename_field("posts", "title", "headline").unwrap_err();

        assert!(matches!(err, AdminError::Validation { .. }));
        let msg = err.to_string();
        assert!(msg.contains("copy_field_data posts title headline"));
        assert!(msg.contains("drop_field posts title"));
        assert!(m.client().transport().requests_with(Method::Post).is_empty());
    }

    #[test]
    fn copy_stops_at_first_failed_update() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        m.client()
            .transport()
            .respond_json(200, json!({"data": [{"id": 1, "f": "a"}, {"id": 2, "f": "b"}, {"id": 3, "f": "c"}]}))
            .respond(200, "{}")
            .respond(403, "{\"error\":\"forbidden\"}");

        let err = m.copy_field_data("posts", "f", "g").unwrap_err();

        match err {
            AdminError::Remote { status, context, .. } => {
                assert_eq!(status, 403);
                assert!(context.contains("/items/posts/2"));
                assert!(context.contains("1 of 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(m.client().transport().requests_with(Method::Patch).len(), 2);
    }

    #[test]
    fn patch_rejects_document_without_collection() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        let err = m.patch_document(json!({"fields": []})).unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
        assert!(m.client().transport().requests().is_empty());
    }

    #[test]
    fn patch_failure_skips_after_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        m.client()
            .transport()
            .respond_json(200, json!({"data": {"collection": "posts"}}))
            .respond(422, "{\"error\":\"invalid\"}");

        let err = m
            .patch_document(json!({"collection": "posts", "note": "x"}))
            .unwrap_err();

        assert!(matches!(err, AdminError::Remote { status: 422, .. }));
        assert_eq!(m.client().transport().requests().len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn delete_with_no_matching_relation_sends_no_delete() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        m.client().transport().respond_json(200, json!({"data": []}));

        let deleted = m
            .delete_m2o_relation(&RelationDescriptor::new("posts", "author", "users", None))
            .unwrap();

        assert_eq!(deleted, 0);
        assert!(m.client().transport().requests_with(Method::Delete).is_empty());
    }
}
