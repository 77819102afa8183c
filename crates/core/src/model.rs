//! Typed views over the JSON documents exchanged with the Directus API.
//!
//! None of these are persisted locally; the remote API is the single source
//! of truth and these types only give names to the attributes the engine
//! reads or rewrites.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AdminError;
use crate::query::{FilterOp, Query};

// ──────────────────────────────────────────────
// FieldDefinition
// ──────────────────────────────────────────────

/// Attributes assigned by the server that must not be replayed into a create call.
pub const SERVER_ASSIGNED_ATTRIBUTES: [&str; 3] = ["collection", "id", "group"];

/// A field's schema document, e.g. `{"field": "title", "datatype": "VARCHAR", "length": 200}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition(Map<String, Value>);

impl FieldDefinition {
    pub fn from_document(document: Map<String, Value>) -> Self {
        FieldDefinition(document)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("field").and_then(Value::as_str)
    }

    pub fn datatype(&self) -> Option<&str> {
        self.0.get("datatype").and_then(Value::as_str)
    }

    /// Free-text datatype (`TEXT`, case-insensitive).
    pub fn is_text(&self) -> bool {
        self.datatype()
            .is_some_and(|d| d.eq_ignore_ascii_case("TEXT"))
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    /// Drop `collection`, `id` and `group`.
    pub fn without_server_attributes(mut self) -> Self {
        for attr in SERVER_ASSIGNED_ATTRIBUTES {
            self.0.remove(attr);
        }
        self
    }

    /// Copy of this definition ready to be POSTed as a new field named `new_name`.
    ///
    /// A fixed `length` on a TEXT field is rejected by the API on creation,
    /// so it is stripped. Every other attribute is kept verbatim.
    pub fn prepared_for_create(&self, new_name: &str) -> Self {
        let mut copy = self.0.clone();
        if self.is_text() {
            copy.remove("length");
        }
        copy.insert("field".to_string(), Value::String(new_name.to_string()));
        FieldDefinition(copy)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_document(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

// ──────────────────────────────────────────────
// CollectionDefinition
// ──────────────────────────────────────────────

/// A collection schema document. Its name is read from the `collection` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDefinition {
    name: String,
    document: Value,
}

impl CollectionDefinition {
    pub fn from_document(document: Value) -> Result<Self, AdminError> {
        let name = match document.get("collection") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(other) => {
                return Err(AdminError::validation(format!(
                    "schema attribute 'collection' must be a non-empty string, found {}",
                    other
                )))
            }
            None => {
                return Err(AdminError::validation(
                    "cannot find 'collection' attribute in schema document",
                ))
            }
        };
        Ok(CollectionDefinition { name, document })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

// ──────────────────────────────────────────────
// RelationDescriptor
// ──────────────────────────────────────────────

/// A many-to-one link, optionally qualified by the field on the "one" side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDescriptor {
    #[serde(rename = "collection_many")]
    pub many_collection: String,
    #[serde(rename = "field_many")]
    pub many_field: String,
    #[serde(rename = "collection_one")]
    pub one_collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_one: Option<String>,
}

impl RelationDescriptor {
    pub fn new(
        many_collection: &str,
        many_field: &str,
        one_collection: &str,
        field_one: Option<&str>,
    ) -> Self {
        RelationDescriptor {
            many_collection: many_collection.to_string(),
            many_field: many_field.to_string(),
            one_collection: one_collection.to_string(),
            field_one: field_one.map(str::to_string),
        }
    }

    /// Filter selecting the ids of every relation matching this descriptor.
    ///
    /// Without `field_one` the match requires `field_one IS NULL`. With it,
    /// the match requires `field_one = value AND junction_field IS NULL`, which
    /// excludes junction-style (M2M) relations sharing the same fields.
    pub fn lookup_query(&self) -> Query {
        let query = Query::new()
            .fields(&["id"])
            .filter("collection_many", FilterOp::Eq, &self.many_collection)
            .filter("field_many", FilterOp::Eq, &self.many_field)
            .filter("collection_one", FilterOp::Eq, &self.one_collection);

        match &self.field_one {
            None => query.filter_null("field_one"),
            Some(field_one) => query
                .filter("field_one", FilterOp::Eq, field_one)
                .filter_null("junction_field"),
        }
    }
}

impl std::fmt::Display for RelationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}",
            self.many_collection, self.many_field, self.one_collection
        )?;
        if let Some(field_one) = &self.field_one {
            write!(f, ".{}", field_one)?;
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Item
// ──────────────────────────────────────────────

/// A row of a collection as returned by `GET /items/{collection}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u64,
    values: Map<String, Value>,
}

impl Item {
    /// Read an item from a JSON object. Returns `None` when the value is not
    /// an object or carries no numeric `id`.
    pub fn from_document(document: &Value) -> Option<Self> {
        let values = document.as_object()?;
        let id = match values.get("id")? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };
        Some(Item {
            id,
            values: values.clone(),
        })
    }

    /// Value of `field`, or `None` when it is absent or JSON null.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }
}

// ──────────────────────────────────────────────
// Documents on disk
// ──────────────────────────────────────────────

/// Read and parse a JSON document from a caller-supplied file.
pub fn load_document(path: &Path) -> Result<Value, AdminError> {
    if !path.exists() {
        return Err(AdminError::validation(format!(
            "file '{}' doesn't exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        AdminError::validation(format!("cannot read file '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AdminError::validation(format!("invalid JSON in '{}': {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(doc: Value) -> FieldDefinition {
        match doc {
            Value::Object(map) => FieldDefinition::from_document(map),
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn text_field_loses_length_on_create() {
        let def = field(json!({"field": "body", "datatype": "text", "length": 65535, "note": "x"}));
        let created = def.prepared_for_create("content");
        assert_eq!(created.name(), Some("content"));
        assert!(created.get("length").is_none());
        assert_eq!(created.get("note"), Some(&json!("x")));
    }

    #[test]
    fn varchar_field_keeps_length_on_create() {
        let def = field(json!({"field": "title", "datatype": "VARCHAR", "length": 200}));
        let created = def.prepared_for_create("headline");
        assert_eq!(created.get("length"), Some(&json!(200)));
        assert_eq!(created.get("datatype"), Some(&json!("VARCHAR")));
    }

    #[test]
    fn length_is_kept_for_every_datatype_but_text() {
        let cases: [(Option<&str>, bool); 7] = [
            (Some("text"), false),
            (Some("TEXT"), false),
            (Some("Text"), false),
            (Some("VARCHAR"), true),
            (Some("TEXTAREA"), true),
            (Some("INT"), true),
            (None, true),
        ];

        for (datatype, keeps_length) in cases {
            let mut doc = json!({"field": "src", "length": 255, "required": true});
            if let Some(datatype) = datatype {
                doc["datatype"] = json!(datatype);
            }
            let source = field(doc);

            let created = source.prepared_for_create("dst");

            assert_eq!(created.name(), Some("dst"), "datatype {:?}", datatype);
            assert_eq!(
                created.get("length").is_some(),
                keeps_length,
                "datatype {:?}",
                datatype
            );
            assert_eq!(created.get("required"), Some(&json!(true)));
            assert_eq!(created.datatype(), datatype);
            assert_eq!(created.as_map().len(), source.as_map().len() - usize::from(!keeps_length));
        }
    }

    #[test]
    fn prepared_for_create_leaves_source_untouched() {
        let def = field(json!({"field": "body", "datatype": "TEXT", "length": 10}));
        let _ = def.prepared_for_create("other");
        assert_eq!(def.name(), Some("body"));
        assert_eq!(def.get("length"), Some(&json!(10)));
    }

    #[test]
    fn server_attributes_are_stripped() {
        let def = field(json!({"id": 4, "collection": "posts", "group": null, "field": "title"}))
            .without_server_attributes();
        assert_eq!(def.as_map().len(), 1);
        assert_eq!(def.name(), Some("title"));
    }

    #[test]
    fn collection_name_is_read_from_document() {
        let def = CollectionDefinition::from_document(json!({"collection": "posts", "fields": {}}))
            .unwrap();
        assert_eq!(def.name(), "posts");
    }

    #[test]
    fn collection_without_name_is_a_validation_error() {
        let err = CollectionDefinition::from_document(json!({"fields": {}})).unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
        let err = CollectionDefinition::from_document(json!({"collection": 3})).unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
    }

    #[test]
    fn relation_document_omits_missing_field_one() {
        let rel = RelationDescriptor::new("posts", "author", "users", None);
        assert_eq!(
            serde_json::to_value(&rel).unwrap(),
            json!({"collection_many": "posts", "field_many": "author", "collection_one": "users"})
        );
    }

    #[test]
    fn lookup_without_field_one_requires_null_field_one() {
        let pairs = RelationDescriptor::new("posts", "author", "users", None)
            .lookup_query()
            .into_pairs();
        assert!(pairs.contains(&("filter[field_one][null]".to_string(), "1".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "filter[junction_field][null]"));
    }

    #[test]
    fn lookup_with_field_one_excludes_junctions() {
        let pairs = RelationDescriptor::new("posts", "author", "users", Some("posts"))
            .lookup_query()
            .into_pairs();
        assert!(pairs.contains(&("filter[field_one][eq]".to_string(), "posts".to_string())));
        assert!(pairs.contains(&("filter[junction_field][null]".to_string(), "1".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "filter[field_one][null]"));
    }

    #[test]
    fn item_value_treats_null_as_absent() {
        let item = Item::from_document(&json!({"id": 2, "f": null, "g": 0})).unwrap();
        assert_eq!(item.id, 2);
        assert!(item.value("f").is_none());
        assert!(item.value("missing").is_none());
        assert_eq!(item.value("g"), Some(&json!(0)));
    }

    #[test]
    fn item_requires_an_id() {
        assert!(Item::from_document(&json!({"f": "a"})).is_none());
        assert!(Item::from_document(&json!("a")).is_none());
        assert_eq!(Item::from_document(&json!({"id": "12"})).unwrap().id, 12);
    }

    #[test]
    fn missing_file_is_a_validation_error() {
        let err = load_document(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }

    #[test]
    fn load_document_parses_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, r#"{"collection": "posts"}"#).unwrap();
        assert_eq!(load_document(&path).unwrap(), json!({"collection": "posts"}));

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_document(&path).unwrap_err(),
            AdminError::Validation { .. }
        ));
    }
}
