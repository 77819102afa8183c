//! Subcommand dispatch.
//!
//! A parsed [`Commands`] value is first turned into an [`Action`]: files are
//! read and schema documents checked for their collection name, all without
//! touching the network. Only then is the action run against a [`Migrator`].

mod data;
mod relation;
mod schema;

use directus_tools_core::{
    load_document, AdminError, CollectionDefinition, Migrator, RelationDescriptor, Transport,
};
use serde_json::Value;

use crate::Commands;

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Report {
    /// A document fetched from the API, printed as pretty JSON.
    Document(Value),
    /// A mutation completed. `message` is printed in text mode, `details` in JSON mode.
    Done { message: String, details: Value },
}

/// A command with its local inputs loaded and checked.
#[derive(Debug)]
pub(crate) enum Action {
    ApiInfo,
    CreateCollection(CollectionDefinition),
    Patch(CollectionDefinition),
    DropCollection(String),
    InsertItems { collection: String, items: Value },
    CreateM2o(RelationDescriptor),
    DeleteM2o(RelationDescriptor),
    GetFieldDef { collection: String, field: String },
    DropField { collection: String, field: String },
    RenameField {
        collection: String,
        current_field: String,
        new_field: String,
    },
    CopyFieldData {
        collection: String,
        from_field: String,
        to_field: String,
    },
    GetData(String),
}

impl Action {
    pub(crate) fn prepare(command: Commands) -> Result<Self, AdminError> {
        let action = match command {
            Commands::ApiInfo => Action::ApiInfo,
            Commands::CreateCollection { file } => Action::CreateCollection(
                CollectionDefinition::from_document(load_document(&file)?)?,
            ),
            Commands::Patch { file } => {
                Action::Patch(CollectionDefinition::from_document(load_document(&file)?)?)
            }
            Commands::DropCollection { collection } => Action::DropCollection(collection),
            Commands::InsertItems { collection, file } => Action::InsertItems {
                collection,
                items: load_document(&file)?,
            },
            Commands::CreateM2o {
                many_collection,
                many_field,
                one_collection,
                field_one,
            } => Action::CreateM2o(RelationDescriptor::new(
                &many_collection,
                &many_field,
                &one_collection,
                field_one.as_deref(),
            )),
            Commands::DeleteM2o {
                many_collection,
                many_field,
                one_collection,
                field_one,
            } => Action::DeleteM2o(RelationDescriptor::new(
                &many_collection,
                &many_field,
                &one_collection,
                field_one.as_deref(),
            )),
            Commands::GetFieldDef { collection, field } => {
                Action::GetFieldDef { collection, field }
            }
            Commands::DropField { collection, field } => Action::DropField { collection, field },
            Commands::RenameField {
                collection,
                current_field,
                new_field,
            } => Action::RenameField {
                collection,
                current_field,
                new_field,
            },
            Commands::CopyFieldData {
                collection,
                from_field,
                to_field,
            } => {
                if from_field == to_field {
                    return Err(AdminError::Validation {
                        message: format!(
                            "cannot copy field '{}' in collection '{}' onto itself",
                            from_field, collection
                        ),
                    });
                }
                Action::CopyFieldData {
                    collection,
                    from_field,
                    to_field,
                }
            }
            Commands::GetData { path } => Action::GetData(normalize_path(&path)),
        };
        Ok(action)
    }

    pub(crate) fn run<T: Transport>(self, migrator: &Migrator<T>) -> Result<Report, AdminError> {
        match self {
            Action::ApiInfo => data::api_info(migrator),
            Action::GetData(path) => data::get_data(migrator, &path),
            Action::InsertItems { collection, items } => {
                data::insert_items(migrator, &collection, &items)
            }
            Action::CreateCollection(schema) => schema::create_collection(migrator, &schema),
            Action::Patch(schema) => schema::patch(migrator, &schema),
            Action::DropCollection(collection) => schema::drop_collection(migrator, &collection),
            Action::GetFieldDef { collection, field } => {
                schema::get_field_def(migrator, &collection, &field)
            }
            Action::DropField { collection, field } => {
                schema::drop_field(migrator, &collection, &field)
            }
            Action::RenameField {
                collection,
                current_field,
                new_field,
            } => schema::rename_field(migrator, &collection, &current_field, &new_field),
            Action::CopyFieldData {
                collection,
                from_field,
                to_field,
            } => schema::copy_field_data(migrator, &collection, &from_field, &to_field),
            Action::CreateM2o(relation) => relation::create_m2o(migrator, &relation),
            Action::DeleteM2o(relation) => relation::delete_m2o(migrator, &relation),
        }
    }
}

/// `collections` and `/collections` address the same resource.
fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directus_tools_core::{DiffReporter, SchemaClient, ScriptedTransport};
    use serde_json::json;
    use std::path::PathBuf;

    pub(super) fn migrator(dir: &std::path::Path) -> Migrator<ScriptedTransport> {
        Migrator::new(
            SchemaClient::new(ScriptedTransport::new()),
            DiffReporter::new(dir),
        )
    }

    #[test]
    fn patch_requires_collection_attribute_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("schema.json");
        std::fs::write(&file, r#"{"fields": {}}"#).unwrap();

        let err = Action::prepare(Commands::Patch { file }).unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
    }

    #[test]
    fn missing_schema_file_is_rejected() {
        let err = Action::prepare(Commands::CreateCollection {
            file: PathBuf::from("/no/such/schema.json"),
        })
        .unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }

    #[test]
    fn get_data_path_gets_leading_slash() {
        let action = Action::prepare(Commands::GetData {
            path: "collections".into(),
        })
        .unwrap();
        assert!(matches!(action, Action::GetData(ref p) if p == "/collections"));
    }

    #[test]
    fn optional_field_one_maps_to_none() {
        let action = Action::prepare(Commands::DeleteM2o {
            many_collection: "posts".into(),
            many_field: "author".into(),
            one_collection: "users".into(),
            field_one: None,
        })
        .unwrap();
        match action {
            Action::DeleteM2o(relation) => assert_eq!(relation.field_one, None),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn copy_onto_the_same_field_is_rejected() {
        let err = Action::prepare(Commands::CopyFieldData {
            collection: "posts".into(),
            from_field: "title".into(),
            to_field: "title".into(),
        })
        .unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
    }

    #[test]
    fn get_data_prints_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let m = migrator(dir.path());
        m.client()
            .transport()
            .respond_json(200, json!({"data": [{"collection": "posts"}]}));

        let report = Action::GetData("/collections".into()).run(&m).unwrap();

        assert_eq!(
            report,
            Report::Document(json!({"data": [{"collection": "posts"}]}))
        );
    }
}
