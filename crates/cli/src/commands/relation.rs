use directus_tools_core::{AdminError, Migrator, RelationDescriptor, Transport};
use serde_json::json;

use super::Report;

fn relation_json(relation: &RelationDescriptor) -> serde_json::Value {
    json!({
        "many_collection": relation.many_collection,
        "many_field": relation.many_field,
        "one_collection": relation.one_collection,
        "field_one": relation.field_one,
    })
}

pub(super) fn create_m2o<T: Transport>(
    migrator: &Migrator<T>,
    relation: &RelationDescriptor,
) -> Result<Report, AdminError> {
    migrator.client().create_relation(relation)?;
    Ok(Report::Done {
        message: format!("created relation {}", relation),
        details: json!({ "relation": relation_json(relation), "created": true }),
    })
}

pub(super) fn delete_m2o<T: Transport>(
    migrator: &Migrator<T>,
    relation: &RelationDescriptor,
) -> Result<Report, AdminError> {
    let deleted = migrator.delete_m2o_relation(relation)?;
    let message = if deleted == 0 {
        format!("no relation matches {}", relation)
    } else {
        format!("deleted {} relation(s) matching {}", deleted, relation)
    };
    Ok(Report::Done {
        message,
        details: json!({ "relation": relation_json(relation), "deleted": deleted }),
    })
}
