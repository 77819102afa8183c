use directus_tools_core::{AdminError, Migrator, Transport};
use serde_json::{json, Value};

use super::Report;

pub(super) fn api_info<T: Transport>(migrator: &Migrator<T>) -> Result<Report, AdminError> {
    Ok(Report::Document(migrator.client().api_info()?))
}

pub(super) fn get_data<T: Transport>(
    migrator: &Migrator<T>,
    path: &str,
) -> Result<Report, AdminError> {
    Ok(Report::Document(migrator.client().fetch(path)?))
}

pub(super) fn insert_items<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
    items: &Value,
) -> Result<Report, AdminError> {
    migrator.client().insert_items(collection, items)?;
    let count = items.as_array().map_or(1, Vec::len);
    Ok(Report::Done {
        message: format!("inserted {} item(s) into '{}'", count, collection),
        details: json!({ "collection": collection, "inserted": count }),
    })
}
