use directus_tools_core::{AdminError, CollectionDefinition, DiffOutcome, Migrator, Transport};
use serde_json::json;

use super::Report;

pub(super) fn create_collection<T: Transport>(
    migrator: &Migrator<T>,
    schema: &CollectionDefinition,
) -> Result<Report, AdminError> {
    migrator.client().create_collection(schema)?;
    Ok(Report::Done {
        message: format!("created collection '{}'", schema.name()),
        details: json!({ "collection": schema.name(), "created": true }),
    })
}

pub(super) fn patch<T: Transport>(
    migrator: &Migrator<T>,
    schema: &CollectionDefinition,
) -> Result<Report, AdminError> {
    let report = match migrator.patch(schema)? {
        DiffOutcome::Unchanged => Report::Done {
            message: format!("patched collection '{}': no changes", schema.name()),
            details: json!({ "collection": schema.name(), "changed": false }),
        },
        DiffOutcome::Changed {
            before,
            after,
            changed_lines,
        } => Report::Done {
            message: format!(
                "patched collection '{}': {} line(s) changed, compare '{}' and '{}'",
                schema.name(),
                changed_lines,
                before.display(),
                after.display()
            ),
            details: json!({
                "collection": schema.name(),
                "changed": true,
                "changed_lines": changed_lines,
                "before": before.display().to_string(),
                "after": after.display().to_string(),
            }),
        },
    };
    Ok(report)
}

pub(super) fn drop_collection<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
) -> Result<Report, AdminError> {
    let dropped = migrator.client().drop_collection_if_exists(collection)?;
    let message = if dropped {
        format!("dropped collection '{}'", collection)
    } else {
        format!("collection '{}' does not exist", collection)
    };
    Ok(Report::Done {
        message,
        details: json!({ "collection": collection, "dropped": dropped }),
    })
}

pub(super) fn get_field_def<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
    field: &str,
) -> Result<Report, AdminError> {
    let definition = migrator.client().get_field_definition(collection, field)?;
    Ok(Report::Document(definition.to_document()))
}

pub(super) fn drop_field<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
    field: &str,
) -> Result<Report, AdminError> {
    migrator.client().drop_field(collection, field)?;
    Ok(Report::Done {
        message: format!("dropped field '{}' from collection '{}'", field, collection),
        details: json!({ "collection": collection, "field": field, "dropped": true }),
    })
}

pub(super) fn rename_field<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
    current_field: &str,
    new_field: &str,
) -> Result<Report, AdminError> {
    let copied = migrator.rename_field(collection, current_field, new_field)?;
    Ok(Report::Done {
        message: format!(
            "renamed '{}.{}' to '{}' ({} value(s) copied)",
            collection, current_field, new_field, copied
        ),
        details: json!({
            "collection": collection,
            "from": current_field,
            "to": new_field,
            "copied": copied,
        }),
    })
}

pub(super) fn copy_field_data<T: Transport>(
    migrator: &Migrator<T>,
    collection: &str,
    from_field: &str,
    to_field: &str,
) -> Result<Report, AdminError> {
    let copied = migrator.copy_field_data(collection, from_field, to_field)?;
    Ok(Report::Done {
        message: format!(
            "copied {} value(s) from '{}.{}' to '{}'",
            copied, collection, from_field, to_field
        ),
        details: json!({
            "collection": collection,
            "from": from_field,
            "to": to_field,
            "copied": copied,
        }),
    })
}
