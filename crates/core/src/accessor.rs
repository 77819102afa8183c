//! Typed operations over the remote schema model.
//!
//! [`SchemaClient`] wraps a [`Transport`] and turns raw status codes into
//! [`AdminError`]s. Success thresholds differ per operation and follow what the
//! Directus API returns for each endpoint:
//!
//! | Operation                     | Accepted status |
//! |-------------------------------|-----------------|
//! | reads (`fetch`, ...)          | `< 400`         |
//! | insert items, create/patch collection, create relation | `200` |
//! | drop collection, delete relation | `204`        |
//! | drop field                    | `204` or `404`  |
//! | update item field             | caller decides  |

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::AdminError;
use crate::model::{CollectionDefinition, FieldDefinition, Item, RelationDescriptor};
use crate::query::Query;
use crate::transport::{Request, Response, Transport};

/// `{"data": ...}` wrapper used by every Directus response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: u64,
}

fn field_path(collection: &str, field: &str) -> String {
    format!("/fields/{}/{}", collection, field)
}

fn collection_path(collection: &str) -> String {
    format!("/collections/{}", collection)
}

pub struct SchemaClient<T> {
    transport: T,
}

impl<T: Transport> SchemaClient<T> {
    pub fn new(transport: T) -> Self {
        SchemaClient { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Plumbing ────────────────────────────────────────────────────────────

    fn send(&self, request: &Request) -> Result<Response, AdminError> {
        Ok(self.transport.send(request)?)
    }

    /// Send and require the status to be one of `accepted`.
    fn send_expecting(&self, request: &Request, accepted: &[u16]) -> Result<Response, AdminError> {
        let response = self.send(request)?;
        if accepted.contains(&response.status) {
            Ok(response)
        } else {
            Err(AdminError::remote(
                request.context(),
                response.status,
                &response.body,
            ))
        }
    }

    /// Send a read and parse the body; any status >= 400 is an error.
    fn read(&self, request: &Request) -> Result<Value, AdminError> {
        let response = self.send(request)?;
        if response.status >= 400 {
            return Err(AdminError::remote(
                request.context(),
                response.status,
                &response.body,
            ));
        }
        parse_body(request, &response)
    }

    // ── Generic reads ───────────────────────────────────────────────────────

    /// GET an arbitrary project-relative path.
    pub fn fetch(&self, path: &str) -> Result<Value, AdminError> {
        self.read(&Request::get(path))
    }

    /// Root endpoint: API version, project name, server info.
    pub fn api_info(&self) -> Result<Value, AdminError> {
        self.fetch("/")
    }

    // ── Fields ──────────────────────────────────────────────────────────────

    /// Fetch a field definition with its server-assigned attributes removed.
    ///
    /// A 404, a response without `data`, or `data` without a non-null `id`
    /// all mean the field does not exist.
    pub fn get_field_definition(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<FieldDefinition, AdminError> {
        let request = Request::get(field_path(collection, field));
        let response = self.send(&request)?;
        if response.status == 404 {
            return Err(AdminError::NotFound {
                context: request.context(),
            });
        }
        if response.status >= 400 {
            return Err(AdminError::remote(
                request.context(),
                response.status,
                &response.body,
            ));
        }

        let document = parse_body(&request, &response)?;
        let data = match document.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => {
                return Err(AdminError::NotFound {
                    context: format!("{} (no field data returned)", request.context()),
                })
            }
        };
        if data.get("id").map_or(true, Value::is_null) {
            return Err(AdminError::NotFound {
                context: format!(
                    "{} (returned data has no id: {})",
                    request.context(),
                    Value::Object(data)
                ),
            });
        }

        Ok(FieldDefinition::from_document(data).without_server_attributes())
    }

    pub fn field_exists(&self, collection: &str, field: &str) -> Result<bool, AdminError> {
        match self.get_field_definition(collection, field) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create `new_field` in `collection` as a copy of `source`.
    ///
    /// The server's echo of the created field must carry `new_field` as its
    /// name; anything else is an [`AdminError::Integrity`].
    pub fn create_field_from(
        &self,
        collection: &str,
        new_field: &str,
        source: &FieldDefinition,
    ) -> Result<FieldDefinition, AdminError> {
        let definition = source.prepared_for_create(new_field);
        let request = Request::post(format!("/fields/{}", collection), definition.to_document());
        let response = self.send(&request)?;
        if response.status >= 400 {
            return Err(AdminError::remote(
                request.context(),
                response.status,
                &response.body,
            ));
        }

        let document = parse_body(&request, &response)?;
        let data: Map<String, Value> = match document.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => {
                return Err(AdminError::Integrity {
                    context: request.context(),
                    detail: format!("response carries no field data: {}", response.body),
                })
            }
        };

        let returned = data.get("field").and_then(Value::as_str);
        if returned != Some(new_field) {
            return Err(AdminError::Integrity {
                context: request.context(),
                detail: format!(
                    "expected field '{}' but server returned {}; source definition was {}",
                    new_field,
                    Value::Object(data.clone()),
                    source.to_document()
                ),
            });
        }

        info!(collection, field = new_field, "created field");
        Ok(FieldDefinition::from_document(data))
    }

    /// Drop a field. The field must exist first: a missing field surfaces as
    /// [`AdminError::NotFound`] and no DELETE is sent. A 404 on the DELETE
    /// itself (someone else dropped it in between) counts as success.
    pub fn drop_field(&self, collection: &str, field: &str) -> Result<(), AdminError> {
        info!(collection, field, "dropping field");
        self.get_field_definition(collection, field)?;
        self.send_expecting(&Request::delete(field_path(collection, field)), &[204, 404])?;
        info!(collection, field, "dropped field");
        Ok(())
    }

    // ── Items ───────────────────────────────────────────────────────────────

    /// PATCH a single field of one item. Returns the raw response; callers
    /// decide which statuses are acceptable.
    pub fn update_item_field(
        &self,
        collection: &str,
        id: u64,
        field: &str,
        value: &Value,
    ) -> Result<Response, AdminError> {
        let mut body = Map::new();
        body.insert(field.to_string(), value.clone());
        self.send(&Request::patch(
            format!("/items/{}/{}", collection, id),
            Value::Object(body),
        ))
    }

    /// All items of a collection, restricted to `fields`.
    ///
    /// Asks for `limit=-1` so the server's default page size does not
    /// truncate the listing.
    pub fn list_items(&self, collection: &str, fields: &[&str]) -> Result<Vec<Item>, AdminError> {
        let request = Request::get(format!("/items/{}", collection))
            .with_query(Query::new().fields(fields).limit(-1));
        let document = self.read(&request)?;

        let entries = match document.get("data") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(other) => {
                return Err(AdminError::remote(
                    request.context(),
                    200,
                    &format!("expected an array of items, got {}", other),
                ))
            }
        };

        entries
            .iter()
            .map(|entry| {
                Item::from_document(entry).ok_or_else(|| {
                    AdminError::remote(
                        request.context(),
                        200,
                        &format!("'{}' is not an item with a numeric id", entry),
                    )
                })
            })
            .collect()
    }

    /// POST items to a collection (a single item or an array).
    pub fn insert_items(&self, collection: &str, document: &Value) -> Result<(), AdminError> {
        info!(collection, "inserting items");
        self.send_expecting(
            &Request::post(format!("/items/{}", collection), document.clone()),
            &[200],
        )?;
        info!(collection, "inserted items");
        Ok(())
    }

    // ── Collections ─────────────────────────────────────────────────────────

    pub fn get_collection(&self, collection: &str) -> Result<Value, AdminError> {
        self.fetch(&collection_path(collection))
    }

    pub fn create_collection(&self, schema: &CollectionDefinition) -> Result<(), AdminError> {
        info!(collection = schema.name(), "creating collection");
        self.send_expecting(&Request::post("/collections", schema.document().clone()), &[200])?;
        info!(collection = schema.name(), "created collection");
        Ok(())
    }

    pub fn patch_collection(&self, collection: &str, document: &Value) -> Result<(), AdminError> {
        self.send_expecting(
            &Request::patch(collection_path(collection), document.clone()),
            &[200],
        )?;
        Ok(())
    }

    /// A 404 means absent; any other non-error status means present.
    pub fn collection_exists(&self, collection: &str) -> Result<bool, AdminError> {
        let request = Request::get(collection_path(collection));
        let response = self.send(&request)?;
        match response.status {
            404 => Ok(false),
            s if s >= 400 => Err(AdminError::remote(request.context(), s, &response.body)),
            _ => Ok(true),
        }
    }

    /// Drop a collection and all its data. Returns `false` without sending a
    /// DELETE when the collection does not exist.
    pub fn drop_collection_if_exists(&self, collection: &str) -> Result<bool, AdminError> {
        info!(collection, "dropping collection including all data");
        if !self.collection_exists(collection)? {
            info!(collection, "collection does not exist");
            return Ok(false);
        }
        self.send_expecting(&Request::delete(collection_path(collection)), &[204])?;
        info!(collection, "dropped collection");
        Ok(true)
    }

    // ── Relations ───────────────────────────────────────────────────────────

    pub fn create_relation(&self, relation: &RelationDescriptor) -> Result<(), AdminError> {
        info!(%relation, "creating relation");
        let body = serde_json::to_value(relation).map_err(|e| {
            AdminError::validation(format!("cannot serialize relation {}: {}", relation, e))
        })?;
        self.send_expecting(&Request::post("/relations", body), &[200])?;
        info!(%relation, "created relation");
        Ok(())
    }

    /// Ids of every relation matching the descriptor. An empty result is
    /// logged, not an error.
    pub fn find_relations(&self, relation: &RelationDescriptor) -> Result<Vec<u64>, AdminError> {
        let request = Request::get("/relations").with_query(relation.lookup_query());
        let document = self.read(&request)?;

        let envelope: Envelope<Vec<IdRef>> = serde_json::from_value(document).map_err(|e| {
            AdminError::remote(
                request.context(),
                200,
                &format!("unexpected relation list: {}", e),
            )
        })?;

        let ids: Vec<u64> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.id)
            .collect();
        if ids.is_empty() {
            warn!(%relation, "no matching relations found");
        }
        Ok(ids)
    }

    /// DELETE each relation in order, stopping at the first non-204.
    pub fn delete_relations_by_id(&self, ids: &[u64]) -> Result<(), AdminError> {
        for id in ids {
            info!(id, "deleting relation");
            self.send_expecting(&Request::delete(format!("/relations/{}", id)), &[204])?;
            info!(id, "deleted relation");
        }
        Ok(())
    }
}

fn parse_body(request: &Request, response: &Response) -> Result<Value, AdminError> {
    response.json().map_err(|e| {
        AdminError::remote(
            request.context(),
            response.status,
            &format!("invalid JSON ({}): {}", e, response.body),
        )
    })
}
