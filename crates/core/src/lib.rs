#![allow(clippy::result_large_err)]
//! directus-tools-core: schema administration engine for the Directus REST API.
//!
//! Manages collections, fields and relations, and composes them into
//! multi-step workflows such as renaming a field (create copy, move data,
//! drop original) or patching a collection with a before/after diff.
//!
//! # Public API
//!
//! - [`Transport`] -- send one request, get status and body back
//! - [`HttpTransport`] / [`ScriptedTransport`] -- network and in-memory transports
//! - [`SchemaClient`] -- typed operations over fields, collections, items, relations
//! - [`Migrator`] -- rename, patch-and-diff, bulk relation delete
//! - [`DiffReporter`] -- before/after snapshots of a patched collection
//! - [`ClientConfig`] -- connection settings from the environment
//! - [`AdminError`] -- error taxonomy shared by every operation

pub mod accessor;
pub mod config;
pub mod diff;
pub mod error;
pub mod migrate;
pub mod model;
pub mod query;
pub mod transport;

// ── Convenience re-exports ───────────────────────────────────────────

pub use accessor::SchemaClient;
pub use config::ClientConfig;
pub use diff::{DiffOutcome, DiffReporter};
pub use error::{AdminError, ConfigError, TransportError};
pub use migrate::Migrator;
pub use model::{load_document, CollectionDefinition, FieldDefinition, Item, RelationDescriptor};
pub use query::{FilterOp, Query};
pub use transport::{HttpTransport, Method, Request, Response, ScriptedTransport, Transport};

/// Build a [`Migrator`] talking to the configured API over HTTP, writing
/// diff snapshots to `artifacts_dir`.
pub fn connect(
    config: &ClientConfig,
    artifacts_dir: impl Into<std::path::PathBuf>,
) -> Migrator<HttpTransport> {
    Migrator::new(
        SchemaClient::new(HttpTransport::new(config)),
        DiffReporter::new(artifacts_dir),
    )
}
