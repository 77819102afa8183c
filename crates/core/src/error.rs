use std::path::PathBuf;

/// Failure to reach the remote API at all (connection refused, DNS, timeout).
///
/// Distinct from an HTTP error status: a status is a [`Response`] the caller
/// inspects, a `TransportError` means no response arrived.
///
/// [`Response`]: crate::transport::Response
#[derive(Debug, thiserror::Error)]
#[error("{method} {url} failed: {message}")]
pub struct TransportError {
    pub method: String,
    pub url: String,
    pub message: String,
}

/// All errors surfaced by schema administration operations.
///
/// Every variant carries the request context (`"GET /fields/posts/title"`)
/// so a failed workflow can be diagnosed from the message alone.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The remote call completed with a status outside the operation's
    /// accepted set, or returned a body that could not be interpreted.
    #[error("{context} failed with status {status}: {body}")]
    Remote {
        context: String,
        status: u16,
        body: String,
    },

    /// The expected remote resource does not exist.
    #[error("{context}: not found")]
    NotFound { context: String },

    /// The server accepted a write but returned data inconsistent with the request.
    #[error("{context}: integrity check failed: {detail}")]
    Integrity { context: String, detail: String },

    /// A local precondition was violated before any remote call was attempted.
    #[error("{message}")]
    Validation { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A diff snapshot could not be written to disk.
    #[error("could not write diff artifact '{}': {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AdminError {
    pub(crate) fn remote(context: impl Into<String>, status: u16, body: &str) -> Self {
        AdminError::Remote {
            context: context.into(),
            status,
            body: body.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        AdminError::Validation {
            message: message.into(),
        }
    }

    /// True for errors that mean "the resource is absent" rather than "the call failed".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::NotFound { .. })
    }
}

/// Errors raised while assembling a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required environment variables are unset.
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),

    #[error("environment variable {name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_message_embeds_context_and_body() {
        let err = AdminError::remote("PATCH /collections/posts", 422, "{\"error\":\"bad\"}");
        let msg = err.to_string();
        assert!(msg.contains("PATCH /collections/posts"));
        assert!(msg.contains("422"));
        assert!(msg.contains("\"bad\""));
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = AdminError::NotFound {
            context: "GET /fields/posts/title".into(),
        };
        assert!(err.is_not_found());
        assert!(!AdminError::validation("x").is_not_found());
    }

    #[test]
    fn missing_variables_lists_all_names() {
        let err = ConfigError::MissingVariables(vec!["DIRECTUS_API_HOST", "DIRECTUS_ADMIN_TOKEN"]);
        assert_eq!(
            err.to_string(),
            "missing environment variables: DIRECTUS_API_HOST, DIRECTUS_ADMIN_TOKEN"
        );
    }
}
