//! Connection settings for the Directus API, read from the environment.
//!
//! | Variable                 | Required | Default |
//! |--------------------------|----------|---------|
//! | `DIRECTUS_API_HOST`      | yes      |         |
//! | `DIRECTUS_ADMIN_TOKEN`   | yes      |         |
//! | `DIRECTUS_PROJECT`       | no       | `_`     |
//! | `DIRECTUS_TIMEOUT_SECS`  | no       | `60`    |

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const API_HOST_VAR: &str = "DIRECTUS_API_HOST";
pub const ADMIN_TOKEN_VAR: &str = "DIRECTUS_ADMIN_TOKEN";
pub const PROJECT_VAR: &str = "DIRECTUS_PROJECT";
pub const TIMEOUT_VAR: &str = "DIRECTUS_TIMEOUT_SECS";

/// Project used when none is configured.
pub const DEFAULT_PROJECT: &str = "_";

/// Applied to every remote call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including scheme, without trailing slash.
    pub api_host: String,
    pub project: String,
    /// Pre-obtained admin bearer token.
    pub token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_host: &str, token: &str) -> Self {
        ClientConfig {
            api_host: api_host.trim_end_matches('/').to_string(),
            project: DEFAULT_PROJECT.to_string(),
            token: token.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported, not just the first one.
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_host = get(API_HOST_VAR);
        let token = get(ADMIN_TOKEN_VAR);

        let (api_host, token) = match (api_host, token) {
            (Some(h), Some(t)) => (h, t),
            (h, t) => {
                let mut missing = Vec::new();
                if h.is_none() {
                    missing.push(API_HOST_VAR);
                }
                if t.is_none() {
                    missing.push(ADMIN_TOKEN_VAR);
                }
                return Err(ConfigError::MissingVariables(missing));
            }
        };

        let mut config = ClientConfig::new(&api_host, &token);

        if let Some(project) = get(PROJECT_VAR) {
            config.project = project.trim_matches('/').to_string();
        }

        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    name: TIMEOUT_VAR,
                    value: raw,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// `{api_host}/{project}`, the prefix of every request path.
    pub fn project_url(&self) -> String {
        format!("{}/{}", self.api_host, self.project)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_host", &self.api_host)
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
