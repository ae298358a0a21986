use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::executor::RetryPolicy;
use crate::OdyseeError;

pub const DEFAULT_ENV_PATH: &str = ".env";

pub const BACKEND_API_URL: &str = "https://api.na-backend.odysee.com/api/v1/proxy";
pub const SUBSCRIBER_API_URL: &str = "https://api.odysee.com/subscription/sub_count";
pub const VIEW_API_URL: &str = "https://api.odysee.com/file/view_count";
pub const REACTION_API_URL: &str = "https://api.odysee.com/reaction/list";
pub const COMMENT_API_URL: &str = "https://comments.odysee.com/api/v2";
pub const RECOMMENDATION_API_URL: &str = "https://recsys.odysee.com/search";
pub const NEW_USER_API_URL: &str = "https://api.odysee.com/user/new";

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub backend: String,
    pub subscribers: String,
    pub views: String,
    pub reactions: String,
    pub comments: String,
    pub recommendations: String,
    pub new_user: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            backend: BACKEND_API_URL.to_string(),
            subscribers: SUBSCRIBER_API_URL.to_string(),
            views: VIEW_API_URL.to_string(),
            reactions: REACTION_API_URL.to_string(),
            comments: COMMENT_API_URL.to_string(),
            recommendations: RECOMMENDATION_API_URL.to_string(),
            new_user: NEW_USER_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Defaults overridden by `ODYSEE_*` variables from the environment, then from `.env`.
    pub fn from_env() -> Result<Self, OdyseeError> {
        let file_vars = load_env_file(Path::new(DEFAULT_ENV_PATH))?;
        Ok(build_config(&file_vars, env_var_string))
    }
}

fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    let lookup = |key: &str| {
        env_lookup(key)
            .or_else(|| file_vars.get(key).cloned())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let defaults = Endpoints::default();
    let endpoints = Endpoints {
        backend: lookup("ODYSEE_BACKEND_URL").unwrap_or(defaults.backend),
        subscribers: lookup("ODYSEE_SUBSCRIBER_URL").unwrap_or(defaults.subscribers),
        views: lookup("ODYSEE_VIEW_URL").unwrap_or(defaults.views),
        reactions: lookup("ODYSEE_REACTION_URL").unwrap_or(defaults.reactions),
        comments: lookup("ODYSEE_COMMENT_URL").unwrap_or(defaults.comments),
        recommendations: lookup("ODYSEE_RECOMMENDATION_URL").unwrap_or(defaults.recommendations),
        new_user: lookup("ODYSEE_NEW_USER_URL").unwrap_or(defaults.new_user),
    };

    let mut retry = RetryPolicy::default();
    if let Some(attempts) = lookup("ODYSEE_MAX_ATTEMPTS")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|attempts| *attempts > 0)
    {
        retry.max_attempts = attempts;
    }
    if let Some(secs) = lookup("ODYSEE_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        retry.timeout = Duration::from_secs(secs);
    }

    ClientConfig { endpoints, retry }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Variables declared in a dotenv file. A missing file yields an empty map.
/// The process environment is left untouched.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, OdyseeError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(OdyseeError::Other(Box::new(e))),
    };
    iter.collect::<Result<HashMap<_, _>, _>>()
        .map_err(|e| OdyseeError::Other(Box::new(e)))
}
