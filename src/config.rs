//! Settings for the hosted backend, read from the environment or a `.env` file.

use std::{collections::HashMap, env, path::Path};

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const SUPABASE_SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

const ENV_FILE: &str = ".env";

/// Connection settings for the hosted backend.
///
/// Each integration is only enabled when all of the values it needs are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// The project URL, without a trailing slash.
    pub url: Option<String>,
    /// The public key used by the transaction service and sign in.
    pub anon_key: Option<String>,
    /// The privileged key used by the admin password endpoint.
    pub service_role_key: Option<String>,
}

impl SupabaseConfig {
    /// Read the config from the process environment, falling back to the
    /// `.env` file in the working directory for variables that are not set.
    pub fn from_env() -> Self {
        Self::from_env_file(Path::new(ENV_FILE), |name| env::var(name).ok())
    }

    /// Build the config from `lookup`, using the dotenv file at `path` for
    /// variables that `lookup` does not have. A missing file is ignored.
    pub fn from_env_file(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let file_vars = read_env_file(path);

        Self::from_vars(|name| lookup(name).or_else(|| file_vars.get(name).cloned()))
    }

    /// Build the config from a variable lookup. Empty values count as missing.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        Self {
            url: get(SUPABASE_URL_VAR).map(|url| url.trim_end_matches('/').to_owned()),
            anon_key: get(SUPABASE_ANON_KEY_VAR),
            service_role_key: get(SUPABASE_SERVICE_ROLE_KEY_VAR),
        }
    }

    /// The URL and public key, if both are set.
    pub fn public_credentials(&self) -> Option<(&str, &str)> {
        Some((self.url.as_deref()?, self.anon_key.as_deref()?))
    }

    /// The URL and service role key, if both are set.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        Some((self.url.as_deref()?, self.service_role_key.as_deref()?))
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(error) if error.not_found() => return HashMap::new(),
        Err(error) => {
            tracing::warn!("Could not read {}: {error}", path.display());
            return HashMap::new();
        }
    };

    entries
        .filter_map(|entry| {
            entry
                .inspect_err(|error| {
                    tracing::warn!("Skipping invalid line in {}: {error}", path.display())
                })
                .ok()
        })
        .collect()
}
