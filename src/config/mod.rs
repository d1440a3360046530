mod api;
mod auth;
mod defaults;
mod validation;

use crate::auth::OAuthSettings;
use crate::cli::Args;
use crate::error::{Result, UserdeskError};
use crate::session::{FilesystemCredentialStore, TokenPolicy};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use defaults::*;
pub use validation::expand_env_var_in_string;

use validation::expand_optional;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// The on-disk config file, YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub oauth: OAuthSettings,
    pub token_policy: TokenPolicy,
    pub storage_dir: PathBuf,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = FileConfig::load()?;
        Self::resolve(args, file_config, |key| env::var(key).ok())
    }

    /// Merge the layers: CLI args > environment > config file > defaults.
    pub fn resolve(
        args: &Args,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let FileConfig {
            api,
            auth,
            storage,
            session,
        } = file;

        let api_url = args
            .api_url
            .clone()
            .or_else(|| env("USERDESK_API_URL"))
            .or(expand_optional(api.base_url))
            .unwrap_or_else(default_api_url);

        let token_policy = match args.token_policy {
            Some(policy) => policy,
            None => match env("USERDESK_TOKEN_POLICY") {
                Some(value) => value.parse::<TokenPolicy>()?,
                None => auth.token_policy.unwrap_or_default(),
            },
        };

        let storage_dir = args
            .storage_dir
            .clone()
            .or_else(|| env("USERDESK_STORAGE_DIR").map(PathBuf::from))
            .or(expand_optional(storage.dir).map(PathBuf::from))
            .unwrap_or_else(FilesystemCredentialStore::default_dir);

        let verbose = args.verbose
            || env("USERDESK_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(session.verbose)
                .unwrap_or(false);

        let client_id = env("USERDESK_CLIENT_ID")
            .or(expand_optional(auth.client_id))
            .unwrap_or_default();
        let client_secret =
            env("USERDESK_CLIENT_SECRET").or(expand_optional(auth.client_secret));

        let oauth = OAuthSettings {
            client_id,
            client_secret,
            auth_url: parse_url("auth.auth_url", auth.auth_url, default_auth_url)?,
            token_url: parse_url("auth.token_url", auth.token_url, default_token_url)?,
            userinfo_url: parse_url("auth.userinfo_url", auth.userinfo_url, default_userinfo_url)?,
            revoke_url: Some(parse_url("auth.revoke_url", auth.revoke_url, default_revoke_url)?),
            redirect_port: auth.redirect_port.unwrap_or_else(default_redirect_port),
            scopes: auth
                .scopes
                .filter(|scopes| !scopes.is_empty())
                .unwrap_or_else(default_scopes),
            sign_in_timeout: Duration::from_secs(
                auth.sign_in_timeout.unwrap_or_else(default_sign_in_timeout),
            ),
        };

        Ok(Config {
            api_url,
            oauth,
            token_policy,
            storage_dir,
            verbose,
        })
    }
}

fn parse_url(field: &str, value: Option<String>, default: fn() -> String) -> Result<Url> {
    let raw = expand_optional(value).unwrap_or_else(default);
    Url::parse(&raw)
        .map_err(|e| UserdeskError::Config(format!("Invalid URL for {}: '{}' ({})", field, raw, e)))
}

impl FileConfig {
    pub fn load() -> anyhow::Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // No config file found, return default
        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))
        }
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Current directory first, as a local override
            PathBuf::from(".userdesk.yaml"),
            PathBuf::from(".userdesk.yml"),
            PathBuf::from(".userdesk.json"),
        ];

        if let Some(config_dir) = Self::user_config_dir() {
            paths.push(config_dir.join("userdesk.yaml"));
            paths.push(config_dir.join("userdesk.yml"));
            paths.push(config_dir.join("userdesk.json"));
        }

        paths
    }

    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("userdesk"))
    }

    /// A commented starting point for `--config-init`.
    pub fn example_yaml() -> String {
        format!(
            "\
# userdesk configuration
api:
  base_url: {api}

auth:
  # OAuth client registered with your identity provider
  client_id: \"${{USERDESK_CLIENT_ID}}\"
  # client_secret: \"${{USERDESK_CLIENT_SECRET}}\"
  auth_url: {auth}
  token_url: {token}
  userinfo_url: {userinfo}
  revoke_url: {revoke}
  redirect_port: {port}
  scopes: [openid, email, profile]
  sign_in_timeout: {timeout}
  # cached | refresh-on-read
  token_policy: cached

# storage:
#   dir: ~/.cache/userdesk

session:
  verbose: false
",
            api = default_api_url(),
            auth = default_auth_url(),
            token = default_token_url(),
            userinfo = default_userinfo_url(),
            revoke = default_revoke_url(),
            port = default_redirect_port(),
            timeout = default_sign_in_timeout(),
        )
    }

    /// Write [`example_yaml`](Self::example_yaml) to `path` unless a file is
    /// already there. Returns whether a file was written.
    pub fn write_example(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, Self::example_yaml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}
