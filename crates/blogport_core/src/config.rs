use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DELAY_MS: u64 = 2_000;
pub const DEFAULT_OUTPUT_PATH: &str = "rewrite_rules";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct BlogportConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub account: AccountSection,
    #[serde(default)]
    pub publish: PublishSection,
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub rewrite: RewriteSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct AccountSection {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct PublishSection {
    pub endpoint_url: Option<String>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct SiteSection {
    pub new_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct RewriteSection {
    pub output_path: Option<String>,
    pub match_trailing_path: Option<bool>,
}

/// Fully resolved run configuration: file values overridden by
/// environment, defaults applied, required keys checked.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub database: DatabaseParams,
    pub account: AccountCredentials,
    pub endpoint_url: String,
    pub delay: Duration,
    pub new_base_url: String,
    pub output_path: PathBuf,
    pub match_trailing_path: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub email: String,
    pub password: String,
}

/// Load and parse a BlogportConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<BlogportConfig> {
    if !config_path.exists() {
        return Ok(BlogportConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: BlogportConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

impl BlogportConfig {
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let database = DatabaseParams {
            host: required(
                env_or("BLOGPORT_DB_HOST", self.database.host.as_deref()),
                "database.host",
                "BLOGPORT_DB_HOST",
            )?,
            port: env_value_u16("BLOGPORT_DB_PORT")
                .or(self.database.port)
                .unwrap_or(DEFAULT_DB_PORT),
            dbname: required(
                env_or("BLOGPORT_DB_NAME", self.database.dbname.as_deref()),
                "database.dbname",
                "BLOGPORT_DB_NAME",
            )?,
            user: required(
                env_or("BLOGPORT_DB_USER", self.database.user.as_deref()),
                "database.user",
                "BLOGPORT_DB_USER",
            )?,
            password: env_or("BLOGPORT_DB_PASSWORD", self.database.password.as_deref()),
        };

        let account = AccountCredentials {
            email: required(
                env_or("BLOGPORT_ACCOUNT_EMAIL", self.account.email.as_deref()),
                "account.email",
                "BLOGPORT_ACCOUNT_EMAIL",
            )?,
            password: required(
                env_or("BLOGPORT_ACCOUNT_PASSWORD", self.account.password.as_deref()),
                "account.password",
                "BLOGPORT_ACCOUNT_PASSWORD",
            )?,
        };

        let endpoint_url = required(
            env_or("BLOGPORT_ENDPOINT_URL", self.publish.endpoint_url.as_deref()),
            "publish.endpoint_url",
            "BLOGPORT_ENDPOINT_URL",
        )?;
        let delay_ms = env_value_u64("BLOGPORT_DELAY_MS")
            .or(self.publish.delay_ms)
            .unwrap_or(DEFAULT_DELAY_MS);

        let new_base_url = required(
            env_or("BLOGPORT_NEW_BASE_URL", self.site.new_base_url.as_deref()),
            "site.new_base_url",
            "BLOGPORT_NEW_BASE_URL",
        )?;

        let output_path = env_or("BLOGPORT_OUTPUT_PATH", self.rewrite.output_path.as_deref())
            .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());

        Ok(ResolvedConfig {
            database,
            account,
            endpoint_url,
            delay: Duration::from_millis(delay_ms),
            new_base_url: new_base_url.trim_end_matches('/').to_string(),
            output_path: PathBuf::from(output_path),
            match_trailing_path: self.rewrite.match_trailing_path.unwrap_or(false),
        })
    }
}

fn env_or(key: &str, file_value: Option<&str>) -> Option<String> {
    if let Ok(value) = env::var(key) {
        let trimmed = value.trim().to_string();
        if !trimmed.is_empty() {
            return Some(trimmed);
        }
    }
    file_value.map(str::to_string)
}

fn required(value: Option<String>, key: &str, env_key: &str) -> Result<String> {
    value.ok_or_else(|| anyhow!("missing required configuration: {key} (or {env_key})"))
}

fn env_value_u16(key: &str) -> Option<u16> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
}

fn env_value_u64(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
}
