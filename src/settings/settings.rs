use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub database: Database,
    #[serde(default)]
    pub group: Group,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "jwt"
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
    /// Environment variable holding the HS256 signing key.
    #[serde(default = "default_signing_key_env")]
    pub signing_key_env: String,
}

fn default_signing_key_env() -> String {
    "JWT_SIGNING_KEY".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub backend: String, // "mysql" or "memory"
    pub dsn: Option<String>,
    pub max_connections: Option<u32>,
    /// JSON array of students loaded into the memory backend at startup.
    pub seed_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Group {
    #[serde(default = "default_max_members")]
    pub max_members: u32,
    #[serde(default = "default_unlock_on_removal")]
    pub unlock_on_removal: bool,
}

fn default_max_members() -> u32 {
    crate::domain_model::MAX_GROUP_MEMBERS
}

fn default_unlock_on_removal() -> bool {
    true
}

impl Default for Group {
    fn default() -> Self {
        Group {
            max_members: default_max_members(),
            unlock_on_removal: default_unlock_on_removal(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub cert_path: String,
    pub key_path: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
