use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub apns: Option<ApnsConfig>,
    #[serde(default)]
    pub twilio: Option<TwilioConfig>,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub quiet_hours: QuietHoursConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "nudged.db".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret the external scheduler must present on /cron routes.
    /// Unset means the cron routes are open (local-only deployments).
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// Shared secret guarding the /simulate route.
    #[serde(default)]
    pub test_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cron_secret: None,
            test_secret: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}
fn default_model() -> String {
    "grok-2-latest".to_string()
}
fn default_max_tokens() -> u32 {
    100
}
fn default_temperature() -> f64 {
    0.9
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApnsConfig {
    /// Pre-minted APNs provider token. Token minting and key management
    /// happen outside this daemon.
    pub provider_token: String,
    #[serde(default = "default_bundle_id")]
    pub bundle_id: String,
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

fn default_bundle_id() -> String {
    "com.nudged.app".to_string()
}
fn default_sandbox() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersonaConfig {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_user_name")]
    pub user_name: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            user_name: default_user_name(),
        }
    }
}

fn default_assistant_name() -> String {
    "Nudge".to_string()
}
fn default_user_name() -> String {
    "The user".to_string()
}

/// Local-clock window during which non-high-priority triggers are held.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct QuietHoursConfig {
    #[serde(default = "default_quiet_start")]
    pub start: u32,
    #[serde(default = "default_quiet_end")]
    pub end: u32,
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            start: default_quiet_start(),
            end: default_quiet_end(),
        }
    }
}

fn default_quiet_start() -> u32 {
    23
}
fn default_quiet_end() -> u32 {
    7
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
