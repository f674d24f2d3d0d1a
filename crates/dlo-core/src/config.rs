use figment::{
    providers::{Env, Format, Toml},
    value::{Uncased, UncasedStr},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_FROM_ADDRESS: &str = "no-reply@dlo.local";
pub const DEFAULT_PRODUCT_NAME: &str = "Dear Loved One";
pub const DEFAULT_DELIVERY_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 20;

/// Top-level config (dlo.toml + DLO_* env overrides + legacy SMTP_* vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DloConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Outbound mail transport. When `host` is unset (or blank) the notifier
/// runs in log mode and every send succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default, deserialize_with = "opt_text")]
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default, deserialize_with = "opt_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub password: Option<String>,
    #[serde(default = "default_from_address", deserialize_with = "text")]
    pub from_address: String,
    /// Connect/command timeout applied by the transport.
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

impl SmtpConfig {
    /// The configured relay host, treating an empty string as absent.
    pub fn relay_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// Credentials are only used when both halves are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from_address: default_from_address(),
            timeout_secs: DEFAULT_SMTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Seconds between two delivery cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Used in the subject prefix and the message footer.
    #[serde(default = "default_product_name")]
    pub product_name: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_DELIVERY_INTERVAL_SECS,
            product_name: default_product_name(),
        }
    }
}

/// Environment values are typed by figment, so `SMTP_PASS=123456` arrives
/// as a number. Free-text settings take any scalar and keep its text form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(v: Scalar) -> Self {
        match v {
            Scalar::Text(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(String::from)
}

fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(d).map(|v| v.map(String::from))
}

fn default_db_path() -> String {
    "dlo.db".to_string()
}
fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}
fn default_from_address() -> String {
    DEFAULT_FROM_ADDRESS.to_string()
}
fn default_smtp_timeout_secs() -> u64 {
    DEFAULT_SMTP_TIMEOUT_SECS
}
fn default_interval_secs() -> u64 {
    DEFAULT_DELIVERY_INTERVAL_SECS
}
fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

impl DloConfig {
    /// Load config from a TOML file with env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./dlo.toml
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: DloConfig = Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::DloError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Provider chain used by [`DloConfig::load`].
    ///
    /// `DLO_SMTP__HOST` style variables address nested keys. The bare
    /// `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS` and `SMTP_FROM`
    /// variables of older deployments are merged last.
    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DLO_").split("__"))
            .merge(Env::prefixed("SMTP_").map(legacy_smtp_key))
    }
}

fn legacy_smtp_key(key: &UncasedStr) -> Uncased<'_> {
    match key.as_str().to_ascii_lowercase().as_str() {
        "user" => "smtp.username".into(),
        "pass" => "smtp.password".into(),
        "from" => "smtp.from_address".into(),
        other => format!("smtp.{other}").into(),
    }
}

fn default_config_path() -> String {
    "dlo.toml".to_string()
}
