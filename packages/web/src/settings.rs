use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use api::BackendConfig;

/// Server settings: defaults, then `web.toml`, then the environment
/// (`SUPABASE_URL`, `SUPABASE_SERVICE_KEY`, `HOST`, `PORT`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_service_key: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_service_key: None,
            host: "0.0.0.0".into(),
            port: 8888,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8888)?
            .add_source(
                File::with_name("web.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    /// Service-role credentials for the handlers.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::service(self.supabase_url.clone(), self.supabase_service_key.clone())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
