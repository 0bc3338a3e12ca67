use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_bucket: String,
    pub model_prefix: String,
    pub model_manifest: String,
    pub model_dir: PathBuf,
    pub predictions_table: String,
    pub max_image_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port_str = get("PORT", "8080");
        let port = port_str.parse::<u16>().map_err(|_| ConfigError::Invalid {
            key: "PORT",
            value: port_str.clone(),
        })?;

        let max_str = get("MAX_IMAGE_BYTES", "1000000");
        let max_image_bytes = max_str
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::Invalid {
                key: "MAX_IMAGE_BYTES",
                value: max_str.clone(),
            })?;

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            model_bucket: get("MODEL_BUCKET", "mlgcmodel-abdisetiawan"),
            model_prefix: get("MODEL_PREFIX", "model/"),
            model_manifest: get("MODEL_MANIFEST", "model.json"),
            model_dir: PathBuf::from(get("MODEL_DIR", "./model")),
            predictions_table: get("PREDICTIONS_TABLE", "predictions"),
            max_image_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
