use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::decision::DecisionPolicy;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub model_file: String,
    /// Required width and height of input images, in pixels.
    pub image_size: u32,
    pub class_names: Vec<String>,
    pub decision: DecisionPolicy,
    pub max_payload_bytes: usize,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            models_dir: PathBuf::from("models"),
            model_file: "catordog_model.onnx".to_string(),
            image_size: 160,
            class_names: vec!["cat".to_string(), "dog".to_string()],
            decision: DecisionPolicy::default(),
            max_payload_bytes: 10 * 1024 * 1024,
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration from `CONFIG_PATH` (default `config.yaml`), then apply
/// environment overrides. A missing file means defaults.
pub fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let mut config = from_file(Path::new(&config_path))?;

    if let Ok(dir) = env::var("MODELS_DIR") {
        config.models_dir = PathBuf::from(dir);
    }
    if let Ok(file) = env::var("MODEL_FILE") {
        config.model_file = file;
    }
    if let Ok(host) = env::var("HOST") {
        config.host = host;
    }
    if let Ok(port) = env::var("PORT") {
        config.port = port
            .parse()
            .map_err(|_| Error::config(format!("invalid PORT value: '{}'", port)))?;
    }

    config.validate()?;
    Ok(config)
}

pub fn from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No configuration file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    debug!("Loading configuration from: {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&raw).map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.class_names.len() != 2 {
            return Err(Error::config(format!(
                "expected exactly two class names, got {}",
                self.class_names.len()
            )));
        }
        if self.image_size == 0 {
            return Err(Error::config("image_size must be positive"));
        }
        let thresholds = [
            ("confidence_threshold", self.decision.confidence_threshold),
            ("margin_threshold", self.decision.margin_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!("{} must be within [0, 1]", name)));
            }
        }
        Ok(())
    }

    /// Location of the model artifact.
    ///
    /// Tries `models_dir`, then the directory of the running executable. If
    /// neither holds the file the `models_dir` path is returned and loading
    /// will report it.
    pub fn model_path(&self) -> PathBuf {
        let primary = self.models_dir.join(&self.model_file);
        if primary.exists() {
            return primary;
        }

        let bundled = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&self.model_file)));
        match bundled {
            Some(path) if path.exists() => path,
            _ => primary,
        }
    }
}
