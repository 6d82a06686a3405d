use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::errors::FlowResult;
use crate::messages;

const CONFIG_DIR_NAME: &str = "quote_flow";
const CONFIG_FILE_NAME: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Tunables shared by every flow. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub locale: String,
    /// Delay before a successful quote wizard closes, long enough for the
    /// success animation.
    pub quote_close_delay_ms: u64,
    /// Delay before a successful report or dispute closes, long enough to
    /// read the confirmation.
    pub report_close_delay_ms: u64,
    pub geolocation_timeout_ms: u64,
    pub generic_error_message: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            locale: "tr-TR".into(),
            quote_close_delay_ms: 1500,
            report_close_delay_ms: 3000,
            geolocation_timeout_ms: 10_000,
            generic_error_message: messages::GENERIC_SUBMIT_ERROR.into(),
        }
    }
}

impl FlowConfig {
    pub fn quote_close_delay(&self) -> Duration {
        Duration::from_millis(self.quote_close_delay_ms)
    }

    pub fn report_close_delay(&self) -> Duration {
        Duration::from_millis(self.report_close_delay_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}

/// Loads and saves [`FlowConfig`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manager for `<platform config dir>/quote_flow/config.json`.
    pub fn default_location() -> Self {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn with_base_dir(base: &Path) -> Self {
        Self::new(base.join(CONFIG_FILE_NAME))
    }

    pub fn load(&self) -> FlowResult<FlowConfig> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(FlowConfig::default())
        }
    }

    pub fn save(&self, config: &FlowConfig) -> FlowResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> FlowResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/a/config.json")),
            PathBuf::from("/a/config.json.tmp")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: FlowConfig = serde_json::from_str(r#"{"quote_close_delay_ms": 800}"#).unwrap();
        assert_eq!(config.quote_close_delay(), Duration::from_millis(800));
        assert_eq!(config.report_close_delay_ms, 3000);
        assert_eq!(config.locale, "tr-TR");
    }
}
