use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

#[derive(Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub base_url: Option<String>,
    /// HTTP timeout such as `30s`. The client default applies when unset.
    pub timeout: Option<String>,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("/etc/dreamhost-dns/config").required(false));

        if let Some(path) = path {
            let path = shellexpand::tilde(path);
            builder = builder.add_source(File::with_name(&path));
        }

        let cfg = builder
            .add_source(Environment::with_prefix("DREAMHOST"))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    pub fn timeout(&self) -> Result<Option<Duration>, SettingsError> {
        self.timeout
            .as_deref()
            .map(humantime::parse_duration)
            .transpose()
            .map_err(SettingsError::Timeout)
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid timeout: {0}")]
    Timeout(#[source] humantime::DurationError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn settings(timeout: Option<&str>) -> Settings {
        Settings {
            api_key: "apikey123".to_owned(),
            base_url: None,
            timeout: timeout.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn timeout_is_optional() {
        assert_eq!(settings(None).timeout().unwrap(), None);
    }

    #[test]
    fn timeout_parses_humantime() {
        assert_eq!(
            settings(Some("1m 30s")).timeout().unwrap(),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn invalid_timeout() {
        let err = settings(Some("soon")).timeout().unwrap_err();
        assert!(matches!(err, SettingsError::Timeout(_)));
    }

    #[test]
    fn debug_output_hides_api_key() {
        assert!(!format!("{:?}", settings(None)).contains("apikey123"));
    }

    #[test]
    fn loads_explicit_config_file() {
        let file = config_file(
            r#"
api_key = "apikey123"
base_url = "http://localhost:8080/"
timeout = "30s"
"#,
        );

        let cfg = Settings::new(file.path().to_str()).unwrap();
        assert_eq!(cfg.api_key, "apikey123");
        assert_eq!(cfg.base_url.as_deref(), Some("http://localhost:8080/"));
        assert_eq!(cfg.timeout().unwrap(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn missing_api_key() {
        let file = config_file(r#"base_url = "http://localhost:8080/""#);

        let err = Settings::new(file.path().to_str()).unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }

    #[test]
    fn missing_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Settings::new(path.to_str()).unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }
}
