use std::path::{Path, PathBuf};

use interio_engine::{ProviderSettings, DEFAULT_GEMINI_API_BASE, DEFAULT_OPENAI_API_BASE};

pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
/// Base64 room photos routinely exceed axum's 2 MiB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to load env file {}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub openai_api_base: String,
    pub gemini_api_base: String,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source. Blank values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let port = match read("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
                expected: "a port number",
            })?,
            None => defaults.port,
        };
        let max_body_bytes = match read("MAX_BODY_BYTES") {
            Some(value) => match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_BODY_BYTES",
                        value,
                        expected: "a positive byte count",
                    })
                }
            },
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            openai_api_key: read("OPENAI_API_KEY"),
            google_api_key: read("GOOGLE_API_KEY").or_else(|| read("GEMINI_API_KEY")),
            cors_origins: read("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            host: read("HOST").unwrap_or(defaults.host),
            port,
            openai_api_base: read("OPENAI_API_BASE").unwrap_or(defaults.openai_api_base),
            gemini_api_base: read("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            max_body_bytes,
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            openai_api_key: self.openai_api_key.clone(),
            openai_api_base: self.openai_api_base.clone(),
            gemini_api_key: self.google_api_key.clone(),
            gemini_api_base: self.gemini_api_base.clone(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Splits a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads `path` into the process environment, or `./.env` when no path is
/// given. A missing default file is not an error. Existing variables win.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenv::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => match dotenv::dotenv() {
            Ok(loaded) => Ok(Some(loaded)),
            Err(err) if err.not_found() => Ok(None),
            Err(source) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() -> anyhow::Result<()> {
        let settings = settings_from(&[])?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.max_body_bytes, 26_214_400);
        Ok(())
    }

    #[test]
    fn variables_override_defaults() -> anyhow::Result<()> {
        let settings = settings_from(&[
            ("OPENAI_API_KEY", " sk-test "),
            ("GEMINI_API_KEY", "g-fallback"),
            ("CORS_ORIGINS", "https://app.example.com/, http://localhost:5173,,"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("MAX_BODY_BYTES", "1048576"),
        ])?;
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.google_api_key.as_deref(), Some("g-fallback"));
        assert_eq!(
            settings.cors_origins,
            vec![
                "https://app.example.com".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
        assert_eq!(settings.bind_addr(), "127.0.0.1:9100");
        assert_eq!(settings.max_body_bytes, 1_048_576);
        Ok(())
    }

    #[test]
    fn google_key_takes_precedence_and_blanks_are_unset() -> anyhow::Result<()> {
        let settings = settings_from(&[
            ("GOOGLE_API_KEY", "g-primary"),
            ("GEMINI_API_KEY", "g-fallback"),
            ("OPENAI_API_KEY", "   "),
            ("PORT", ""),
        ])?;
        assert_eq!(settings.google_api_key.as_deref(), Some("g-primary"));
        assert_eq!(settings.openai_api_key, None);
        assert_eq!(settings.port, DEFAULT_PORT);

        let provider = settings.provider_settings();
        assert_eq!(provider.gemini_api_key.as_deref(), Some("g-primary"));
        assert_eq!(provider.openai_api_base, DEFAULT_OPENAI_API_BASE);
        Ok(())
    }

    #[test]
    fn invalid_numbers_are_startup_errors() {
        let err = settings_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT must be a port number, got 'eighty'");

        let err = settings_from(&[("MAX_BODY_BYTES", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_BODY_BYTES", .. }));
    }

    #[test]
    fn env_file_populates_process_environment() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "INTERIO_CONFIG_TEST_VALUE=from-dotenv")?;
        let loaded = load_env_file(Some(file.path()))?;
        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(
            std::env::var("INTERIO_CONFIG_TEST_VALUE").ok().as_deref(),
            Some("from-dotenv")
        );
        Ok(())
    }

    #[test]
    fn missing_explicit_env_file_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("absent.env");
        let err = load_env_file(Some(&missing)).unwrap_err();
        assert!(err.to_string().starts_with("failed to load env file"));
        Ok(())
    }
}
