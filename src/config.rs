use std::path::PathBuf;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::i18n::LanguagePolicy;

/// Config file looked up in the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "medassist";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "MEDASSIST_CONFIG_FILE")]
    pub config: Option<String>,

    /// Backend base URL
    #[arg(long, env = "MEDASSIST_BASE_URL")]
    pub base_url: Option<String>,

    /// Interface language used when none is persisted
    #[arg(long)]
    pub lang: Option<String>,

    /// How the first language is chosen: restore or prompt
    #[arg(long)]
    pub language_policy: Option<String>,

    /// Preference file path
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub language: LanguageConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LanguageConfig {
    pub default: String,
    pub policy: LanguagePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
    pub filter: String,
}

impl ClientConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("backend.base_url", "http://127.0.0.1:8080")?
            .set_default("language.default", "en")?
            .set_default("language.policy", "restore")?
            .set_default("preferences.path", "medassist-preferences.json")?
            .set_default("logging.json", false)?
            .set_default("logging.filter", "info")?;

        // 2. Config file: explicit path must exist, the working-directory one may not
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // 3. Environment, e.g. MEDASSIST_BACKEND__BASE_URL=http://10.0.0.5:8080
        builder = builder.add_source(
            Environment::with_prefix("MEDASSIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and the env vars clap maps onto them) win
        if let Some(url) = cli.base_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(lang) = cli.lang {
            builder = builder.set_override("language.default", lang)?;
        }
        if let Some(policy) = cli.language_policy {
            builder = builder.set_override("language.policy", policy.to_lowercase())?;
        }
        if let Some(prefs) = cli.prefs {
            builder = builder.set_override("preferences.path", prefs.to_string_lossy().into_owned())?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_defaults() {
        let config = ClientConfig::load_from_args([
            "medassist-client",
            "--base-url",
            "http://backend:9000",
            "--language-policy",
            "Prompt",
            "--lang",
            "hi",
        ])
        .unwrap();

        assert_eq!(config.backend.base_url, "http://backend:9000");
        assert_eq!(config.language.policy, LanguagePolicy::Prompt);
        assert_eq!(config.language.default, "hi");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result =
            ClientConfig::load_from_args(["medassist-client", "--language-policy", "ask-twice"]);
        assert!(result.is_err());
    }
}
