use crate::cli::ConfigArgs;
use crate::config::{KilnConfig, DEFAULT_CONFIG_FILE};
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use kiln_pipeline::Environment;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Values set from the command line; `None` leaves lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
}

impl From<&ConfigArgs> for ConfigOverrides {
    fn from(args: &ConfigArgs) -> Self {
        Self {
            environment: args.production.then_some(Environment::Production),
            reload_port: args.reload_port,
            server_port: args.server_port,
        }
    }
}

impl KilnConfig {
    /// Load configuration for the project at `root`.
    ///
    /// Layers, lowest priority first: defaults, the config file (`config_path`
    /// or `kiln.toml` under `root`), `NODE_ENV`/`LIVERELOAD_PORT`/`SERVER_PORT`,
    /// `KILN_*` variables, then `overrides`. The result is validated.
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let config = Self::figment(root, config_path, overrides)?
            .extract::<Self>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: "Check kiln.toml syntax and field types".to_string(),
            })?;

        config.validate(root)?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    pub fn figment(
        root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default_config()));

        if let Some(path) = config_file(root, config_path)? {
            tracing::debug!(path = %path.display(), "reading config file");
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment
            .merge(conventional_env())
            .merge(Env::prefixed("KILN_").split("__"))
            .merge(Serialized::defaults(overrides)))
    }
}

/// Resolve the config file to read, if any.
///
/// An explicit path must exist; the default `kiln.toml` is optional.
fn config_file(root: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(ConfigError::NotFound(path).into())
            }
        }
        None => {
            let path = root.join(DEFAULT_CONFIG_FILE);
            Ok(path.is_file().then_some(path))
        }
    }
}

/// `NODE_ENV`, `LIVERELOAD_PORT` and `SERVER_PORT`, mapped onto config keys.
fn conventional_env() -> Env {
    Env::raw()
        .only(&["NODE_ENV", "LIVERELOAD_PORT", "SERVER_PORT"])
        .map(|key| {
            let key = key.as_str();
            if key.eq_ignore_ascii_case("NODE_ENV") {
                "environment".into()
            } else if key.eq_ignore_ascii_case("LIVERELOAD_PORT") {
                "reload_port".into()
            } else {
                "server_port".into()
            }
        })
}
