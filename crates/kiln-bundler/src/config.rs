//! Bundler configuration.
//!
//! [`BundlerConfig::load`] layers, lowest priority first: built-in defaults,
//! `kiln.config.json` (or an explicit file), then `KILN_`-prefixed environment
//! variables. Nested keys are separated by a double underscore, so
//! `KILN_OUTPUT__GLOBAL_PREFIX=__kiln` sets `output.globalPrefix`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use kiln_graph::TransformOptions;
use kiln_output::OutputOptions;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "kiln.config.json";

/// Options of one delta calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeltaOptions {
    /// Entry module. Relative paths are taken from `transform.projectRoot`.
    pub entry_file: PathBuf,
    /// Base transform options, finalised once per calculator by the
    /// transformer.
    pub transform: TransformOptions,
}

impl DeltaOptions {
    pub fn new(entry_file: impl Into<PathBuf>) -> Self {
        Self {
            entry_file: entry_file.into(),
            transform: TransformOptions::default(),
        }
    }

    pub fn with_transform(mut self, transform: TransformOptions) -> Self {
        self.transform = transform;
        self
    }

    /// Absolute entry path.
    pub fn entry_path(&self) -> PathBuf {
        if self.entry_file.is_absolute() || self.transform.project_root.as_os_str().is_empty() {
            self.entry_file.clone()
        } else {
            self.transform.project_root.join(&self.entry_file)
        }
    }
}

/// Everything needed to serve one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundlerConfig {
    pub delta: DeltaOptions,
    pub output: OutputOptions,
}

impl BundlerConfig {
    pub fn new(delta: DeltaOptions) -> Self {
        Self {
            delta,
            output: OutputOptions::default(),
        }
    }

    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    /// Load configuration from defaults, a config file and the environment.
    ///
    /// Without `config_path`, `kiln.config.json` in the current directory is
    /// used if it exists. An explicit path that does not exist is an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed("KILN_")
                .lowercase(false)
                .split("__")
                .map(|key| env_key(key.as_str()).into()),
        );

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: "Check kiln.config.json syntax and field types".to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delta.entry_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "delta.entryFile".to_string(),
                hint: "Set the entry module, e.g. \"entryFile\": \"src/index.js\"".to_string(),
            });
        }
        if let Some(template) = &self.output.run_module_statement {
            if !template.contains("{id}") {
                return Err(ConfigError::InvalidValue {
                    field: "output.runModuleStatement".to_string(),
                    value: template.clone(),
                    hint: "The template must contain an {id} placeholder".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Turn a split environment key (`DELTA.ENTRY_FILE`) into a config key
/// (`delta.entryFile`).
fn env_key(key: &str) -> String {
    key.split('.')
        .map(|segment| {
            let mut out = String::with_capacity(segment.len());
            let mut upper_next = false;
            for ch in segment.chars() {
                if ch == '_' {
                    upper_next = !out.is_empty();
                } else if upper_next {
                    out.push(ch.to_ascii_uppercase());
                    upper_next = false;
                } else {
                    out.push(ch.to_ascii_lowercase());
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}
