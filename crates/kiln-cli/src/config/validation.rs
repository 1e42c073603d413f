use crate::config::{KilnConfig, PIPELINE_NAMES};
use crate::error::{ConfigError, Result};
use kiln_pipeline::PatternSet;
use path_clean::PathClean;
use std::path::{Component, Path};

/// Accepted debounce window, in milliseconds.
pub const DEBOUNCE_RANGE: std::ops::RangeInclusive<u64> = 10..=2000;

impl KilnConfig {
    /// Validate configuration for logical consistency.
    ///
    /// `root` is the project root that relative output paths must stay inside.
    pub fn validate(&self, root: &Path) -> Result<()> {
        for (field, port) in [
            ("reload_port", self.reload_port),
            ("server_port", self.server_port),
        ] {
            if port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    hint: "Use a port between 1 and 65535".to_string(),
                }
                .into());
            }
        }

        if self.reload_port == self.server_port {
            return Err(ConfigError::ConflictingOptions(format!(
                "reload_port and server_port are both {}",
                self.server_port
            ))
            .into());
        }

        if !DEBOUNCE_RANGE.contains(&self.debounce_ms) {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms".to_string(),
                value: self.debounce_ms.to_string(),
                hint: format!(
                    "Use a window between {} and {} ms (100-300 works well)",
                    DEBOUNCE_RANGE.start(),
                    DEBOUNCE_RANGE.end()
                ),
            }
            .into());
        }

        if self.run_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "run_timeout_ms".to_string(),
                value: "0".to_string(),
                hint: "Remove the key to disable the timeout".to_string(),
            }
            .into());
        }

        if self.scripts.file_name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "scripts.file_name".to_string(),
                hint: "Name the bundle file, e.g. \"bundle.js\"".to_string(),
            }
            .into());
        }

        for name in PIPELINE_NAMES {
            let inputs = self.inputs_of(name).unwrap_or_default();
            if inputs.is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.inputs", name),
                    hint: "List at least one input pattern".to_string(),
                }
                .into());
            }
            if let Err(e) = PatternSet::new(root, inputs) {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.inputs", name),
                    value: e.pattern,
                    hint: format!("Fix the glob pattern ({})", e.source),
                }
                .into());
            }
        }

        for (field, path) in [
            ("out_dir", &self.out_dir),
            ("scripts.output", &self.scripts.output),
            ("styles.output", &self.styles.output),
            ("markup.output", &self.markup.output),
            ("images.output", &self.images.output),
        ] {
            if !stays_inside(path) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: path.display().to_string(),
                    hint: "Output paths must be relative and stay inside the project root"
                        .to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// True when `path` is relative and does not climb out of its base.
fn stays_inside(path: &Path) -> bool {
    let cleaned = path.clean();
    cleaned.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
