use crate::output;
use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Flags configuration keys that dirsync does not recognize
pub struct ConfigValidator {
    /// Fully qualified keys dirsync understands
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a validator with the known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "sync",
            "sync.follow_symlinks",
            "sync.ignore_patterns",
            "sync.dry_run",
            "output",
            "output.pretty_json",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Warn about unknown keys in a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path)?;
        for field in self.unknown_fields(&content)? {
            output::warning(&format!(
                "Unknown configuration field in {}: {}",
                config_path.display(),
                field.yellow()
            ));
        }

        Ok(())
    }

    /// Collect unknown keys from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML
    pub fn unknown_fields(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Value = toml::from_str(content)?;
        let mut unknown = Vec::new();
        self.check_table(&parsed, "", &mut unknown);
        Ok(unknown)
    }

    /// Recursively checks a TOML table for unknown fields
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        if let toml::Value::Table(map) = table {
            for (key, value) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                if !self.known_fields.contains(full_key.as_str()) {
                    unknown.push(full_key);
                } else if let toml::Value::Table(_) = value {
                    self.check_table(value, &full_key, unknown);
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
