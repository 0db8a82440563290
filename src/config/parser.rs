use super::Config;
use crate::utils::IgnoreSet;
use anyhow::{Context, Result};
use std::path::Path;

pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    for pattern in &config.sync.ignore_patterns {
        if pattern.is_empty() {
            anyhow::bail!("Ignore patterns cannot be empty");
        }
        // Patterns are matched against single names, never paths
        if pattern.contains('/') {
            anyhow::bail!("Ignore pattern '{pattern}' must match a single name, not a path");
        }
    }

    IgnoreSet::new(&config.sync.ignore_patterns)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() -> Result<()> {
        let toml = r#"
[sync]
follow_symlinks = true
ignore_patterns = ["*.swp", ".DS_Store"]
dry_run = true

[output]
pretty_json = false
"#;

        let config = parse_config_str(toml)?;
        assert!(config.sync.follow_symlinks);
        assert!(config.sync.dry_run);
        assert_eq!(config.sync.ignore_patterns, vec!["*.swp", ".DS_Store"]);
        assert!(!config.output.pretty_json);
        Ok(())
    }

    #[test]
    fn test_parse_empty_config() -> Result<()> {
        let config = parse_config_str("")?;
        assert!(config.output.pretty_json);
        assert!(config.sync.ignore_patterns.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_path_patterns() {
        let err = parse_config_str("[sync]\nignore_patterns = [\"build/out\"]\n")
            .expect_err("path pattern must be rejected");
        assert!(err.to_string().contains("single name"));
    }

    #[test]
    fn test_rejects_invalid_glob() {
        assert!(parse_config_str("[sync]\nignore_patterns = [\"[oops\"]\n").is_err());
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(parse_config_str("[sync\nfollow_symlinks = yes").is_err());
    }
}
