//! Optional user configuration (`config.toml`).

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// What a bare `print` command shows.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    #[default]
    Values,
    Texts,
}

impl PrintMode {
    pub fn from_arg(arg: &str) -> Option<PrintMode> {
        match arg {
            "values" => Some(PrintMode::Values),
            "texts" => Some(PrintMode::Texts),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: String,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub print: PrintMode,
    pub stop_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "warn".to_string(),
            output: OutputConfig::default(),
        }
    }
}

/// Load the configuration.
///
/// An explicit `config_file` wins over the user config dir; `skip` ignores
/// both. Any problem falls back to defaults and is reported as a warning.
pub fn load_config(config_file: Option<&Path>, skip: bool) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    if skip {
        return (Config::default(), warnings);
    }

    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
        assert_eq!(Config::default().log_level, "warn");
        assert_eq!(Config::default().output.print, PrintMode::Values);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
log_level = "debug"

[output]
print = "texts"
stop_on_error = true
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output.print, PrintMode::Texts);
        assert!(config.output.stop_on_error);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("colour = true").is_err());
        assert!(parse_config("[output]\nwidth = 3").is_err());
        assert!(parse_config("[output]\nprint = \"json\"").is_err());
    }

    #[test]
    fn test_skip_ignores_explicit_file() {
        let (config, warnings) = load_config(Some(Path::new("/nonexistent/tabula.toml")), true);
        assert_eq!(config, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let (config, warnings) = load_config(Some(Path::new("/nonexistent/tabula.toml")), false);
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn test_bad_file_falls_back_with_warning() {
        let path = std::env::temp_dir().join(format!("tabula-config-{}.toml", std::process::id()));
        std::fs::write(&path, "log_level = 3").unwrap();
        let (config, warnings) = load_config(Some(&path), false);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(warnings[0].starts_with("Failed to parse"));
    }
}
