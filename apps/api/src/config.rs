use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::docx::substitution::DEFAULT_RUN_PROPERTIES;
use crate::docx::RunFormatting;
use crate::generation::generator::GenerationSettings;
use crate::generation::naming::OutputNaming;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub template_path: String,
    pub slot_capacity: u32,
    pub default_run_properties: String,
    pub output_stem: String,
    pub max_pages: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let slot_capacity: u32 = parse_var(&lookup, "SLOT_CAPACITY", 325)?;
        if slot_capacity == 0 {
            bail!("SLOT_CAPACITY must be greater than zero");
        }
        let max_pages: usize = parse_var(&lookup, "MAX_PAGES", 100)?;
        if max_pages == 0 {
            bail!("MAX_PAGES must be greater than zero");
        }
        let output_stem = get("OUTPUT_STEM", "USB_Stickers");
        if !is_valid_stem(&output_stem) {
            bail!("OUTPUT_STEM must be non-empty printable ASCII without quotes, backslashes or slashes: {output_stem:?}");
        }

        Ok(Config {
            template_path: get("TEMPLATE_PATH", "template.docx"),
            slot_capacity,
            default_run_properties: get("DEFAULT_RUN_PROPERTIES", DEFAULT_RUN_PROPERTIES),
            output_stem,
            max_pages,
            port: parse_var(&lookup, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
        })
    }

    pub fn run_formatting(&self) -> RunFormatting {
        RunFormatting::new(self.default_run_properties.clone())
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            naming: OutputNaming::new(self.output_stem.clone()),
            max_pages: self.max_pages,
        }
    }
}

/// The stem ends up inside a quoted `Content-Disposition` filename and inside zip entry names.
fn is_valid_stem(stem: &str) -> bool {
    !stem.trim().is_empty()
        && stem
            .chars()
            .all(|c| (c.is_ascii_graphic() || c == ' ') && !matches!(c, '"' | '\\' | '/'))
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.template_path, "template.docx");
        assert_eq!(config.slot_capacity, 325);
        assert_eq!(config.default_run_properties, DEFAULT_RUN_PROPERTIES);
        assert_eq!(config.output_stem, "USB_Stickers");
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[("SLOT_CAPACITY", "65"), ("PORT", "9000"), ("OUTPUT_STEM", "Labels")])
            .unwrap();
        assert_eq!(config.slot_capacity, 65);
        assert_eq!(config.port, 9000);
        assert_eq!(config.generation_settings().naming.single(), "Labels.docx");
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("SLOT_CAPACITY", "many")]).is_err());
        assert!(config_from(&[("SLOT_CAPACITY", "0")]).is_err());
        assert!(config_from(&[("PORT", "70000")]).is_err());
        assert!(config_from(&[("MAX_PAGES", "0")]).is_err());
    }

    #[test]
    fn test_output_stem_must_be_header_safe() {
        assert!(config_from(&[("OUTPUT_STEM", "a\"b")]).is_err());
        assert!(config_from(&[("OUTPUT_STEM", "a\\b")]).is_err());
        assert!(config_from(&[("OUTPUT_STEM", "dir/name")]).is_err());
        assert!(config_from(&[("OUTPUT_STEM", "Étiquettes")]).is_err());
        assert!(config_from(&[("OUTPUT_STEM", "line\nbreak")]).is_err());
        assert!(config_from(&[("OUTPUT_STEM", "  ")]).is_err());

        let config = config_from(&[("OUTPUT_STEM", "Lab Stickers-2024")]).unwrap();
        assert_eq!(config.output_stem, "Lab Stickers-2024");
    }
}
