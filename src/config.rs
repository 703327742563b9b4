//! Runtime configuration, read from TOML. Every field has a default so an
//! empty file (or no file at all) is a valid configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::capitalize_first;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "desiertos.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub site: SiteConfig,
    pub narrative: NarrativeConfig,
    pub export: ExportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// The JSON dataset
    pub dataset: PathBuf,
    /// Optional GeoJSON with country outlines for the map
    pub outlines: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data.json"),
            outlines: None,
        }
    }
}

/// Where the interactive site lives and how its pages are titled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub origin: String,
    pub base_path: String,
    /// Output directory of share pages, also the URL segment they are served from
    pub pages_dir: PathBuf,
    pub title_prefix: String,
    pub default_title: String,
    pub default_description: String,
    /// Display names by country key; missing keys are capitalised
    pub countries: BTreeMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let countries = [
            ("argentina", "Argentina"),
            ("chile", "Chile"),
            ("colombia", "Colombia"),
            ("mexico", "México"),
            ("peru", "Perú"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            origin: "https://coldfoot.studio".to_string(),
            base_path: "/desiertos-latinoamerica/experiments/d3-viz".to_string(),
            pages_dir: PathBuf::from("static-pages"),
            title_prefix: "Desiertos".to_string(),
            default_title: "DESIERTOS".to_string(),
            default_description: "Explora visualizaciones interactivas de datos sobre desiertos y periodismo local en Latinoamérica.".to_string(),
            countries,
        }
    }
}

impl SiteConfig {
    /// Origin plus base path, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.base_path.trim_end_matches('/'))
    }

    pub fn country_name(&self, key: &str) -> String {
        self.countries
            .get(key)
            .cloned()
            .unwrap_or_else(|| capitalize_first(key))
    }
}

/// Narrative (long-form) pages generated from the NARRATIVE blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub title_prefix: String,
    /// HTML template with `{{...}}` placeholders; built-in page when unset
    pub template: Option<PathBuf>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://desiertosinformativos.fundaciongabo.org/static/".to_string(),
            output_dir: PathBuf::from("static"),
            title_prefix: "Desiertos de Noticias Locales".to_string(),
            template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for CSV and SVG downloads
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Log file used while the terminal UI owns the screen
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("desiertos.log"),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid configuration")
    }

    /// Load an explicit file, else `desiertos.toml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [data]
            dataset = "out/data.json"

            [site]
            origin = "https://example.org/"
            base_path = "/viz"

            [site.countries]
            brasil = "Brasil"
            "#,
        )
        .unwrap();

        assert_eq!(config.data.dataset, PathBuf::from("out/data.json"));
        assert_eq!(config.site.base_url(), "https://example.org/viz");
        assert_eq!(config.site.title_prefix, "Desiertos");
        assert_eq!(config.site.country_name("brasil"), "Brasil");
        // Table replaced wholesale, unknown keys are capitalised
        assert_eq!(config.site.country_name("mexico"), "Mexico");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_default_country_names_keep_accents() {
        let site = SiteConfig::default();
        assert_eq!(site.country_name("peru"), "Perú");
        assert_eq!(site.country_name("uruguay"), "Uruguay");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        assert!(Config::load(Some(Path::new("/nonexistent/desiertos.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().log.level, "debug");
    }
}
