use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LitscopeError, Result};
use crate::models::SourceKind;

/// Root application configuration, loaded from `~/.config/litscope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub workspace: WorkspaceConfig,
    pub dedup: DedupConfig,
    pub citations: CitationsConfig,
    pub crossref: CrossRefConfig,
    pub tables: TablesConfig,
    pub logging: LoggingConfig,
}

/// File locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub queries_dir: PathBuf,
    pub output: PathBuf,
    pub papers_dir: PathBuf,
    pub text_dir: PathBuf,
    pub titles: PathBuf,
    pub cross_references: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub min_year: i32,
    pub source_order: Vec<String>,
    /// Abort on the first malformed record instead of skipping it.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationsConfig {
    pub enabled: bool,
    pub cache_path: PathBuf,
    pub base_url: String,
    pub api_key_env: String,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub flush_each_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossRefConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    #[default]
    Error,
    Passthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Alias/label maps; built-in defaults when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_path: Option<PathBuf>,
    pub unmapped: UnmappedPolicy,
    pub min_tool_citations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            queries_dir: PathBuf::from("queries"),
            output: PathBuf::from("coalpaper.csv"),
            papers_dir: PathBuf::from("papers"),
            text_dir: PathBuf::from("papers_as_text"),
            titles: PathBuf::from("titles.txt"),
            cross_references: PathBuf::from("cross_references.csv"),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_year: 2010,
            source_order: SourceKind::DEFAULT_ORDER
                .iter()
                .map(|kind| kind.prefix().to_string())
                .collect(),
            strict: false,
        }
    }
}

impl Default for CitationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_path: PathBuf::from(".cache.citations.json"),
            base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            api_key_env: "SEMANTIC_SCHOLAR_API_KEY".to_string(),
            min_interval_ms: 1000,
            max_retries: 3,
            flush_each_update: true,
        }
    }
}

impl Default for CrossRefConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crossref.org".to_string(),
            polite_email: None,
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            maps_path: None,
            unmapped: UnmappedPolicy::Error,
            min_tool_citations: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/litscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LITSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("litscope")
            .join("config.toml")
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.source_order()?;
        if self.citations.max_retries > 10 {
            return Err(LitscopeError::ConfigError(format!(
                "citations.max_retries must be at most 10, got {}",
                self.citations.max_retries
            )));
        }
        Ok(())
    }

    /// Parsed `dedup.source_order`.
    pub fn source_order(&self) -> Result<Vec<SourceKind>> {
        if self.dedup.source_order.is_empty() {
            return Err(LitscopeError::ConfigError(
                "dedup.source_order must list at least one source".to_string(),
            ));
        }
        SourceKind::parse_order(&self.dedup.source_order)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.dedup.min_year, 2010);
        assert_eq!(cfg.source_order().unwrap(), SourceKind::DEFAULT_ORDER.to_vec());
        assert_eq!(cfg.tables.unmapped, UnmappedPolicy::Error);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.dedup.min_year = 2012;
        cfg.tables.unmapped = UnmappedPolicy::Passthrough;
        std::fs::write(&path, cfg.to_toml().unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.dedup.min_year, 2012);
        assert_eq!(loaded.tables.unmapped, UnmappedPolicy::Passthrough);
        assert_eq!(loaded.workspace.queries_dir, cfg.workspace.queries_dir);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dedup]\nsource_order = [\"ACM\", \"IEEE\"]\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.dedup.min_year, 2010);
        assert_eq!(
            cfg.source_order().unwrap(),
            vec![SourceKind::AcmDl, SourceKind::Ieee]
        );
        assert_eq!(cfg.citations.max_retries, 3);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dedup]\nsource_order = [\"IEEE\", \"DBLP\"]\n").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(LitscopeError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.workspace.output, PathBuf::from("coalpaper.csv"));
    }
}
