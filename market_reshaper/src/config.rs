use crate::error::{ReshapeError, Result};
use crate::schema::SchemaMapping;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Mfrr,
    Fcr,
}

/// Where one source lives and how its columns are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    /// A file path or a glob pattern; matched files are concatenated in path order.
    pub path: String,
    pub timestamp_column: String,
    pub zone_column: Option<String>,
    /// Mapping CSV; the built-in mapping for `kind` when absent.
    pub schema_file: Option<PathBuf>,
}

impl SourceConfig {
    pub fn mfrr(path: &str) -> Self {
        Self {
            name: "mFRR".to_string(),
            kind: SourceKind::Mfrr,
            path: path.to_string(),
            timestamp_column: "Period".to_string(),
            zone_column: Some("Elområde".to_string()),
            schema_file: None,
        }
    }

    pub fn fcr(path: &str) -> Self {
        Self {
            name: "FCR".to_string(),
            kind: SourceKind::Fcr,
            path: path.to_string(),
            timestamp_column: "Datum".to_string(),
            zone_column: None,
            schema_file: None,
        }
    }

    pub fn schema(&self) -> Result<SchemaMapping> {
        match &self.schema_file {
            Some(file) => SchemaMapping::from_csv(file),
            None => Ok(match self.kind {
                SourceKind::Mfrr => SchemaMapping::default_mfrr(),
                SourceKind::Fcr => SchemaMapping::default_fcr(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub mfrr: SourceConfig,
    pub fcr: SourceConfig,
    /// Seconds a loaded table stays valid; `None` keeps it until the files change.
    pub cache_ttl_secs: Option<u64>,
    pub default_zones: Vec<String>,
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mfrr: SourceConfig::mfrr("MFRR CM.csv"),
            fcr: SourceConfig::fcr("FCR.csv"),
            cache_ttl_secs: Some(300),
            default_zones: vec!["SN1".to_string()],
            top_n: 5,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(ReshapeError::Config("top_n must be at least 1".to_string()));
        }
        for source in [&self.mfrr, &self.fcr] {
            if source.path.trim().is_empty() {
                return Err(ReshapeError::Config(format!("source '{}' has no path", source.name)));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
