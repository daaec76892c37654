use meter_client::domain::BlockRule;
use serde::Deserialize;
use std::{fs, io::ErrorKind, path::PathBuf};

use crate::report::ReportFormat;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://property.db".to_string(),
            max_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub prefix: String,
    pub min: u32,
    pub max: u32,
}

impl Default for BlockConfig {
    fn default() -> Self {
        let rule = BlockRule::default();
        Self {
            prefix: rule.prefix,
            min: rule.min,
            max: rule.max,
        }
    }
}

impl BlockConfig {
    pub fn rule(&self) -> BlockRule {
        BlockRule {
            prefix: self.prefix.clone(),
            min: self.min,
            max: self.max,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub format: ReportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("exports"),
            format: ReportFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    pub batch_size: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub blocks: BlockConfig,
    pub export: ExportConfig,
    pub backfill: BackfillConfig,
}

impl AppConfig {
    /// Read the TOML file named by `BILLING_CONFIG` (default `billing-config.toml`).
    /// A missing file means all defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("BILLING_CONFIG").unwrap_or_else(|_| "billing-config.toml".to_string());
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path, "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.database.url, "sqlite://property.db");
        assert_eq!(cfg.blocks.rule(), BlockRule::default());
        assert_eq!(cfg.export.format, ReportFormat::Text);
        assert_eq!(cfg.backfill.batch_size, 500);
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let cfg = AppConfig::from_toml(
            r#"
            [blocks]
            prefix = "12/"
            max = 10

            [export]
            dir = "/tmp/reports"
            format = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.blocks.prefix, "12/");
        assert_eq!(cfg.blocks.min, 1);
        assert_eq!(cfg.blocks.max, 10);
        assert_eq!(cfg.export.dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.export.format, ReportFormat::Csv);
        assert_eq!(cfg.database.max_connections, 1);
    }
}
