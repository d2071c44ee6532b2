use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::actions::domain;

/// Top-level configuration loaded from `config.yaml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Actions that are never registered, even when built in.
    #[serde(default)]
    pub exclude_actions: Vec<String>,
    /// Default allow-list for decision schemas and function definitions.
    /// `None` offers every eligible action.
    #[serde(default)]
    pub include_actions: Option<Vec<String>>,
    /// Per-action domain filters, replacing the built-in filter.
    ///
    /// ```yaml
    /// domain_overrides:
    ///   extract_search_query: ["*.duckduckgo.com"]
    /// ```
    #[serde(default)]
    pub domain_overrides: HashMap<String, Vec<String>>,
    /// Log filter used when `RUST_LOG` is unset (e.g. `debug`).
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Read and parse a YAML configuration file.
    ///
    /// A missing file falls back to `<path>.bak` before giving up.
    pub async fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut bak_name = path.as_os_str().to_os_string();
                bak_name.push(".bak");
                let bak_path = PathBuf::from(bak_name);
                match tokio::fs::read_to_string(&bak_path).await {
                    Ok(c) => {
                        tracing::warn!(
                            path = %path.display(),
                            bak = %bak_path.display(),
                            "config file not found, falling back to .bak"
                        );
                        c
                    }
                    Err(_) => {
                        return Err(e).with_context(|| {
                            format!("failed to read config file: {}", path.display())
                        });
                    }
                }
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };

        let config = Config::parse(&contents)?;

        tracing::debug!(
            excluded = config.exclude_actions.len(),
            overrides = config.domain_overrides.len(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Parse and validate YAML text.  An empty document yields the defaults.
    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml_ng::from_str(contents).context("failed to parse config YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub async fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(p) => Config::load(p).await,
            None => Ok(Config::default()),
        }
    }

    /// Validate semantic constraints that serde cannot enforce.
    fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref include) = self.include_actions {
            for name in include {
                if self.exclude_actions.contains(name) {
                    anyhow::bail!("config: action '{name}' is both excluded and included");
                }
            }
        }

        for (action, patterns) in &self.domain_overrides {
            if patterns.is_empty() {
                anyhow::bail!(
                    "config: domain override for '{action}' is empty (use exclude_actions to hide it)"
                );
            }
            for pattern in patterns {
                domain::check_pattern(pattern)
                    .map_err(|reason| anyhow::anyhow!("config: action '{action}': {reason}"))?;
            }
        }

        Ok(())
    }

    /// Serialize and write the configuration back to a YAML file.
    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = serde_yaml_ng::to_string(self).context("serialize config YAML")?;
        tokio::fs::write(path, &contents)
            .await
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}
