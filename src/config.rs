// Pipeline configuration
//
// Every field has a default, so an empty TOML file is a valid configuration.

use crate::dump::{ParserOptions, MIN_FREQUENCY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the cluster id in dump file templates
pub const CLUSTER_PLACEHOLDER: &str = "{cluster}";

/// Configuration of a cluster batch run
///
/// # Example
/// ```
/// use groum_ingest::config::PipelineConfig;
/// use std::path::PathBuf;
///
/// let config = PipelineConfig::from_toml_str("min_frequency = 10").unwrap();
/// assert_eq!(config.min_frequency, 10);
/// assert_eq!(
///     config.pattern_dump_path(3),
///     PathBuf::from("all_clusters/cluster_3/run3.out")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Patterns mined fewer times than this are dropped (anomalies are exempt)
    pub min_frequency: u32,

    /// Holds one `cluster_<id>` directory per cluster with its dumps
    pub input_root: PathBuf,

    /// Receives one `cluster_<id>` directory per processed cluster
    pub output_root: PathBuf,

    /// File name of the pattern dump, e.g. `run{cluster}.out`
    pub pattern_dump: String,

    /// File name of the anomaly dump; the file is optional
    pub anomaly_dump: String,

    /// Statistics table written under `output_root`
    pub stats_file: String,

    /// Methods a pattern must call to take part in a comparison
    pub required_methods: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_frequency: MIN_FREQUENCY,
            input_root: PathBuf::from("all_clusters"),
            output_root: PathBuf::from("clusters_out"),
            pattern_dump: "run{cluster}.out".to_string(),
            anomaly_dump: "anomalies{cluster}.out".to_string(),
            stats_file: "stats.txt".to_string(),
            required_methods: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or fails
    /// [`validate`](Self::validate).
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read pipeline config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid pipeline config: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML pipeline config")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_frequency == 0 {
            return Err("min_frequency must be >= 1, got 0".to_string());
        }

        for (name, template) in [
            ("pattern_dump", &self.pattern_dump),
            ("anomaly_dump", &self.anomaly_dump),
        ] {
            if !template.contains(CLUSTER_PLACEHOLDER) {
                return Err(format!(
                    "{} must contain the {} placeholder, got '{}'",
                    name, CLUSTER_PLACEHOLDER, template
                ));
            }
        }

        if self.stats_file.trim().is_empty() {
            return Err("stats_file must not be empty".to_string());
        }

        Ok(())
    }

    /// Parser settings for one cluster
    pub fn parser_options(&self, cluster_id: u32) -> ParserOptions {
        ParserOptions::for_cluster(cluster_id).with_min_frequency(self.min_frequency)
    }

    pub fn cluster_input_dir(&self, cluster_id: u32) -> PathBuf {
        self.input_root.join(format!("cluster_{}", cluster_id))
    }

    pub fn cluster_output_dir(&self, cluster_id: u32) -> PathBuf {
        self.output_root.join(format!("cluster_{}", cluster_id))
    }

    pub fn pattern_dump_path(&self, cluster_id: u32) -> PathBuf {
        self.cluster_input_dir(cluster_id)
            .join(fill_template(&self.pattern_dump, cluster_id))
    }

    pub fn anomaly_dump_path(&self, cluster_id: u32) -> PathBuf {
        self.cluster_input_dir(cluster_id)
            .join(fill_template(&self.anomaly_dump, cluster_id))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.output_root.join(&self.stats_file)
    }
}

fn fill_template(template: &str, cluster_id: u32) -> String {
    template.replace(CLUSTER_PLACEHOLDER, &cluster_id.to_string())
}
