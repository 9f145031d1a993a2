//! Per-cluster batch processing
//!
//! For every cluster id the pipeline parses the pattern dump (required) and
//! the anomaly dump (optional), assigns bin ids, and writes into
//! `<output_root>/cluster_<id>/`:
//!
//! - `pop_<bin>.dot` / `pop_<bin>.acdfg.bin` for each emitted pattern
//! - `anom_<bin>.dot` / `anom_<bin>.acdfg.bin` for each anomaly
//! - `cluster_<id>_info.txt`, the summary, written last
//!
//! Bins are numbered from 1 with a single counter, patterns first. Every
//! file goes through a synced temporary file. A cluster is built in a hidden
//! staging directory next to `cluster_<id>/` and renamed over it once the
//! summary is written, so a failed run leaves the previous output untouched
//! and a successful one drops bins left over from earlier runs. Clusters
//! share nothing but the configuration; a failure in one never stops the
//! batch.

use crate::codec::{encode_pattern, CodecError, ACDFG_EXTENSION, DOT_EXTENSION};
use crate::config::PipelineConfig;
use crate::dump::{parse_anomaly_dump, parse_pattern_dump, DumpError, ParsedPattern};
use crate::metadata::PatternMetadata;
use crate::stats_table::StatsTable;
use crate::summary::{render_cluster_summary, summary_file_name, SummaryEntry};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort one cluster
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("cluster {cluster_id}: pattern dump not found at {}", .path.display())]
    MissingDump { cluster_id: u32, path: PathBuf },

    #[error("cluster {cluster_id}: {source}")]
    Dump {
        cluster_id: u32,
        #[source]
        source: DumpError,
    },

    #[error("cluster {cluster_id}: {source}")]
    Codec {
        cluster_id: u32,
        #[source]
        source: CodecError,
    },

    #[error("cluster {cluster_id}: I/O error on {}: {source}", .path.display())]
    Io {
        cluster_id: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClusterError {
    pub fn cluster_id(&self) -> u32 {
        match self {
            ClusterError::MissingDump { cluster_id, .. }
            | ClusterError::Dump { cluster_id, .. }
            | ClusterError::Codec { cluster_id, .. }
            | ClusterError::Io { cluster_id, .. } => *cluster_id,
        }
    }
}

/// Result type for cluster processing
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Artifacts of one completed cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    pub cluster_id: u32,
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub popular: Vec<SummaryEntry>,
    pub anomalous: Vec<SummaryEntry>,
}

impl ClusterReport {
    pub fn bin_count(&self) -> usize {
        self.popular.len() + self.anomalous.len()
    }

    /// Metadata of every bin, patterns first
    pub fn patterns(&self) -> impl Iterator<Item = &PatternMetadata> {
        self.popular
            .iter()
            .chain(self.anomalous.iter())
            .map(|entry| &entry.metadata)
    }
}

/// How one cluster of a batch ended
#[derive(Debug)]
pub enum ClusterOutcome {
    Completed(ClusterReport),
    Skipped { cluster_id: u32, reason: String },
    Failed { cluster_id: u32, error: ClusterError },
}

impl ClusterOutcome {
    pub fn cluster_id(&self) -> u32 {
        match self {
            ClusterOutcome::Completed(report) => report.cluster_id,
            ClusterOutcome::Skipped { cluster_id, .. }
            | ClusterOutcome::Failed { cluster_id, .. } => *cluster_id,
        }
    }

    pub fn report(&self) -> Option<&ClusterReport> {
        match self {
            ClusterOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ClusterOutcome::Failed { .. })
    }
}

/// Write `contents` to `dir/name` through a synced temporary file
fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let target = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(target)
}

/// Replace `target` with the fully written `stage` directory
fn commit_staging(stage: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::rename(stage, target)
}

/// Runs clusters through parse, encode and write
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    config: PipelineConfig,
}

impl ClusterPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn io_error(cluster_id: u32, path: &Path) -> impl FnOnce(io::Error) -> ClusterError + '_ {
        move |source| ClusterError::Io {
            cluster_id,
            path: path.to_path_buf(),
            source,
        }
    }

    fn read_dump(&self, cluster_id: u32, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(Self::io_error(cluster_id, path))
    }

    /// Process one cluster end to end
    ///
    /// # Errors
    /// `MissingDump` when the pattern dump doesn't exist, `Dump` when a
    /// dump breaks a structural invariant, `Codec` when a graph can't be
    /// encoded and `Io` with the failing path for any file error.
    pub fn process_cluster(&self, cluster_id: u32) -> Result<ClusterReport> {
        let options = self.config.parser_options(cluster_id);

        let pattern_path = self.config.pattern_dump_path(cluster_id);
        if !pattern_path.is_file() {
            return Err(ClusterError::MissingDump {
                cluster_id,
                path: pattern_path,
            });
        }
        let text = self.read_dump(cluster_id, &pattern_path)?;
        let patterns = parse_pattern_dump(&text, &options)
            .map_err(|source| ClusterError::Dump { cluster_id, source })?;

        let anomaly_path = self.config.anomaly_dump_path(cluster_id);
        let anomalies = if anomaly_path.is_file() {
            let text = self.read_dump(cluster_id, &anomaly_path)?;
            parse_anomaly_dump(&text, &options)
                .map_err(|source| ClusterError::Dump { cluster_id, source })?
        } else {
            debug!(cluster_id, path = %anomaly_path.display(), "no anomaly dump");
            Vec::new()
        };

        let output_dir = self.config.cluster_output_dir(cluster_id);
        let output_root = &self.config.output_root;
        fs::create_dir_all(output_root).map_err(Self::io_error(cluster_id, output_root))?;
        let staging = Builder::new()
            .prefix(&format!(".cluster_{}.", cluster_id))
            .tempdir_in(output_root)
            .map_err(Self::io_error(cluster_id, output_root))?;
        let stage = staging.path();

        let mut next_bin = 1u32;
        let popular = self.emit_bins(cluster_id, stage, "pop", patterns, &mut next_bin)?;
        let anomalous = self.emit_bins(cluster_id, stage, "anom", anomalies, &mut next_bin)?;

        let summary = render_cluster_summary(&popular, &anomalous);
        let summary_name = summary_file_name(cluster_id);
        write_atomic(stage, &summary_name, summary.as_bytes())
            .map_err(Self::io_error(cluster_id, &output_dir.join(&summary_name)))?;

        commit_staging(stage, &output_dir).map_err(Self::io_error(cluster_id, &output_dir))?;
        let summary_path = output_dir.join(&summary_name);

        info!(
            cluster_id,
            popular = popular.len(),
            anomalous = anomalous.len(),
            "cluster complete"
        );

        Ok(ClusterReport {
            cluster_id,
            output_dir,
            summary_path,
            popular,
            anomalous,
        })
    }

    fn emit_bins(
        &self,
        cluster_id: u32,
        dir: &Path,
        prefix: &str,
        parsed: Vec<ParsedPattern>,
        next_bin: &mut u32,
    ) -> Result<Vec<SummaryEntry>> {
        let mut entries = Vec::with_capacity(parsed.len());

        for ParsedPattern { graph, metadata } in parsed {
            let encoded = encode_pattern(&graph)
                .map_err(|source| ClusterError::Codec { cluster_id, source })?;

            let bin_id = *next_bin;
            *next_bin += 1;

            let dot_file = format!("{}_{}.{}", prefix, bin_id, DOT_EXTENSION);
            let acdfg_file = format!("{}_{}.{}", prefix, bin_id, ACDFG_EXTENSION);

            write_atomic(dir, &dot_file, encoded.dot.as_bytes())
                .map_err(Self::io_error(cluster_id, &dir.join(&dot_file)))?;
            write_atomic(dir, &acdfg_file, &encoded.acdfg)
                .map_err(Self::io_error(cluster_id, &dir.join(&acdfg_file)))?;

            debug!(cluster_id, bin_id, pattern_id = %metadata.pattern_id, "wrote bin");
            entries.push(SummaryEntry {
                bin_id,
                dot_file,
                metadata,
            });
        }

        Ok(entries)
    }

    /// Process every cluster in `ids`, in order
    pub fn process_clusters<I>(&self, ids: I) -> Vec<ClusterOutcome>
    where
        I: IntoIterator<Item = u32>,
    {
        ids.into_iter()
            .map(|cluster_id| match self.process_cluster(cluster_id) {
                Ok(report) => ClusterOutcome::Completed(report),
                Err(ClusterError::MissingDump { path, .. }) => {
                    warn!(cluster_id, path = %path.display(), "skipping cluster");
                    ClusterOutcome::Skipped {
                        cluster_id,
                        reason: format!("pattern dump not found at {}", path.display()),
                    }
                }
                Err(error) => {
                    error!(cluster_id, %error, "cluster failed");
                    ClusterOutcome::Failed { cluster_id, error }
                }
            })
            .collect()
    }

    /// Write the statistics table for every completed cluster
    pub fn write_stats(&self, outcomes: &[ClusterOutcome]) -> io::Result<PathBuf> {
        let mut table = StatsTable::new();
        for report in outcomes.iter().filter_map(ClusterOutcome::report) {
            table.extend(report.patterns());
        }

        let path = self.config.stats_path();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "stats_file has no file name"))?
            .to_string_lossy()
            .into_owned();

        fs::create_dir_all(dir)?;
        write_atomic(dir, &name, table.render().as_bytes())
    }
}
