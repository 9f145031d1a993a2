//! Per-cluster summary file (`cluster_<id>_info.txt`)
//!
//! Lists every emitted bin with the DOT file holding its graph and the
//! record fields of the dump it came from. Downstream tools read it back
//! with [`read_cluster_summary`] to rebuild `PatternMetadata` without the
//! graph. Raw lines are not persisted.

use crate::metadata::PatternMetadata;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

const POPULAR_HEADER: &str = "Popular Bins:";
const ANOMALOUS_HEADER: &str = "Anomalous Bins:";

static BIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Bin\s*#\s*(\d+)$").expect("bin header regex"));
static DOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Dot:\s*(\S+)\s+Frequency:\s*(\d+)\s*,\s*(\d+)$").expect("dot line regex")
});
static LEGACY_DOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Dot:\s*(\S+\.dot)\s*Frequency\s*=\s*(\d+)$").expect("legacy dot line regex"));
static FILE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^cluster_(\d+)_info\.txt$").expect("summary file name regex"));
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ID|Size|Rareness|Violates|Method|File):\s*(.*)$").expect("field regex"));

/// One bin of a cluster summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub bin_id: u32,
    pub dot_file: String,
    pub metadata: PatternMetadata,
}

fn render_entry(out: &mut String, entry: &SummaryEntry) {
    let meta = &entry.metadata;

    out.push_str(&format!("Bin # {}\n", entry.bin_id));
    out.push_str(&format!(
        "Dot: {} Frequency: {}, {}\n",
        entry.dot_file,
        meta.frequency,
        meta.file_count()
    ));
    out.push_str(&format!("ID: {}\n", meta.pattern_id));
    out.push_str(&format!("Size: {}\n", meta.size));
    if let Some(rareness) = meta.rareness {
        out.push_str(&format!("Rareness: {}\n", rareness));
    }
    if let Some(ref violated) = meta.violated_pattern_id {
        out.push_str(&format!("Violates: {}\n", violated));
    }
    for method in meta.method_bag() {
        out.push_str(&format!("Method: {}\n", method));
    }
    for file in &meta.provenance_files {
        out.push_str(&format!("File: {}\n", file));
    }
}

/// Render the summary of one cluster
pub fn render_cluster_summary(popular: &[SummaryEntry], anomalous: &[SummaryEntry]) -> String {
    let mut out = String::new();

    out.push_str(POPULAR_HEADER);
    out.push('\n');
    for entry in popular {
        render_entry(&mut out, entry);
    }

    out.push_str(ANOMALOUS_HEADER);
    out.push('\n');
    for entry in anomalous {
        render_entry(&mut out, entry);
    }

    out
}

struct PendingEntry {
    entry: SummaryEntry,
    methods: Vec<String>,
}

fn parse_number<T: std::str::FromStr>(value: &str, line_no: usize, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .ok()
        .with_context(|| format!("line {}: invalid {} '{}'", line_no, what, value.trim()))
}

fn flush(pending: &mut Option<PendingEntry>, entries: &mut Vec<SummaryEntry>) {
    if let Some(mut done) = pending.take() {
        done.entry.metadata.set_method_bag(done.methods);
        entries.push(done.entry);
    }
}

/// Rebuild the entries of a cluster summary
///
/// Popular entries come first, in file order, followed by anomalous ones.
/// Lines that match no known field are kept as raw lines of the current
/// entry; lines before the first `Bin #` are ignored.
///
/// # Errors
/// Fails on a field line outside any bin and on malformed numbers.
pub fn read_cluster_summary(text: &str, cluster_id: u32) -> Result<Vec<SummaryEntry>> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut in_anomalies = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line == POPULAR_HEADER || line == ANOMALOUS_HEADER {
            flush(&mut pending, &mut entries);
            in_anomalies = line == ANOMALOUS_HEADER;
            continue;
        }

        if let Some(caps) = BIN_RE.captures(line) {
            flush(&mut pending, &mut entries);
            let mut metadata = PatternMetadata::new(cluster_id, String::new());
            metadata.is_anomaly = in_anomalies;
            pending = Some(PendingEntry {
                entry: SummaryEntry {
                    bin_id: parse_number(&caps[1], line_no, "bin id")?,
                    dot_file: String::new(),
                    metadata,
                },
                methods: Vec::new(),
            });
            continue;
        }

        let Some(current) = pending.as_mut() else {
            if line.starts_with("Dot:") || FIELD_RE.is_match(line) {
                bail!("line {}: '{}' outside of a bin", line_no, line);
            }
            debug!(line_no, "ignoring summary line outside of a bin");
            continue;
        };
        let meta = &mut current.entry.metadata;

        if let Some(caps) = DOT_RE.captures(line) {
            current.entry.dot_file = caps[1].to_string();
            meta.frequency = parse_number(&caps[2], line_no, "frequency")?;
            parse_number::<usize>(&caps[3], line_no, "file count")?;
        } else if let Some(caps) = LEGACY_DOT_RE.captures(line) {
            current.entry.dot_file = caps[1].to_string();
            meta.frequency = parse_number(&caps[2], line_no, "frequency")?;
        } else if let Some(caps) = FIELD_RE.captures(line) {
            let value = caps[2].trim();
            match &caps[1] {
                "ID" => meta.pattern_id = value.to_string(),
                "Size" => meta.size = parse_number(value, line_no, "size")?,
                "Rareness" => meta.rareness = Some(parse_number(value, line_no, "rareness")?),
                "Violates" => meta.violated_pattern_id = Some(value.to_string()),
                "Method" => current.methods.push(value.to_string()),
                _ => meta.provenance_files.push(value.to_string()),
            }
        } else {
            meta.raw_lines.push(line.to_string());
        }
    }

    flush(&mut pending, &mut entries);
    Ok(entries)
}

/// Summary file name for a cluster
pub fn summary_file_name(cluster_id: u32) -> String {
    format!("cluster_{}_info.txt", cluster_id)
}

/// Cluster id encoded in a `cluster_<id>_info.txt` file name
pub fn cluster_id_from_path(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    FILE_NAME_RE.captures(name)?[1].parse().ok()
}

/// Read and parse a summary file from disk
pub fn load_cluster_summary<P: AsRef<Path>>(path: P, cluster_id: u32) -> Result<Vec<SummaryEntry>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cluster summary: {}", path.display()))?;
    read_cluster_summary(&text, cluster_id)
        .with_context(|| format!("Malformed cluster summary: {}", path.display()))
}
