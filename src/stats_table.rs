//! Whitespace-separated per-pattern statistics
//!
//! One row per emitted pattern or anomaly, suitable for loading into a
//! spreadsheet or a dataframe with a whitespace delimiter.

use crate::metadata::PatternMetadata;

const COLUMNS: [&str; 9] = [
    "cluster_id",
    "pattern_id",
    "nodes",
    "frequency",
    "meth_bag_size",
    "files_in_pattern",
    "is_anomaly",
    "violated_pattern",
    "rareness",
];

/// Written in place of an absent `violated_pattern` or `rareness`
pub const MISSING: &str = "-1";

/// One statistics row
#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub cluster_id: u32,
    pub pattern_id: String,
    pub nodes: usize,
    pub frequency: u32,
    pub meth_bag_size: usize,
    pub files_in_pattern: usize,
    pub is_anomaly: bool,
    pub violated_pattern: Option<String>,
    pub rareness: Option<f64>,
}

impl From<&PatternMetadata> for StatRow {
    fn from(meta: &PatternMetadata) -> Self {
        Self {
            cluster_id: meta.cluster_id,
            pattern_id: meta.pattern_id.clone(),
            nodes: meta.size,
            frequency: meta.frequency,
            meth_bag_size: meta.method_bag().len(),
            files_in_pattern: meta.file_count(),
            is_anomaly: meta.is_anomaly,
            violated_pattern: meta.violated_pattern_id.clone(),
            rareness: meta.rareness,
        }
    }
}

impl StatRow {
    fn format(&self) -> String {
        let violated = self.violated_pattern.as_deref().unwrap_or(MISSING);
        let rareness = self
            .rareness
            .map(|r| r.to_string())
            .unwrap_or_else(|| MISSING.to_string());

        format!(
            "{} {} {} {} {} {} {} {} {}",
            self.cluster_id,
            self.pattern_id,
            self.nodes,
            self.frequency,
            self.meth_bag_size,
            self.files_in_pattern,
            if self.is_anomaly { 1 } else { 0 },
            violated,
            rareness
        )
    }
}

/// Statistics table formatter
#[derive(Debug, Default)]
pub struct StatsTable {
    rows: Vec<StatRow>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, meta: &PatternMetadata) {
        self.rows.push(StatRow::from(meta));
    }

    pub fn extend<'a, I>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = &'a PatternMetadata>,
    {
        for meta in patterns {
            self.add(meta);
        }
    }

    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header() -> String {
        COLUMNS.join(" ")
    }

    /// Header line followed by one line per row
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&Self::header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&row.format());
            output.push('\n');
        }

        output
    }
}
