// Mining-tool dump ingestion
//
// The external miner writes two related line-oriented grammars: a pattern
// dump (frequent subgraphs) and an anomaly dump (rare occurrences that
// violate a known pattern, with a rareness score). Both describe the same
// graph shape, so they share the record value types and one line
// classifier, but each grammar has its own parser so grammar-specific
// transitions never leak into the other.
//
// Error taxonomy:
// - a line matching no expected shape inside a record is kept verbatim on
//   the record's `raw_lines`
// - an edge to an unknown node is dropped by `GraphModel::add_edge`
// - node or adjacency data before the record's graph exists aborts the dump
//   with `DumpError::NoActiveGraph`

mod anomaly;
mod line;
mod pattern;
mod record;

pub use anomaly::{parse_anomaly_dump, AnomalyDumpParser};
pub use line::{anomaly_node, classify_line, DumpLine, CONSTRUCTOR_MARKER};
pub use pattern::{parse_pattern_dump, PatternDumpParser};

use crate::graph::GraphModel;
use crate::metadata::PatternMetadata;
use thiserror::Error;

/// Default frequency a pattern needs to be emitted
pub const MIN_FREQUENCY: u32 = 20;

/// Errors that abort parsing of the current dump
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DumpError {
    #[error(
        "cluster {cluster_id}, pattern {pattern_id}: {what} on line {line_no} before the pattern graph exists"
    )]
    NoActiveGraph {
        cluster_id: u32,
        pattern_id: String,
        line_no: usize,
        what: &'static str,
    },
}

/// Result type for dump parsing
pub type Result<T> = std::result::Result<T, DumpError>;

/// Which of the two grammars a dump is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    Pattern,
    Anomaly,
}

/// Parser settings shared by both grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Cluster the dump belongs to, copied into every emitted metadata record
    pub cluster_id: u32,
    /// Pattern-mode records below this frequency are discarded
    pub min_frequency: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            cluster_id: 0,
            min_frequency: MIN_FREQUENCY,
        }
    }
}

impl ParserOptions {
    pub fn for_cluster(cluster_id: u32) -> Self {
        Self {
            cluster_id,
            ..Self::default()
        }
    }

    pub fn with_min_frequency(mut self, min_frequency: u32) -> Self {
        self.min_frequency = min_frequency;
        self
    }
}

/// Parser position within the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Idle,
    AwaitingHeader,
    InRecordBody,
    InAdjacencyList,
}

/// One emitted record: the reconstructed graph and its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPattern {
    pub graph: GraphModel,
    pub metadata: PatternMetadata,
}

/// Parse a dump written in either grammar
pub fn parse_dump(text: &str, mode: DumpMode, options: &ParserOptions) -> Result<Vec<ParsedPattern>> {
    match mode {
        DumpMode::Pattern => parse_pattern_dump(text, options),
        DumpMode::Anomaly => parse_anomaly_dump(text, options),
    }
}
