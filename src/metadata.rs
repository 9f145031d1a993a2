//! Per-pattern metadata extracted from a dump record
//!
//! `PatternMetadata` is owned independently of the `GraphModel` it was taken
//! from. It is what the comparison, summary and statistics layers consume.

use serde::Serialize;

/// Metadata of one emitted pattern or anomaly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMetadata {
    pub cluster_id: u32,
    pub pattern_id: String,
    /// Node count reported by the miner (pattern mode) or counted at close (anomaly mode)
    pub size: usize,
    pub frequency: u32,
    /// Always sorted; the containment merge walk relies on it
    method_bag: Vec<String>,
    pub provenance_files: Vec<String>,
    pub is_anomaly: bool,
    pub violated_pattern_id: Option<String>,
    pub rareness: Option<f64>,
    /// Record lines that matched no known shape, verbatim
    pub raw_lines: Vec<String>,
}

impl PatternMetadata {
    pub fn new(cluster_id: u32, pattern_id: impl Into<String>) -> Self {
        Self {
            cluster_id,
            pattern_id: pattern_id.into(),
            size: 0,
            frequency: 0,
            method_bag: Vec::new(),
            provenance_files: Vec::new(),
            is_anomaly: false,
            violated_pattern_id: None,
            rareness: None,
            raw_lines: Vec::new(),
        }
    }

    /// Builder-style method bag setter; the bag is sorted on the way in
    pub fn with_method_bag(mut self, bag: Vec<String>) -> Self {
        self.set_method_bag(bag);
        self
    }

    pub fn set_method_bag(&mut self, mut bag: Vec<String>) {
        bag.sort();
        self.method_bag = bag;
    }

    pub fn method_bag(&self) -> &[String] {
        &self.method_bag
    }

    pub fn file_count(&self) -> usize {
        self.provenance_files.len()
    }

    /// True when every name in `required` occurs at least once in the bag
    pub fn includes_all(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|name| self.method_bag.binary_search(name).is_ok())
    }
}
