use super::{DumpError, ParsedPattern, Result};
use crate::graph::GraphModel;
use crate::metadata::PatternMetadata;

/// Accumulators for the record currently being parsed
#[derive(Debug, Default)]
pub(super) struct RecordBuilder {
    pub pattern_id: Option<String>,
    pub size: Option<usize>,
    pub frequency: Option<u32>,
    pub rareness: Option<f64>,
    pub files: Vec<String>,
    pub raw_lines: Vec<String>,
    pub graph: Option<GraphModel>,
    /// Line of the record-begin marker or header
    pub opened_at: usize,
}

impl RecordBuilder {
    pub fn new(opened_at: usize) -> Self {
        Self {
            opened_at,
            ..Self::default()
        }
    }

    /// Start a record whose graph exists from the header on
    pub fn with_graph(opened_at: usize, graph: GraphModel) -> Self {
        Self {
            pattern_id: Some(graph.pattern_id().to_string()),
            frequency: Some(graph.frequency()),
            graph: Some(graph),
            opened_at,
            ..Self::default()
        }
    }

    pub fn pattern_id_or_unknown(&self) -> String {
        self.pattern_id.clone().unwrap_or_else(|| "?".to_string())
    }

    /// Create the graph once both the pattern id and frequency are known
    ///
    /// Files seen before that point are copied over in order.
    pub fn ensure_graph(&mut self) {
        if self.graph.is_some() {
            return;
        }
        if let (Some(id), Some(frequency)) = (&self.pattern_id, self.frequency) {
            let mut graph = GraphModel::new(id.clone(), frequency);
            for file in &self.files {
                graph.add_file(file.clone());
            }
            self.graph = Some(graph);
        }
    }

    pub fn add_file(&mut self, file: &str) {
        self.files.push(file.to_string());
        if let Some(graph) = self.graph.as_mut() {
            graph.add_file(file);
        }
    }

    pub fn graph_mut(
        &mut self,
        cluster_id: u32,
        line_no: usize,
        what: &'static str,
    ) -> Result<&mut GraphModel> {
        let pattern_id = self.pattern_id_or_unknown();
        self.graph.as_mut().ok_or(DumpError::NoActiveGraph {
            cluster_id,
            pattern_id,
            line_no,
            what,
        })
    }

    /// Seal the record; `None` when no graph was ever created
    pub fn finish(
        self,
        cluster_id: u32,
        is_anomaly: bool,
        violated_pattern_id: Option<String>,
    ) -> Option<ParsedPattern> {
        let graph = self.graph?;

        let mut metadata = PatternMetadata::new(cluster_id, graph.pattern_id())
            .with_method_bag(graph.method_bag());
        metadata.size = if is_anomaly {
            graph.node_count()
        } else {
            self.size.unwrap_or_else(|| graph.node_count())
        };
        metadata.frequency = graph.frequency();
        metadata.provenance_files = self.files;
        metadata.is_anomaly = is_anomaly;
        metadata.violated_pattern_id = violated_pattern_id;
        metadata.rareness = self.rareness;
        metadata.raw_lines = self.raw_lines;

        Some(ParsedPattern { graph, metadata })
    }
}
