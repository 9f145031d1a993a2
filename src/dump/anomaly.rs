use super::line::{classify_line, DumpLine};
use super::record::RecordBuilder;
use super::{ParsedPattern, ParserOptions, ParserState, Result};
use crate::graph::{GraphModel, NodeId};
use tracing::{debug, trace, warn};

/// Frequency given to anomaly graphs until the dump states one
const DEFAULT_ANOMALY_FREQUENCY: u32 = 1;

/// Parse a complete anomaly-mode dump
///
/// Every closed anomaly record is emitted; the frequency threshold only
/// applies to patterns.
pub fn parse_anomaly_dump(text: &str, options: &ParserOptions) -> Result<Vec<ParsedPattern>> {
    let mut parser = AnomalyDumpParser::new(*options);
    for (idx, line) in text.lines().enumerate() {
        parser.feed(idx + 1, line)?;
    }
    Ok(parser.finish())
}

/// Line-at-a-time state machine for the anomaly grammar
///
/// Anomaly records start directly with their header, so the parser begins in
/// `AwaitingHeader` and never visits `Idle`.
#[derive(Debug)]
pub struct AnomalyDumpParser {
    options: ParserOptions,
    state: ParserState,
    record: Option<RecordBuilder>,
    /// Last `Frequency:` value seen, used by the next header
    carried_frequency: u32,
    emitted: Vec<ParsedPattern>,
}

impl AnomalyDumpParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            state: ParserState::AwaitingHeader,
            record: None,
            carried_frequency: DEFAULT_ANOMALY_FREQUENCY,
            emitted: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = classify_line(raw);
        match self.state {
            ParserState::Idle | ParserState::AwaitingHeader => match line {
                DumpLine::AnomalyHeader {
                    pattern_id,
                    rareness,
                } => self.open_record(line_no, pattern_id, rareness),
                DumpLine::Frequency(frequency) => self.carried_frequency = frequency,
                _ => trace!(line_no, "skipping line between anomalies"),
            },
            ParserState::InRecordBody => self.body_line(line_no, raw, line)?,
            ParserState::InAdjacencyList => match line {
                DumpLine::AnomalyEdges(edges) => self.add_edges(line_no, &edges)?,
                DumpLine::Blank => self.state = ParserState::InRecordBody,
                other => {
                    self.state = ParserState::InRecordBody;
                    self.body_line(line_no, raw, other)?;
                }
            },
        }
        Ok(())
    }

    pub fn finish(mut self) -> Vec<ParsedPattern> {
        if let Some(record) = self.record.take() {
            warn!(
                cluster = self.options.cluster_id,
                pattern = %record.pattern_id_or_unknown(),
                opened_at = record.opened_at,
                "discarding anomaly without a violated pattern at end of dump"
            );
        }
        self.emitted
    }

    fn open_record(&mut self, line_no: usize, pattern_id: &str, rareness: f64) {
        let graph = GraphModel::new(pattern_id, self.carried_frequency);
        let mut record = RecordBuilder::with_graph(line_no, graph);
        record.rareness = Some(rareness);
        self.record = Some(record);
        self.state = ParserState::InRecordBody;
    }

    fn body_line(&mut self, line_no: usize, raw: &str, line: DumpLine<'_>) -> Result<()> {
        let cluster_id = self.options.cluster_id;

        match line {
            DumpLine::Blank => {}
            DumpLine::AnomalyHeader {
                pattern_id,
                rareness,
            } => {
                warn!(
                    cluster = cluster_id,
                    line_no, "anomaly begins before the previous one named its pattern"
                );
                self.close_record(None);
                self.open_record(line_no, pattern_id, rareness);
            }
            DumpLine::AccordingTo(violated) => self.close_record(Some(violated.to_string())),
            DumpLine::EdgesMarker => {
                self.record_mut()
                    .graph_mut(cluster_id, line_no, "edge list")?;
                self.state = ParserState::InAdjacencyList;
            }
            DumpLine::AnomalyNode(node) => {
                self.record_mut()
                    .graph_mut(cluster_id, line_no, "node line")?
                    .add_node(node);
            }
            DumpLine::File(file) => self.record_mut().add_file(file),
            DumpLine::Frequency(frequency) => self.carried_frequency = frequency,
            _ => self.record_mut().raw_lines.push(raw.to_string()),
        }
        Ok(())
    }

    fn add_edges(&mut self, line_no: usize, edges: &[(NodeId, NodeId)]) -> Result<()> {
        let cluster_id = self.options.cluster_id;
        let graph = self
            .record_mut()
            .graph_mut(cluster_id, line_no, "edge line")?;

        for &(src, dst) in edges {
            if !graph.add_edge(src, dst) {
                trace!(line_no, src, dst, "dropping edge to a node outside the anomaly");
            }
        }
        Ok(())
    }

    fn close_record(&mut self, violated: Option<String>) {
        self.state = ParserState::AwaitingHeader;
        let Some(record) = self.record.take() else {
            return;
        };

        let cluster_id = self.options.cluster_id;
        if let Some(parsed) = record.finish(cluster_id, true, violated) {
            debug!(
                cluster = cluster_id,
                pattern = %parsed.metadata.pattern_id,
                violated = ?parsed.metadata.violated_pattern_id,
                "emitting anomaly"
            );
            self.emitted.push(parsed);
        }
    }

    fn record_mut(&mut self) -> &mut RecordBuilder {
        self.record.get_or_insert_with(RecordBuilder::default)
    }
}
