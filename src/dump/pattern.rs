use super::line::{classify_line, DumpLine};
use super::record::RecordBuilder;
use super::{ParsedPattern, ParserOptions, ParserState, Result};
use crate::graph::NodeId;
use tracing::{debug, trace, warn};

/// Parse a complete pattern-mode dump
///
/// # Example
/// ```
/// use groum_ingest::dump::{parse_pattern_dump, ParserOptions};
///
/// let dump = "Graph\n/* Begin a pattern */\nID: 1\nSize: 2\nFrequency: 30\n\
///             1 1 java.io.File f exists 3 3\n2 0 java.io.File f path 3 3\n1 2\n\
///             /* End a pattern */\n";
/// let patterns = parse_pattern_dump(dump, &ParserOptions::for_cluster(4)).unwrap();
///
/// assert_eq!(patterns.len(), 1);
/// assert_eq!(patterns[0].graph.total_edge_count(), 1);
/// assert_eq!(patterns[0].metadata.method_bag(), &["java.io.File.exists"]);
/// ```
pub fn parse_pattern_dump(text: &str, options: &ParserOptions) -> Result<Vec<ParsedPattern>> {
    let mut parser = PatternDumpParser::new(*options);
    for (idx, line) in text.lines().enumerate() {
        parser.feed(idx + 1, line)?;
    }
    Ok(parser.finish())
}

/// Line-at-a-time state machine for the pattern grammar
#[derive(Debug)]
pub struct PatternDumpParser {
    options: ParserOptions,
    state: ParserState,
    record: Option<RecordBuilder>,
    emitted: Vec<ParsedPattern>,
    discarded: usize,
}

impl PatternDumpParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            state: ParserState::Idle,
            record: None,
            emitted: Vec::new(),
            discarded: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Records closed below the frequency threshold so far
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Consume one line; `line_no` is 1-based and only used in diagnostics
    pub fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = classify_line(raw);
        match self.state {
            ParserState::Idle => match line {
                DumpLine::GraphMarker => self.state = ParserState::AwaitingHeader,
                DumpLine::BeginPattern => self.open_record(line_no),
                _ => trace!(line_no, "skipping line outside a graph section"),
            },
            ParserState::AwaitingHeader => match line {
                DumpLine::BeginPattern => self.open_record(line_no),
                _ => trace!(line_no, "skipping line between records"),
            },
            ParserState::InRecordBody => self.body_line(line_no, raw, line)?,
            ParserState::InAdjacencyList => match line {
                DumpLine::Adjacency(ids) => self.add_adjacency(line_no, &ids)?,
                DumpLine::Blank => {}
                other => {
                    self.state = ParserState::InRecordBody;
                    self.body_line(line_no, raw, other)?;
                }
            },
        }
        Ok(())
    }

    /// End of input; returns every emitted record in dump order
    pub fn finish(mut self) -> Vec<ParsedPattern> {
        if let Some(record) = self.record.take() {
            warn!(
                cluster = self.options.cluster_id,
                pattern = %record.pattern_id_or_unknown(),
                opened_at = record.opened_at,
                "discarding unterminated pattern record at end of dump"
            );
        }
        self.emitted
    }

    fn open_record(&mut self, line_no: usize) {
        self.record = Some(RecordBuilder::new(line_no));
        self.state = ParserState::InRecordBody;
    }

    fn body_line(&mut self, line_no: usize, raw: &str, line: DumpLine<'_>) -> Result<()> {
        let cluster_id = self.options.cluster_id;

        match line {
            DumpLine::Blank => {}
            DumpLine::BeginPattern => {
                warn!(
                    cluster = cluster_id,
                    line_no, "pattern begins before the previous one ended; closing it"
                );
                self.close_record();
                self.open_record(line_no);
            }
            DumpLine::EndPattern => self.close_record(),
            DumpLine::GraphMarker => {
                self.record_mut()
                    .graph_mut(cluster_id, line_no, "adjacency list")?;
                self.state = ParserState::InAdjacencyList;
            }
            DumpLine::Adjacency(ids) => {
                self.state = ParserState::InAdjacencyList;
                self.add_adjacency(line_no, &ids)?;
            }
            DumpLine::Id(id) => {
                let record = self.record_mut();
                record.pattern_id = Some(id.to_string());
                record.ensure_graph();
            }
            DumpLine::Size(size) => self.record_mut().size = Some(size),
            DumpLine::Frequency(frequency) => {
                let record = self.record_mut();
                record.frequency = Some(frequency);
                record.ensure_graph();
            }
            DumpLine::File(file) => self.record_mut().add_file(file),
            DumpLine::PatternNode(node) => {
                self.record_mut()
                    .graph_mut(cluster_id, line_no, "node line")?
                    .add_node(node);
            }
            _ => self.record_mut().raw_lines.push(raw.to_string()),
        }
        Ok(())
    }

    fn add_adjacency(&mut self, line_no: usize, ids: &[NodeId]) -> Result<()> {
        let cluster_id = self.options.cluster_id;
        let graph = self
            .record_mut()
            .graph_mut(cluster_id, line_no, "adjacency line")?;

        if let Some((&src, dsts)) = ids.split_first() {
            for &dst in dsts {
                if !graph.add_edge(src, dst) {
                    trace!(line_no, src, dst, "dropping edge to a node outside the pattern");
                }
            }
        }
        Ok(())
    }

    fn close_record(&mut self) {
        self.state = ParserState::AwaitingHeader;
        let Some(record) = self.record.take() else {
            return;
        };

        let cluster_id = self.options.cluster_id;
        let frequency = record.frequency.unwrap_or(0);
        if frequency < self.options.min_frequency {
            debug!(
                cluster = cluster_id,
                pattern = %record.pattern_id_or_unknown(),
                frequency,
                min = self.options.min_frequency,
                "discarding infrequent pattern"
            );
            self.discarded += 1;
            return;
        }

        let pattern_id = record.pattern_id_or_unknown();
        match record.finish(cluster_id, false, None) {
            Some(parsed) => {
                debug!(cluster = cluster_id, pattern = %pattern_id, frequency, "emitting pattern");
                self.emitted.push(parsed);
            }
            None => warn!(
                cluster = cluster_id,
                pattern = %pattern_id,
                "pattern record closed without an ID; dropping it"
            ),
        }
    }

    /// The open record; body states always have one
    fn record_mut(&mut self) -> &mut RecordBuilder {
        self.record.get_or_insert_with(RecordBuilder::default)
    }
}
