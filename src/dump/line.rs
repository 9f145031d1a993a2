use crate::graph::{GraphNode, NodeId, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing label component the miner uses for constructor calls
pub const CONSTRUCTOR_MARKER: &str = "<init>";

static BEGIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\*\s*Begin a pattern\s*\*/$").expect("begin marker regex"));

static END_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\*\s*End a pattern\s*\*/$").expect("end marker regex"));

static ID_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ID:\s*(\d+)$").expect("id regex"));

static SIZE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Size:\s*(\d+)$").expect("size regex"));

static FREQUENCY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Frequency:\s*(\d+)$").expect("frequency regex"));

static FILE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^File:\s*(.*)$").expect("file regex"));

static ANOMALY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Anomalies in pattern\s+(\S+)\s+rareness:\s*(\S+)$").expect("anomaly header regex")
});

static ANOMALY_NODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Node:\s*(\d+)\s*-\s*Label:\s*(.+?)\s*-\s*(-?\d+)\s+Lines:\s*(\d+)\s*-->\s*(\d+)$")
        .expect("anomaly node regex")
});

static ANOMALY_EDGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)<--(\d+)$").expect("anomaly edge regex"));

static ACCORDING_TO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^According to pattern\s+(\S+)$").expect("violation regex"));

/// One classified line of either dump grammar
///
/// The classifier knows every shape of both grammars; each parser handles
/// the kinds of its own grammar and keeps any other kind as raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum DumpLine<'a> {
    Blank,
    /// `Graph`: opens a batch, or the adjacency list inside a pattern record
    GraphMarker,
    BeginPattern,
    EndPattern,
    Id(&'a str),
    Size(usize),
    Frequency(u32),
    File(&'a str),
    /// `id type class object member startLine endLine`
    PatternNode(GraphNode),
    /// `src dst1 dst2 ...`
    Adjacency(Vec<NodeId>),
    AnomalyHeader {
        pattern_id: &'a str,
        rareness: f64,
    },
    /// `Node: id - Label: dotted.name - size  Lines: a-->b`
    AnomalyNode(GraphNode),
    EdgesMarker,
    /// `dst<--src` tokens, stored as `(src, dst)`
    AnomalyEdges(Vec<(NodeId, NodeId)>),
    AccordingTo(&'a str),
    Other(&'a str),
}

/// Classify one (already trimmed or untrimmed) dump line
pub fn classify_line(line: &str) -> DumpLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        return DumpLine::Blank;
    }

    match line {
        "Graph" => return DumpLine::GraphMarker,
        "Edges:" => return DumpLine::EdgesMarker,
        _ => {}
    }

    if BEGIN_PATTERN.is_match(line) {
        return DumpLine::BeginPattern;
    }
    if END_PATTERN.is_match(line) {
        return DumpLine::EndPattern;
    }

    if let Some(caps) = ID_LINE.captures(line) {
        if let Some(m) = caps.get(1) {
            return DumpLine::Id(m.as_str());
        }
    }
    if let Some(size) = capture_number(&SIZE_LINE, line) {
        return DumpLine::Size(size);
    }
    if let Some(freq) = capture_number(&FREQUENCY_LINE, line) {
        return DumpLine::Frequency(freq);
    }
    if let Some(caps) = FILE_LINE.captures(line) {
        if let Some(m) = caps.get(1) {
            return DumpLine::File(m.as_str().trim());
        }
    }

    if let Some(line_kind) = classify_anomaly_shapes(line) {
        return line_kind;
    }

    // All-integer lines are adjacency even when they have seven tokens
    if let Some(ids) = parse_adjacency(line) {
        return DumpLine::Adjacency(ids);
    }
    if let Some(node) = parse_pattern_node(line) {
        return DumpLine::PatternNode(node);
    }
    if let Some(edges) = parse_anomaly_edges(line) {
        return DumpLine::AnomalyEdges(edges);
    }

    DumpLine::Other(line)
}

fn capture_number<T: std::str::FromStr>(re: &Regex, line: &str) -> Option<T> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

fn classify_anomaly_shapes(line: &str) -> Option<DumpLine<'_>> {
    if let Some(caps) = ANOMALY_HEADER.captures(line) {
        let pattern_id = caps.get(1)?.as_str();
        let rareness = caps.get(2)?.as_str().parse::<f64>().ok()?;
        return Some(DumpLine::AnomalyHeader {
            pattern_id,
            rareness,
        });
    }

    if let Some(caps) = ANOMALY_NODE.captures(line) {
        let id = caps.get(1)?.as_str().parse().ok()?;
        let label = caps.get(2)?.as_str();
        let start_line = caps.get(4)?.as_str().parse().ok()?;
        let end_line = caps.get(5)?.as_str().parse().ok()?;
        return Some(DumpLine::AnomalyNode(anomaly_node(
            id, label, start_line, end_line,
        )));
    }

    if let Some(caps) = ACCORDING_TO.captures(line) {
        return Some(DumpLine::AccordingTo(caps.get(1)?.as_str()));
    }

    None
}

fn parse_pattern_node(line: &str) -> Option<GraphNode> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 7 {
        return None;
    }

    Some(GraphNode {
        id: fields[0].parse().ok()?,
        kind: NodeKind::from_tag(fields[1])?,
        class_name: fields[2].to_string(),
        object_name: fields[3].to_string(),
        member_name: fields[4].to_string(),
        start_line: fields[5].parse().ok()?,
        end_line: fields[6].parse().ok()?,
    })
}

fn parse_adjacency(line: &str) -> Option<Vec<NodeId>> {
    line.split_whitespace()
        .map(|tok| tok.parse::<NodeId>().ok())
        .collect()
}

fn parse_anomaly_edges(line: &str) -> Option<Vec<(NodeId, NodeId)>> {
    line.split_whitespace()
        .map(|tok| {
            let caps = ANOMALY_EDGE.captures(tok)?;
            let dst = caps.get(1)?.as_str().parse().ok()?;
            let src = caps.get(2)?.as_str().parse().ok()?;
            Some((src, dst))
        })
        .collect()
}

/// Build a node from an anomaly-mode label
///
/// A label without `.` is a control node. Otherwise the last component is
/// the member, the one before it the object, and everything but the last the
/// class. A label containing the constructor marker anywhere names the class
/// itself: the member becomes the class's simple name and the object is empty.
pub fn anomaly_node(id: NodeId, label: &str, start_line: u32, end_line: u32) -> GraphNode {
    let mut node = GraphNode {
        id,
        kind: NodeKind::Control,
        class_name: label.to_string(),
        object_name: String::new(),
        member_name: String::new(),
        start_line,
        end_line,
    };

    let Some((class_name, member_name)) = label.rsplit_once('.') else {
        return node;
    };

    node.kind = NodeKind::Method;
    node.class_name = class_name.to_string();

    let simple_class = class_name.rsplit('.').next().unwrap_or(class_name);
    if label.contains(CONSTRUCTOR_MARKER) {
        node.member_name = simple_class.to_string();
    } else {
        node.object_name = simple_class.to_string();
        node.member_name = member_name.to_string();
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(classify_line("Graph"), DumpLine::GraphMarker);
        assert_eq!(classify_line("  Edges:  "), DumpLine::EdgesMarker);
        assert_eq!(classify_line("/* Begin a pattern */"), DumpLine::BeginPattern);
        assert_eq!(classify_line("/*End a pattern*/"), DumpLine::EndPattern);
        assert_eq!(classify_line("   "), DumpLine::Blank);
    }

    #[test]
    fn test_field_lines() {
        assert_eq!(classify_line("ID: 12"), DumpLine::Id("12"));
        assert_eq!(classify_line("Size:3"), DumpLine::Size(3));
        assert_eq!(classify_line("Frequency: 25"), DumpLine::Frequency(25));
        assert_eq!(
            classify_line("File: /corpus/App.java "),
            DumpLine::File("/corpus/App.java")
        );
    }

    #[test]
    fn test_pattern_node_line() {
        match classify_line("4 1 java.io.File f exists 10 12") {
            DumpLine::PatternNode(n) => {
                assert_eq!(n.id, 4);
                assert_eq!(n.kind, NodeKind::Method);
                assert_eq!(n.class_name, "java.io.File");
                assert_eq!(n.object_name, "f");
                assert_eq!(n.member_name, "exists");
                assert_eq!((n.start_line, n.end_line), (10, 12));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_tag_is_other() {
        assert_eq!(
            classify_line("4 9 java.io.File f exists 10 12"),
            DumpLine::Other("4 9 java.io.File f exists 10 12")
        );
    }

    #[test]
    fn test_adjacency_line() {
        assert_eq!(classify_line("1 2 3"), DumpLine::Adjacency(vec![1, 2, 3]));
        assert_eq!(classify_line("7"), DumpLine::Adjacency(vec![7]));
        assert_eq!(
            classify_line("1 2 3 4 5 6 7"),
            DumpLine::Adjacency(vec![1, 2, 3, 4, 5, 6, 7])
        );
    }

    #[test]
    fn test_anomaly_header() {
        assert_eq!(
            classify_line("Anomalies in pattern 17 rareness: 0.125"),
            DumpLine::AnomalyHeader {
                pattern_id: "17",
                rareness: 0.125
            }
        );
        assert!(matches!(
            classify_line("Anomalies in pattern 17 rareness: high"),
            DumpLine::Other(_)
        ));
    }

    #[test]
    fn test_anomaly_node_line() {
        match classify_line("Node: 3 - Label: java.io.File.exists - 1   Lines: 10-->12") {
            DumpLine::AnomalyNode(n) => {
                assert_eq!(n.id, 3);
                assert_eq!(n.kind, NodeKind::Method);
                assert_eq!(n.class_name, "java.io.File");
                assert_eq!(n.object_name, "File");
                assert_eq!(n.member_name, "exists");
                assert_eq!((n.start_line, n.end_line), (10, 12));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_anomaly_edges_line() {
        assert_eq!(
            classify_line("2<--1 3<--2"),
            DumpLine::AnomalyEdges(vec![(1, 2), (2, 3)])
        );
        assert!(matches!(classify_line("2<--1 junk"), DumpLine::Other(_)));
    }

    #[test]
    fn test_according_to() {
        assert_eq!(
            classify_line("According to pattern 42"),
            DumpLine::AccordingTo("42")
        );
    }

    #[test]
    fn test_constructor_label() {
        let n = anomaly_node(1, "java.io.File.<init>", 3, 3);
        assert_eq!(n.kind, NodeKind::Method);
        assert_eq!(n.class_name, "java.io.File");
        assert_eq!(n.member_name, "File");
        assert_eq!(n.object_name, "");
    }

    #[test]
    fn test_constructor_marker_elsewhere_in_label() {
        // Marker anywhere in the label triggers the constructor rule
        let n = anomaly_node(1, "a.<init>.run", 3, 3);
        assert_eq!(n.class_name, "a.<init>");
        assert_eq!(n.member_name, "<init>");
        assert_eq!(n.object_name, "");
    }

    #[test]
    fn test_undotted_label_is_control() {
        let n = anomaly_node(5, "IF", 1, 2);
        assert_eq!(n.kind, NodeKind::Control);
        assert_eq!(n.class_name, "IF");
        assert!(n.member_name.is_empty());
    }
}
