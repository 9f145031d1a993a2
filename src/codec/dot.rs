//! Graphviz rendering of a pattern graph
//!
//! One node statement per graph node (styled by kind) and one edge
//! statement per adjacency pair, both in the graph's stable traversal order.

use crate::graph::{GraphModel, GraphNode, NodeKind};

const GRAPH_DEFAULTS: &str = "  node[shape=box,style=\"filled,rounded\",penwidth=2.0,fontsize=13,];\n  edge[ arrowhead=onormal,penwidth=2.0,];\n";

/// Visual style for each node kind
pub fn node_style(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Field => "shape=ellipse, color=red, style=dashed",
        NodeKind::Method => "shape=box, style=filled, color=lightgray",
        NodeKind::Control => "shape=box, style=filled, color=lightblue",
        NodeKind::Other => "shape=box, style=filled, color=lightcoral",
    }
}

/// `<objectName> <className>.<memberName>`
pub fn node_label(node: &GraphNode) -> String {
    format!(
        "{} {}.{}",
        node.object_name, node.class_name, node.member_name
    )
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the graph as a DOT document
pub fn to_dot(graph: &GraphModel) -> String {
    let mut out = format!("digraph \"pattern_{}\" {{\n", escape(graph.pattern_id()));
    out.push_str(GRAPH_DEFAULTS);

    for node in graph.nodes() {
        out.push_str(&format!(
            "\"n_{}\" [ {}, label=\"{}\"];\n",
            node.id,
            node_style(node.kind),
            escape(&node_label(node))
        ));
    }

    for (src, dst) in graph.edges() {
        out.push_str(&format!(
            "\"n_{}\" -> \"n_{}\"[color=blue, penwidth=2];\n",
            src, dst
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn node(id: NodeId, kind: NodeKind, object: &str, class: &str, member: &str) -> GraphNode {
        GraphNode {
            id,
            kind,
            class_name: class.to_string(),
            object_name: object.to_string(),
            member_name: member.to_string(),
            start_line: 0,
            end_line: 0,
        }
    }

    fn sample() -> GraphModel {
        let mut g = GraphModel::new("7", 30);
        g.add_node(node(2, NodeKind::Field, "f", "java.io.File", "path"));
        g.add_node(node(1, NodeKind::Method, "f", "java.io.File", "exists"));
        g.add_edge(1, 2);
        g
    }

    #[test]
    fn test_dot_document() {
        let expected = "digraph \"pattern_7\" {\n".to_string()
            + GRAPH_DEFAULTS
            + "\"n_1\" [ shape=box, style=filled, color=lightgray, label=\"f java.io.File.exists\"];\n"
            + "\"n_2\" [ shape=ellipse, color=red, style=dashed, label=\"f java.io.File.path\"];\n"
            + "\"n_1\" -> \"n_2\"[color=blue, penwidth=2];\n"
            + "}\n";
        assert_eq!(to_dot(&sample()), expected);
    }

    #[test]
    fn test_dot_is_deterministic() {
        assert_eq!(to_dot(&sample()), to_dot(&sample()));
    }

    #[test]
    fn test_every_kind_has_distinct_style() {
        let styles = [
            node_style(NodeKind::Field),
            node_style(NodeKind::Method),
            node_style(NodeKind::Control),
            node_style(NodeKind::Other),
        ];
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_label_escaping() {
        let mut g = GraphModel::new("1", 1);
        g.add_node(node(1, NodeKind::Method, "", "Foo\"Bar", "m"));
        assert!(to_dot(&g).contains("label=\" Foo\\\"Bar.m\""));
    }
}
