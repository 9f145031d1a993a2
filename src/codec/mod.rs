// Pattern graph encoders
//
// A graph is always encoded to both targets in one call, so the DOT file and
// the binary ACDFG record of a pattern can never describe different graphs.

mod acdfg;
mod dot;

pub use acdfg::{
    decode_acdfg, encode_acdfg, reconcile, to_acdfg, AcdfgRecord, DataKind, DataNode, MethodNode,
    MiscNode, ACDFG_EXTENSION, ACDFG_FORMAT, UNKNOWN_TYPE,
};
pub use dot::{node_label, node_style, to_dot};

use crate::graph::{GraphModel, NodeId, NodeKind};
use thiserror::Error;

/// File extension of visual output
pub const DOT_EXTENSION: &str = "dot";

/// Errors raised while encoding or decoding a pattern
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("pattern {pattern_id}: node {node_id} has kind '{kind}', which has no ACDFG encoding")]
    UnsupportedNodeKind {
        pattern_id: String,
        node_id: NodeId,
        kind: NodeKind,
    },

    #[error("pattern {pattern_id}: node {node_id} typed {found:?} in the ACDFG record, expected {expected:?}")]
    KindMismatch {
        pattern_id: String,
        node_id: NodeId,
        expected: Option<NodeKind>,
        found: Option<NodeKind>,
    },

    #[error("unsupported ACDFG record format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to encode ACDFG record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode ACDFG record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Both encodings of one pattern graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPattern {
    pub dot: String,
    pub acdfg: Vec<u8>,
}

/// Encode `graph` to DOT text and a binary ACDFG record
pub fn encode_pattern(graph: &GraphModel) -> Result<EncodedPattern> {
    let record = to_acdfg(graph)?;
    Ok(EncodedPattern {
        dot: to_dot(graph),
        acdfg: encode_acdfg(&record)?,
    })
}
