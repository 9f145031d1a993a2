//! Binary ACDFG interchange records
//!
//! Each graph node becomes one entry in a typed node table, serialized as
//! MessagePack with named fields:
//!
//! - Field   -> `DataNode { id, name: "<class>.<object>", type: "UNKNOWN" }`
//! - Method  -> `MethodNode { id, name: "<class>.<member>" }`
//! - Control -> `MiscNode { id }`
//!
//! Method nodes carry no assignee, invokee or argument links, and the
//! graph's edges are not translated into control/use edges. Consumers only
//! get the node table.

use super::{CodecError, Result};
use crate::graph::{GraphModel, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format tag written into every record
pub const ACDFG_FORMAT: &str = "acdfg-msgpack-v1";

/// File extension of binary records (after the `<prefix>_<bin>.` stem)
pub const ACDFG_EXTENSION: &str = "acdfg.bin";

/// Type name given to data nodes; the dump carries no type information
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Storage class of a data node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    DataVar,
    DataConst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataNode {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub data_type: DataKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodNode {
    pub id: NodeId,
    pub name: String,
    pub assignee: Option<NodeId>,
    pub invokee: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscNode {
    pub id: NodeId,
}

/// Node table of one pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcdfgRecord {
    pub format: String,
    pub pattern_id: String,
    pub data_node: Vec<DataNode>,
    pub method_node: Vec<MethodNode>,
    pub misc_node: Vec<MiscNode>,
}

impl AcdfgRecord {
    pub fn node_count(&self) -> usize {
        self.data_node.len() + self.method_node.len() + self.misc_node.len()
    }

    /// Node typing recovered from the three tables
    pub fn node_kinds(&self) -> BTreeMap<NodeId, NodeKind> {
        let data = self.data_node.iter().map(|n| (n.id, NodeKind::Field));
        let methods = self.method_node.iter().map(|n| (n.id, NodeKind::Method));
        let misc = self.misc_node.iter().map(|n| (n.id, NodeKind::Control));
        data.chain(methods).chain(misc).collect()
    }
}

/// Build the node table for `graph`
///
/// # Errors
/// `CodecError::UnsupportedNodeKind` for any `Other` node; the miner never
/// hands those to this encoder.
pub fn to_acdfg(graph: &GraphModel) -> Result<AcdfgRecord> {
    let mut record = AcdfgRecord {
        format: ACDFG_FORMAT.to_string(),
        pattern_id: graph.pattern_id().to_string(),
        data_node: Vec::new(),
        method_node: Vec::new(),
        misc_node: Vec::new(),
    };

    for node in graph.nodes() {
        match node.kind {
            NodeKind::Field => record.data_node.push(DataNode {
                id: node.id,
                name: format!("{}.{}", node.class_name, node.object_name),
                type_name: UNKNOWN_TYPE.to_string(),
                data_type: DataKind::DataVar,
            }),
            NodeKind::Method => record.method_node.push(MethodNode {
                id: node.id,
                name: node.qualified_name(),
                assignee: None,
                invokee: None,
                arguments: Vec::new(),
            }),
            NodeKind::Control => record.misc_node.push(MiscNode { id: node.id }),
            NodeKind::Other => {
                return Err(CodecError::UnsupportedNodeKind {
                    pattern_id: graph.pattern_id().to_string(),
                    node_id: node.id,
                    kind: node.kind,
                })
            }
        }
    }

    Ok(record)
}

pub fn encode_acdfg(record: &AcdfgRecord) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(record)?)
}

pub fn decode_acdfg(bytes: &[u8]) -> Result<AcdfgRecord> {
    let record: AcdfgRecord = rmp_serde::from_slice(bytes)?;
    if record.format != ACDFG_FORMAT {
        return Err(CodecError::UnsupportedFormat(record.format));
    }
    Ok(record)
}

/// Check that a decoded record types every non-`Other` node of `graph` the same way
pub fn reconcile(graph: &GraphModel, record: &AcdfgRecord) -> Result<()> {
    let decoded = record.node_kinds();
    let expected: BTreeMap<NodeId, NodeKind> = graph
        .nodes()
        .filter(|n| n.kind != NodeKind::Other)
        .map(|n| (n.id, n.kind))
        .collect();

    let ids = expected.keys().chain(decoded.keys());
    for &id in ids {
        let want = expected.get(&id).copied();
        let got = decoded.get(&id).copied();
        if want != got {
            return Err(CodecError::KindMismatch {
                pattern_id: graph.pattern_id().to_string(),
                node_id: id,
                expected: want,
                found: got,
            });
        }
    }
    Ok(())
}
