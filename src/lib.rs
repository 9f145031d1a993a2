//! groum-ingest - ingestion of mined API-usage pattern dumps
//!
//! This library reads the text dumps written by a frequent-subgraph miner
//! (popular patterns and anomalies), rebuilds each record as a typed graph
//! with its metadata, and emits Graphviz and binary ACDFG artifacts per
//! cluster. Patterns from independent runs can be compared by method-bag
//! containment.

pub mod cli;
pub mod codec;
pub mod compare;
pub mod config;
pub mod dump;
pub mod graph;
pub mod metadata;
pub mod pipeline;
pub mod stats_table;
pub mod summary;
