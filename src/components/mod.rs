//! Canvas components.

pub mod timeline_graph;
