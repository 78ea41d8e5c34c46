mod graph;
mod load;
mod parse;
mod summary;

pub use graph::{AtlasGraph, BoundaryRole, EdgeType, NodeRecord, NodeType};
pub use load::{
    LoadError, fetch_named_graph, list_graph_files, load_graph_bytes, load_graph_file, parse_graph,
};
pub use summary::SummaryStats;
