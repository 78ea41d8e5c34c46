use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::graph::{AtlasGraph, LinkRecord, NodeRecord, compute_turn_boundaries};
use super::parse::parse_document;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} is not valid UTF-8 text")]
    Encoding { label: String },

    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid graph document: {0}")]
    InvalidDocument(String),

    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),

    #[error("`{0}` is not a plain graph file name")]
    InvalidName(String),

    #[error("failed to fetch graph `{name}`: {source}")]
    Fetch {
        name: String,
        #[source]
        source: Box<LoadError>,
    },
}

pub fn parse_graph(raw: &str) -> Result<AtlasGraph, LoadError> {
    let document = parse_document(raw)?;

    let mut index_by_id = HashMap::with_capacity(document.nodes.len());
    let mut nodes = Vec::with_capacity(document.nodes.len());
    for raw_node in document.nodes {
        if index_by_id.contains_key(&raw_node.id) {
            return Err(LoadError::DuplicateNodeId(raw_node.id));
        }
        index_by_id.insert(raw_node.id.clone(), nodes.len());
        nodes.push(NodeRecord {
            id: raw_node.id,
            node_type: raw_node.node_type,
            turn_index: raw_node.turn_index,
            role: raw_node.role,
            move_type: raw_node.move_type,
            current_state: raw_node.current_state,
            extra: raw_node.extra,
        });
    }

    let mut links = Vec::with_capacity(document.links.len());
    let mut dropped_links = 0usize;
    for raw_link in document.links {
        match (
            index_by_id.get(&raw_link.source),
            index_by_id.get(&raw_link.target),
        ) {
            (Some(&source), Some(&target)) => links.push(LinkRecord {
                source,
                target,
                edge_type: raw_link.edge_type,
                extra: raw_link.extra,
            }),
            _ => {
                dropped_links += 1;
                debug!(
                    "dropping {} link {} -> {}: unknown endpoint",
                    raw_link.edge_type, raw_link.source, raw_link.target
                );
            }
        }
    }

    if dropped_links > 0 {
        warn!("dropped {dropped_links} link(s) referencing unknown node ids");
    }

    let turn_boundaries = compute_turn_boundaries(&nodes);

    Ok(AtlasGraph {
        nodes,
        links,
        index_by_id,
        turn_boundaries,
        dropped_links,
    })
}

pub fn load_graph_bytes(label: &str, bytes: &[u8]) -> Result<AtlasGraph, LoadError> {
    let text = std::str::from_utf8(bytes).map_err(|_| LoadError::Encoding {
        label: label.to_owned(),
    })?;
    parse_graph(text)
}

pub fn load_graph_file(path: &Path) -> Result<AtlasGraph, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = load_graph_bytes(&path.display().to_string(), &bytes)?;
    info!(
        "loaded {} ({} nodes, {} links)",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn resolve_named_path(data_dir: &Path, name: &str) -> Result<PathBuf, LoadError> {
    let name = name.trim();
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some();
    if !is_plain {
        return Err(LoadError::InvalidName(name.to_owned()));
    }

    let mut path = data_dir.join(name);
    if path.extension().is_none() {
        path.set_extension("json");
    }
    Ok(path)
}

pub fn fetch_named_graph(data_dir: &Path, name: &str) -> Result<AtlasGraph, LoadError> {
    resolve_named_path(data_dir, name)
        .and_then(|path| load_graph_file(&path))
        .map_err(|source| LoadError::Fetch {
            name: name.trim().to_owned(),
            source: Box::new(source),
        })
}

pub fn list_graph_files(data_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(data_dir) else {
        debug!("data directory {} is not readable", data_dir.display());
        return Vec::new();
    };

    let mut names = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
        })
        .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .collect::<Vec<_>>();
    names.sort();
    names
}
