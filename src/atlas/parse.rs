use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::LoadError;
use super::graph::{EdgeType, NodeType};

// Simulation state some exporters write back into node and link objects.
const TRANSIENT_KEYS: [&str; 7] = ["x", "y", "vx", "vy", "fx", "fy", "index"];

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    #[serde(deserialize_with = "id_string")]
    pub(super) id: String,
    #[serde(default = "unknown_node_type")]
    pub(super) node_type: NodeType,
    #[serde(default, deserialize_with = "lenient_index")]
    pub(super) turn_index: Option<i64>,
    #[serde(default)]
    pub(super) role: Option<String>,
    #[serde(default)]
    pub(super) move_type: Option<String>,
    #[serde(default)]
    pub(super) current_state: Option<String>,
    #[serde(flatten)]
    pub(super) extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawLink {
    #[serde(deserialize_with = "id_string")]
    pub(super) source: String,
    #[serde(deserialize_with = "id_string")]
    pub(super) target: String,
    #[serde(default = "unknown_edge_type")]
    pub(super) edge_type: EdgeType,
    #[serde(flatten)]
    pub(super) extra: Map<String, Value>,
}

pub(super) struct RawDocument {
    pub(super) nodes: Vec<RawNode>,
    pub(super) links: Vec<RawLink>,
}

fn unknown_node_type() -> NodeType {
    NodeType::Unknown("unknown".to_owned())
}

fn unknown_edge_type() -> EdgeType {
    EdgeType::Unknown("unknown".to_owned())
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string id, found {other}"
        ))),
    }
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value.round() as i64)),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, LoadError> {
    object
        .get(key)
        .ok_or_else(|| LoadError::InvalidDocument(format!("missing `{key}` array")))?
        .as_array()
        .ok_or_else(|| LoadError::InvalidDocument(format!("`{key}` is not an array")))
}

pub(super) fn parse_document(raw: &str) -> Result<RawDocument, LoadError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let object = parsed
        .as_object()
        .ok_or_else(|| LoadError::InvalidDocument("top-level value is not an object".to_owned()))?;

    let raw_nodes = array_field(object, "nodes")?;
    let raw_links = array_field(object, "links")?;

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (position, value) in raw_nodes.iter().enumerate() {
        let mut node = RawNode::deserialize(value)
            .map_err(|error| LoadError::InvalidDocument(format!("node #{position}: {error}")))?;
        node.extra
            .retain(|key, _| !TRANSIENT_KEYS.contains(&key.as_str()));
        nodes.push(node);
    }

    let mut links = Vec::with_capacity(raw_links.len());
    for (position, value) in raw_links.iter().enumerate() {
        let mut link = RawLink::deserialize(value)
            .map_err(|error| LoadError::InvalidDocument(format!("link #{position}: {error}")))?;
        link.extra
            .retain(|key, _| !TRANSIENT_KEYS.contains(&key.as_str()));
        links.push(link);
    }

    Ok(RawDocument { nodes, links })
}
