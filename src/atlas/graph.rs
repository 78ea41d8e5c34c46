use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "String")]
pub enum NodeType {
    Conversation,
    Turn,
    Move,
    Constraint,
    ViolationEvent,
    InteractionMode,
    Unknown(String),
}

impl NodeType {
    pub const KNOWN: [NodeType; 6] = [
        NodeType::Conversation,
        NodeType::Turn,
        NodeType::Move,
        NodeType::Constraint,
        NodeType::ViolationEvent,
        NodeType::InteractionMode,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Conversation => "Conversation",
            Self::Turn => "Turn",
            Self::Move => "Move",
            Self::Constraint => "Constraint",
            Self::ViolationEvent => "ViolationEvent",
            Self::InteractionMode => "InteractionMode",
            Self::Unknown(label) => label.as_str(),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Conversation" => Self::Conversation,
            "Turn" => Self::Turn,
            "Move" => Self::Move,
            "Constraint" => Self::Constraint,
            "ViolationEvent" => Self::ViolationEvent,
            "InteractionMode" => Self::InteractionMode,
            _ => Self::Unknown(value),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "String")]
pub enum EdgeType {
    Contains,
    Next,
    HasMove,
    Introduces,
    Ratifies,
    Violates,
    Repairs,
    Abandons,
    Triggers,
    OperatesIn,
    Unknown(String),
}

impl EdgeType {
    pub fn label(&self) -> &str {
        match self {
            Self::Contains => "CONTAINS",
            Self::Next => "NEXT",
            Self::HasMove => "HAS_MOVE",
            Self::Introduces => "INTRODUCES",
            Self::Ratifies => "RATIFIES",
            Self::Violates => "VIOLATES",
            Self::Repairs => "REPAIRS",
            Self::Abandons => "ABANDONS",
            Self::Triggers => "TRIGGERS",
            Self::OperatesIn => "OPERATES_IN",
            Self::Unknown(label) => label.as_str(),
        }
    }

    /// Edge types the view foregrounds with heavier, more opaque strokes.
    pub fn is_emphasized(&self) -> bool {
        matches!(self, Self::Violates | Self::Repairs)
    }
}

impl From<String> for EdgeType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "CONTAINS" => Self::Contains,
            "NEXT" => Self::Next,
            "HAS_MOVE" => Self::HasMove,
            "INTRODUCES" => Self::Introduces,
            "RATIFIES" => Self::Ratifies,
            "VIOLATES" => Self::Violates,
            "REPAIRS" => Self::Repairs,
            "ABANDONS" => Self::Abandons,
            "TRIGGERS" => Self::Triggers,
            "OPERATES_IN" => Self::OperatesIn,
            _ => Self::Unknown(value),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub id: String,
    pub node_type: NodeType,
    pub turn_index: Option<i64>,
    pub role: Option<String>,
    pub move_type: Option<String>,
    pub current_state: Option<String>,
    pub extra: Map<String, Value>,
}

impl NodeRecord {
    pub fn is_repair_move(&self) -> bool {
        self.move_type
            .as_deref()
            .is_some_and(|move_type| move_type.to_ascii_lowercase().contains("repair"))
    }

    pub fn has_survived(&self) -> bool {
        matches!(
            self.current_state.as_deref(),
            Some("SURVIVED") | Some("ACTIVE")
        )
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.extra.get(key) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(value)) => value.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.extra.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Logical attributes in display order: known fields first, then passthrough fields
    /// sorted by key.
    pub fn logical_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("id".to_owned(), self.id.clone()),
            ("node_type".to_owned(), self.node_type.label().to_owned()),
        ];
        if let Some(turn_index) = self.turn_index {
            fields.push(("turn_index".to_owned(), turn_index.to_string()));
        }
        for (key, value) in [
            ("role", &self.role),
            ("move_type", &self.move_type),
            ("current_state", &self.current_state),
        ] {
            if let Some(value) = value {
                fields.push((key.to_owned(), value.clone()));
            }
        }

        let mut extra = self.extra.iter().collect::<Vec<_>>();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in extra {
            fields.push((key.clone(), render_value(value)));
        }
        fields
    }
}

#[derive(Clone, Debug)]
pub struct LinkRecord {
    pub source: usize,
    pub target: usize,
    pub edge_type: EdgeType,
    pub extra: Map<String, Value>,
}

impl LinkRecord {
    pub fn extra_summary(&self) -> Option<String> {
        if self.extra.is_empty() {
            return None;
        }
        let mut entries = self.extra.iter().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let parts = entries
            .into_iter()
            .map(|(key, value)| format!("{key}={}", render_value(value)))
            .collect::<Vec<_>>();
        Some(parts.join(", "))
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnBoundaries {
    pub first: usize,
    pub last: usize,
}

#[derive(Clone, Debug, Default)]
pub struct AtlasGraph {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub index_by_id: HashMap<String, usize>,
    pub turn_boundaries: Option<TurnBoundaries>,
    pub dropped_links: usize,
}

impl AtlasGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_types(&self) -> Vec<NodeType> {
        let mut seen = Vec::new();
        for node in &self.nodes {
            if !seen.contains(&node.node_type) {
                seen.push(node.node_type.clone());
            }
        }
        seen
    }

    pub fn boundary_role(&self, index: usize) -> Option<BoundaryRole> {
        let boundaries = self.turn_boundaries?;
        if boundaries.first == index {
            Some(BoundaryRole::Start)
        } else if boundaries.last == index {
            Some(BoundaryRole::End)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryRole {
    Start,
    End,
}

pub(super) fn compute_turn_boundaries(nodes: &[NodeRecord]) -> Option<TurnBoundaries> {
    let mut turns = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.node_type == NodeType::Turn)
        .map(|(index, node)| (node.turn_index.unwrap_or(0), index))
        .collect::<Vec<_>>();

    // Stable sort keeps document order for equal indices.
    turns.sort_by_key(|(turn_index, _)| *turn_index);

    let first = turns.first()?.1;
    let last = turns.last()?.1;
    Some(TurnBoundaries { first, last })
}
