use eframe::egui::{Color32, Painter, Pos2, Rect, Vec2, vec2};

use crate::atlas::{BoundaryRole, EdgeType, NodeRecord, NodeType};

pub(super) const DIMMED_OPACITY: f32 = 0.12;

const REPAIR_FILL: Color32 = Color32::from_rgb(76, 175, 80);
const BOUNDARY_START_FILL: Color32 = Color32::from_rgb(41, 182, 246);
const BOUNDARY_END_FILL: Color32 = Color32::from_rgb(171, 71, 188);

pub(super) fn node_radius(node_type: &NodeType) -> f32 {
    match node_type {
        NodeType::Conversation => 22.0,
        NodeType::Turn => 14.0,
        NodeType::Move => 8.0,
        NodeType::Constraint => 12.0,
        NodeType::ViolationEvent => 11.0,
        NodeType::InteractionMode => 9.0,
        NodeType::Unknown(_) => 8.0,
    }
}

pub(super) fn type_color(node_type: &NodeType) -> Color32 {
    match node_type {
        NodeType::Conversation => Color32::from_rgb(236, 239, 241),
        NodeType::Turn => Color32::from_rgb(92, 107, 192),
        NodeType::Move => Color32::from_rgb(255, 183, 77),
        NodeType::Constraint => Color32::from_rgb(255, 213, 79),
        NodeType::ViolationEvent => Color32::from_rgb(229, 57, 53),
        NodeType::InteractionMode => Color32::from_rgb(38, 166, 154),
        NodeType::Unknown(_) => Color32::from_rgb(144, 164, 174),
    }
}

// Repair moves win over boundary colouring, which wins over the type colour.
pub(super) fn node_fill(node: &NodeRecord, boundary: Option<BoundaryRole>) -> Color32 {
    if node.is_repair_move() {
        return REPAIR_FILL;
    }
    match boundary {
        Some(BoundaryRole::Start) => BOUNDARY_START_FILL,
        Some(BoundaryRole::End) => BOUNDARY_END_FILL,
        None => type_color(&node.node_type),
    }
}

fn speaker(node: &NodeRecord) -> Option<bool> {
    match node.role.as_deref()?.to_ascii_lowercase().as_str() {
        "user" => Some(true),
        "assistant" => Some(false),
        _ => None,
    }
}

pub(super) fn node_glyph(node: &NodeRecord) -> &'static str {
    match &node.node_type {
        NodeType::Conversation => "C",
        NodeType::Turn => match speaker(node) {
            Some(true) => "U",
            Some(false) => "A",
            None => "T",
        },
        NodeType::Move if node.is_repair_move() => "R",
        NodeType::Move => match speaker(node) {
            Some(true) => "u",
            Some(false) => "a",
            None => "M",
        },
        NodeType::Constraint => "K",
        NodeType::ViolationEvent => "!",
        NodeType::InteractionMode => "I",
        NodeType::Unknown(_) => "?",
    }
}

pub(super) fn glyph_color(fill: Color32) -> Color32 {
    let luminance =
        0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
    if luminance > 150.0 {
        Color32::from_rgb(20, 22, 26)
    } else {
        Color32::from_rgb(245, 245, 245)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct EdgeStyle {
    pub(super) color: Color32,
    pub(super) width: f32,
    pub(super) opacity: f32,
}

pub(super) fn edge_style(edge_type: &EdgeType) -> EdgeStyle {
    let (color, width, opacity) = match edge_type {
        EdgeType::Violates => (Color32::from_rgb(239, 83, 80), 2.6, 0.95),
        EdgeType::Repairs => (Color32::from_rgb(102, 187, 106), 2.6, 0.95),
        EdgeType::Next => (Color32::from_rgb(121, 134, 203), 1.4, 0.6),
        EdgeType::Contains => (Color32::from_rgb(176, 190, 197), 1.0, 0.35),
        EdgeType::HasMove => (Color32::from_rgb(255, 204, 128), 1.0, 0.45),
        EdgeType::Introduces | EdgeType::Ratifies => (Color32::from_rgb(255, 224, 130), 1.2, 0.5),
        EdgeType::Abandons => (Color32::from_rgb(161, 136, 127), 1.2, 0.5),
        EdgeType::Triggers => (Color32::from_rgb(240, 98, 146), 1.2, 0.55),
        EdgeType::OperatesIn => (Color32::from_rgb(77, 182, 172), 1.0, 0.45),
        EdgeType::Unknown(_) => (Color32::from_rgb(120, 130, 140), 1.0, 0.4),
    };
    EdgeStyle {
        color,
        width,
        opacity,
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;
    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn arrowhead(start: Pos2, end: Pos2, target_radius: f32, size: f32) -> Option<[Pos2; 3]> {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + size {
        return None;
    }
    let direction = delta / length;
    let normal = vec2(-direction.y, direction.x);
    let tip = end - direction * target_radius;
    let base = tip - direction * size;
    Some([tip, base + normal * (size * 0.5), base - normal * (size * 0.5)])
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(18, 21, 27));

    let step = (48.0 * zoom.clamp(0.5, 2.0)).max(18.0);
    let origin = rect.center() + pan;
    let dot = Color32::from_rgba_unmultiplied(70, 80, 92, 90);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
        while y < rect.bottom() {
            painter.circle_filled(Pos2::new(x, y), 1.0, dot);
            y += step;
        }
        x += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    Rect::from_two_pos(start, end).intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
