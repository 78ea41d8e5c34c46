use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2};

use super::super::highlight::build_highlight_state;
use super::super::render_utils::{
    DIMMED_OPACITY, arrowhead, blend_color, draw_background, edge_style, glyph_color,
    node_fill, node_glyph, segment_visible, with_opacity, world_to_screen,
};
use super::super::{RenderGraph, ViewModel};

const SELECTED_RING: Color32 = Color32::from_rgb(245, 206, 93);

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
        cache.screen_positions.clear();
        cache.screen_radii.clear();
        for (index, node) in cache.nodes.iter().enumerate() {
            cache.screen_positions.push(world_to_screen(
                rect,
                pan,
                zoom,
                cache.simulation.position(index),
            ));
            cache.screen_radii.push((node.radius * zoom).max(1.5));
        }
    }

    fn pointer_hover(&self, ui: &Ui, rect: Rect) -> Option<usize> {
        let cache = self.graph_cache.as_ref()?;
        let visible = Self::visible_indices(rect, cache);
        Self::hovered_index(ui, &visible, cache)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        self.canvas_size = rect.size();
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        if self.graph.node_count() == 0 {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Open or drop a graph JSON file to begin",
                FontId::proportional(16.0),
                Color32::from_gray(150),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        let hovered = self.pointer_hover(ui, rect);
        self.handle_graph_drag(rect, &response, hovered);

        let pan = self.pan;
        let zoom = self.zoom;
        let Some(cache) = self.graph_cache.as_mut() else {
            return;
        };
        cache.simulation.resize(rect.size());
        let moving = cache.simulation.step();
        Self::update_screen_space(rect, pan, zoom, cache);

        if cache.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Every node type is filtered out",
                FontId::proportional(15.0),
                Color32::from_gray(150),
            );
        }

        let hovered = self.pointer_hover(ui, rect);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selected = hovered.and_then(|index| {
                self.graph_cache
                    .as_ref()
                    .map(|cache| cache.nodes[index].graph_index)
            });
            self.set_selected(selected);
        }

        if let Some(cache) = self.graph_cache.as_ref() {
            self.paint_graph(&painter, rect, cache, hovered);
        }

        if let (Some(index), Some(pointer)) = (hovered, response.hover_pos())
            && let Some(cache) = self.graph_cache.as_ref()
        {
            let node = &self.graph.nodes[cache.nodes[index].graph_index];
            let galley = painter.layout_no_wrap(
                format!("{}  {}", node.node_type, node.id),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            let origin = pointer + vec2(14.0, 14.0);
            let frame = Rect::from_min_size(origin, galley.size()).expand(5.0);
            painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(28, 32, 40, 235));
            painter.galley(origin, galley, Color32::from_gray(240));
        }

        if moving || self.drag.is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn paint_graph(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        cache: &RenderGraph,
        hovered: Option<usize>,
    ) {
        let selected = self
            .selected
            .and_then(|graph_index| cache.render_index_by_graph.get(&graph_index).copied());
        let highlight = selected.map(|index| build_highlight_state(cache, index));
        let zoom_sqrt = self.zoom.sqrt();

        // Emphasized edges paint last so they sit on top.
        let mut edge_order = (0..cache.edges.len()).collect::<Vec<_>>();
        edge_order.sort_by_key(|&index| cache.edges[index].edge_type.is_emphasized());

        for edge_index in edge_order {
            let edge = &cache.edges[edge_index];
            let start = cache.screen_positions[edge.source];
            let end = cache.screen_positions[edge.target];
            if !segment_visible(rect, start, end) {
                continue;
            }

            let style = edge_style(&edge.edge_type);
            let opacity = match &highlight {
                Some(state) if state.is_edge_dimmed(edge_index) => DIMMED_OPACITY,
                _ => style.opacity,
            };
            let color = with_opacity(style.color, opacity);
            let width = (style.width * zoom_sqrt).clamp(0.5, 6.0);
            let head_size = (7.0 * zoom_sqrt).clamp(4.0, 14.0);

            match arrowhead(start, end, cache.screen_radii[edge.target], head_size) {
                Some(head) => {
                    let shaft_end = head[1] + (head[2] - head[1]) * 0.5;
                    painter.line_segment([start, shaft_end], Stroke::new(width, color));
                    painter.add(Shape::convex_polygon(head.to_vec(), color, Stroke::NONE));
                }
                None => {
                    painter.line_segment([start, end], Stroke::new(width, color));
                }
            }
        }

        for (index, render_node) in cache.nodes.iter().enumerate() {
            let position = cache.screen_positions[index];
            let radius = cache.screen_radii[index];
            if !rect.expand(radius).contains(position) {
                continue;
            }

            let node = &self.graph.nodes[render_node.graph_index];
            let dimmed = highlight
                .as_ref()
                .is_some_and(|state| state.is_node_dimmed(index));
            let opacity = if dimmed { DIMMED_OPACITY } else { 1.0 };
            let is_hovered = hovered == Some(index);

            let base_fill = node_fill(node, self.graph.boundary_role(render_node.graph_index));
            let fill = if is_hovered {
                blend_color(base_fill, Color32::WHITE, 0.25)
            } else {
                base_fill
            };
            painter.circle_filled(position, radius, with_opacity(fill, opacity));

            let outline = if selected == Some(index) {
                Stroke::new(2.5, SELECTED_RING)
            } else if cache.simulation.is_pinned(index) {
                Stroke::new(1.6, Color32::from_gray(235))
            } else {
                Stroke::new(1.0, with_opacity(Color32::from_gray(12), 0.8 * opacity))
            };
            painter.circle_stroke(position, radius, outline);

            if radius >= 5.0 {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    node_glyph(node),
                    FontId::monospace((radius * 1.05).clamp(7.0, 28.0)),
                    with_opacity(glyph_color(base_fill), opacity),
                );
            }

            let show_label = selected == Some(index) || is_hovered || self.zoom > 1.6;
            if show_label && !dimmed {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.id.as_str(),
                    FontId::proportional(12.0),
                    Color32::from_gray(230),
                );
            }
        }
    }
}
