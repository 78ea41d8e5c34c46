use eframe::egui::{self, Pos2, Rect, Ui, Vec2};
use log::debug;

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::{DragState, RenderGraph, ViewModel};

pub(in crate::app) const MIN_ZOOM: f32 = 0.1;
pub(in crate::app) const MAX_ZOOM: f32 = 8.0;
const DRAG_ALPHA_TARGET: f32 = 0.3;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.zoom_about(rect, pointer, (1.0 + scroll * 0.0018).clamp(0.85, 1.15));
    }

    /// Scales the view keeping the world point under `anchor` fixed on screen.
    pub(in crate::app) fn zoom_about(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let world_before = screen_to_world(rect, self.pan, self.zoom, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - world_before * self.zoom;
    }

    pub(in crate::app) fn handle_graph_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        let Some(cache) = self.graph_cache.as_mut() else {
            self.drag = None;
            return;
        };

        if response.drag_started_by(egui::PointerButton::Primary) {
            self.drag = Some(match hovered {
                Some(index) => {
                    debug!("pinning node {index}");
                    cache.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
                    DragState::Node(index)
                }
                None => DragState::Canvas,
            });
        }

        match self.drag {
            Some(DragState::Node(index)) if response.dragged() => {
                if let Some(pointer) = response.interact_pointer_pos() {
                    let world = screen_to_world(rect, self.pan, self.zoom, pointer);
                    cache.simulation.pin(index, world);
                }
            }
            Some(DragState::Canvas) if response.dragged() => {
                self.pan += response.drag_delta();
            }
            _ => {}
        }

        if response.drag_stopped() {
            if let Some(DragState::Node(index)) = self.drag {
                cache.simulation.release(index);
                cache.simulation.set_alpha_target(0.0);
            }
            self.drag = None;
        }
    }

    pub(in crate::app) fn visible_indices(rect: Rect, cache: &RenderGraph) -> Vec<usize> {
        (0..cache.screen_positions.len())
            .filter(|&index| {
                circle_visible(rect, cache.screen_positions[index], cache.screen_radii[index])
            })
            .collect()
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        cache: &RenderGraph,
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = cache.screen_positions[index].distance(pointer);
                (distance <= cache.screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn reset_layout(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
        self.drag = None;
        self.graph_dirty = true;
    }
}
