use eframe::egui::{self, Align, Context, Layout, Vec2};
use log::debug;

use crate::atlas::{AtlasGraph, NodeType, SummaryStats};

use super::super::filter::FilterState;
use super::super::layout::LayoutMode;
use super::super::{LoadPanel, LoadRequest, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(graph: AtlasGraph, source_label: Option<String>) -> Self {
        let summary = SummaryStats::compute(&graph);
        let filter = FilterState::for_graph(&graph);

        Self {
            graph,
            source_label,
            summary,
            filter,
            mode: LayoutMode::default(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            drag: None,
            canvas_size: Vec2::new(1000.0, 800.0),
            graph_dirty: true,
            graph_cache: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        load_panel: &mut LoadPanel,
        is_loading: bool,
    ) -> Option<LoadRequest> {
        let mut request = None;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Atlas Explorer");
                    ui.separator();
                    match &self.source_label {
                        Some(label) => ui.label(label.as_str()),
                        None => ui.weak("no graph loaded"),
                    };
                    ui.label(format!("nodes: {}", self.graph.node_count()));
                    ui.label(format!("links: {}", self.graph.edge_count()));
                    if is_loading {
                        ui.spinner();
                        ui.label("loading...");
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(cache) = &self.graph_cache {
                            ui.label(format!(
                                "{} layout, alpha {:.3}",
                                cache.simulation.mode().label(),
                                cache.simulation.alpha()
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    request = self.draw_controls(ui, load_panel, is_loading);
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_summary(ui);
                    ui.separator();
                    self.draw_details(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        request
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<usize>) {
        if self.selected != selected {
            debug!("selection -> {selected:?}");
            self.selected = selected;
        }
    }

    pub(in crate::app) fn toggle_filter(&mut self, node_type: &NodeType) {
        let shown = self.filter.toggle(node_type);
        debug!("filter {node_type} -> {}", if shown { "shown" } else { "hidden" });

        if let Some(selected) = self.selected
            && !self.filter.is_active(&self.graph.nodes[selected].node_type)
        {
            self.selected = None;
        }
        self.drag = None;
        self.graph_dirty = true;
    }

    pub(in crate::app) fn set_mode(&mut self, mode: LayoutMode) {
        if self.mode == mode {
            return;
        }
        debug!("layout mode {} -> {}", self.mode.label(), mode.label());
        self.mode = mode;
        if let Some(cache) = self.graph_cache.as_mut() {
            cache.simulation.set_mode(mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::parse_graph;

    fn model() -> ViewModel {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "conv", "node_type": "Conversation"},
                {"id": "t0", "node_type": "Turn", "turn_index": 0},
                {"id": "t1", "node_type": "Turn", "turn_index": 1},
                {"id": "m0", "node_type": "Move", "move_type": "repair"}
            ], "links": [
                {"source": "conv", "target": "t0", "edge_type": "CONTAINS"},
                {"source": "conv", "target": "t1", "edge_type": "CONTAINS"},
                {"source": "t1", "target": "m0", "edge_type": "HAS_MOVE"}
            ]}"#,
        )
        .unwrap();
        ViewModel::new(graph, Some("test.json".to_owned()))
    }

    #[test]
    fn hiding_the_selected_type_clears_selection() {
        let mut model = model();
        model.set_selected(Some(3));
        model.toggle_filter(&NodeType::Turn);
        assert_eq!(model.selected, Some(3));

        model.toggle_filter(&NodeType::Move);
        assert_eq!(model.selected, None);
        assert!(model.graph_dirty);
    }

    #[test]
    fn filter_toggle_never_mutates_the_graph() {
        let mut model = model();
        model.toggle_filter(&NodeType::Turn);
        model.rebuild_render_graph();
        assert_eq!(model.graph.node_count(), 4);
        assert_eq!(model.graph.edge_count(), 3);
        assert_eq!(model.graph_cache.as_ref().unwrap().nodes.len(), 2);
    }

    #[test]
    fn mode_switch_keeps_positions_and_simulation() {
        let mut model = model();
        model.rebuild_render_graph();
        for _ in 0..25 {
            model.graph_cache.as_mut().unwrap().simulation.step();
        }
        let cache = model.graph_cache.as_ref().unwrap();
        let before = (0..cache.nodes.len())
            .map(|index| cache.simulation.position(index))
            .collect::<Vec<_>>();

        model.set_mode(LayoutMode::Radial);
        let cache = model.graph_cache.as_ref().unwrap();
        let after = (0..cache.nodes.len())
            .map(|index| cache.simulation.position(index))
            .collect::<Vec<_>>();
        assert_eq!(before, after);
        assert_eq!(cache.simulation.mode(), LayoutMode::Radial);
        assert!(!model.graph_dirty);
    }

    #[test]
    fn summary_is_computed_on_construction() {
        let model = model();
        assert_eq!(model.summary.turns, 2);
        assert_eq!(model.summary.repair_moves, 1);
        assert_eq!(model.summary.drift_velocity, 0.0);
    }
}
