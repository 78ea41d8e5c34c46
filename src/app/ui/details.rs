use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.weak("Click a node to inspect it.");
            return;
        };
        let Some(node) = self.graph.nodes.get(selected) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(node.id.as_str()).strong());
        if let Some(role) = self.graph.boundary_role(selected) {
            ui.small(format!("{role:?} of conversation"));
        }
        ui.add_space(4.0);

        egui::Grid::new("node_fields")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in node.logical_fields() {
                    ui.label(RichText::new(key).monospace());
                    ui.label(value);
                    ui.end_row();
                }
            });

        ui.separator();
        ui.label(RichText::new("Links").strong());
        let mut jump_to = None;
        let mut any = false;
        for (link_index, link) in self.graph.links.iter().enumerate() {
            let (arrow, other) = if link.source == selected {
                ("→", link.target)
            } else if link.target == selected {
                ("←", link.source)
            } else {
                continue;
            };
            any = true;
            let other_node = &self.graph.nodes[other];
            let visible = self.filter.is_active(&other_node.node_type);
            let text = format!("{arrow} {}  {}", link.edge_type, other_node.id);
            let response = ui.add_enabled(visible, egui::Link::new(text));
            if response.clicked() {
                jump_to = Some(other);
            }
            if let Some(extra) = link.extra_summary() {
                ui.indent(("link_extra", link_index), |ui| {
                    ui.small(extra);
                });
            }
        }
        if !any {
            ui.weak("No links.");
        }

        if let Some(index) = jump_to {
            self.set_selected(Some(index));
        }
    }
}
