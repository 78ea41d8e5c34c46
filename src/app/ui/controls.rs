use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::debug;

use super::super::layout::LayoutMode;
use super::super::render_utils::type_color;
use super::super::{LoadPanel, LoadRequest, ViewModel};

const MAX_LISTED_FILES: usize = 12;

fn rank_graph_files<'a>(available: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return available.iter().map(String::as_str).collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored = available
        .iter()
        .filter_map(|name| {
            matcher
                .fuzzy_match(name, query)
                .map(|score| (score, name.as_str()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().map(|(_, name)| name).collect()
}

fn pick_graph_file() -> Option<LoadRequest> {
    let path = rfd::FileDialog::new()
        .set_title("Open conversation graph")
        .add_filter("Graph JSON", &["json"])
        .add_filter("All files", &["*"])
        .pick_file();
    match path {
        Some(path) => Some(LoadRequest::Path(path)),
        None => {
            debug!("file dialog cancelled");
            None
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        load_panel: &mut LoadPanel,
        is_loading: bool,
    ) -> Option<LoadRequest> {
        let mut request = None;

        ui.heading("Load");
        ui.add_space(4.0);
        Self::draw_drop_zone(ui);
        ui.add_space(4.0);
        if ui
            .add_enabled(!is_loading, egui::Button::new("Open…"))
            .on_hover_text("Choose a graph JSON file from disk.")
            .clicked()
        {
            request = pick_graph_file();
        }

        ui.add_space(6.0);
        ui.label(format!("Named graphs in {}", load_panel.data_dir.display()));
        ui.horizontal(|ui| {
            let search = ui.text_edit_singleline(&mut load_panel.query);
            if search.changed() {
                load_panel.chosen = None;
            }
            if ui.small_button("Rescan").on_hover_text("Re-read the data directory.").clicked() {
                load_panel.refresh();
            }
        });

        let ranked = rank_graph_files(&load_panel.available, &load_panel.query);
        if load_panel.available.is_empty() {
            ui.weak("No .json files found.");
        }
        for name in ranked.iter().take(MAX_LISTED_FILES) {
            let is_chosen = load_panel.chosen.as_deref() == Some(*name);
            if ui.selectable_label(is_chosen, *name).clicked() {
                load_panel.chosen = Some((*name).to_owned());
            }
        }

        let target = load_panel
            .chosen
            .clone()
            .or_else(|| ranked.first().map(|name| (*name).to_owned()))
            .or_else(|| {
                let query = load_panel.query.trim();
                (!query.is_empty()).then(|| query.to_owned())
            });
        let load_button = ui
            .add_enabled(!is_loading && target.is_some(), egui::Button::new("Load"))
            .on_hover_text("Fetch the highlighted name from the data directory.");
        if load_button.clicked()
            && let Some(name) = target
        {
            request = Some(LoadRequest::Named {
                data_dir: load_panel.data_dir.clone(),
                name,
            });
        }

        ui.separator();
        ui.heading("Layout");
        let mut mode = self.mode;
        egui::ComboBox::from_id_salt("layout_mode")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for option in LayoutMode::ALL {
                    ui.selectable_value(&mut mode, option, option.label());
                }
            });
        self.set_mode(mode);

        ui.horizontal(|ui| {
            if ui
                .button("Reset layout")
                .on_hover_text("Re-seed node positions and reset pan and zoom.")
                .clicked()
            {
                self.reset_layout();
            }
            let fullscreen = ui.ctx().input(|input| input.viewport().fullscreen.unwrap_or(false));
            let label = if fullscreen { "Exit fullscreen" } else { "Fullscreen" };
            if ui.button(label).clicked() {
                ui.ctx()
                    .send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
            }
        });

        ui.separator();
        ui.heading(format!(
            "Node types ({}/{})",
            self.filter.active_count(),
            self.filter.available().len()
        ));
        ui.add_space(2.0);
        let mut toggled = None;
        ui.horizontal_wrapped(|ui| {
            for node_type in self.filter.available() {
                let active = self.filter.is_active(node_type);
                let text = RichText::new(node_type.label()).color(if active {
                    Color32::from_gray(235)
                } else {
                    Color32::from_gray(120)
                });
                let pill = egui::Button::new(text)
                    .selected(active)
                    .corner_radius(10.0)
                    .stroke(Stroke::new(1.0, type_color(node_type)));
                if ui.add(pill).clicked() {
                    toggled = Some(node_type.clone());
                }
            }
        });
        if let Some(node_type) = toggled {
            self.toggle_filter(&node_type);
        }

        request
    }

    fn draw_drop_zone(ui: &mut Ui) {
        let hovering = ui.ctx().input(|input| !input.raw.hovered_files.is_empty());
        let stroke = if hovering {
            Stroke::new(2.0, Color32::from_rgb(103, 196, 255))
        } else {
            Stroke::new(1.0, Color32::from_gray(90))
        };
        egui::Frame::group(ui.style())
            .stroke(stroke)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.add_space(10.0);
                    if hovering {
                        ui.strong("Release to load");
                    } else {
                        ui.label("Drop a graph JSON file anywhere");
                    }
                    ui.add_space(10.0);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["alpha_session.json", "beta_drift.json", "gamma_repair.json"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn blank_query_lists_everything() {
        let available = names();
        assert_eq!(rank_graph_files(&available, "  ").len(), 3);
    }

    #[test]
    fn fuzzy_query_filters_and_ranks() {
        let available = names();
        let ranked = rank_graph_files(&available, "rpr");
        assert_eq!(ranked, vec!["gamma_repair.json"]);

        let ranked = rank_graph_files(&available, "DRIFT");
        assert_eq!(ranked.first(), Some(&"beta_drift.json"));
        assert!(rank_graph_files(&available, "zzz").is_empty());
    }
}
