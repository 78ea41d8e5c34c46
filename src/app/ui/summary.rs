use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

impl ViewModel {
    pub(in crate::app) fn draw_summary(&self, ui: &mut Ui) {
        ui.heading("Summary");
        ui.add_space(4.0);

        let stats = &self.summary;
        egui::Grid::new("summary_stats")
            .num_columns(2)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                let rows = [
                    ("Turns", stats.turns.to_string()),
                    ("Constraints", stats.constraints.to_string()),
                    ("Violations", stats.violations.to_string()),
                    ("Repair moves", stats.repair_moves.to_string()),
                    ("Survived constraints", stats.survived_constraints.to_string()),
                    ("Drift velocity", format!("{:.2}", stats.drift_velocity)),
                    ("Survival rate", percent(stats.survival_rate)),
                    ("Agency tax", format!("{:.2}", stats.agency_tax)),
                    ("Repair success", percent(stats.repair_success_rate)),
                    ("Mode violations", percent(stats.mode_violation_rate)),
                    (
                        "Constraint half-life",
                        stats
                            .constraint_half_life
                            .map_or_else(|| "n/a".to_owned(), |turns| format!("{turns:.1} turns")),
                    ),
                    ("Mean lifespan", format!("{:.2}", stats.mean_constraint_lifespan)),
                    ("Mode entropy", format!("{:.2} bits", stats.mode_entropy)),
                    ("Move coverage", percent(stats.move_coverage)),
                ];
                for (label, value) in rows {
                    ui.label(label);
                    ui.label(RichText::new(value).strong());
                    ui.end_row();
                }
            });

        if stats.dropped_links > 0 {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                format!("{} link(s) referenced missing nodes", stats.dropped_links),
            );
        }

        ui.collapsing("Counts by type", |ui| {
            for (label, count) in &stats.node_type_counts {
                ui.label(format!("{label}: {count}"));
            }
            ui.separator();
            for (label, count) in &stats.edge_type_counts {
                ui.label(format!("{label}: {count}"));
            }
        });
    }
}
