use eframe::egui::{self, Ui};

use crate::knowledge::{FilterPredicates, Status};

use super::super::ViewModel;
use super::super::physics::SPACING_RANGE;
use super::super::present::{SCALE_RANGE, ViewMode};

const ANY: &str = "Any";

fn option_combo(ui: &mut Ui, label: &str, current: &mut Option<String>, choices: &[String]) {
    egui::ComboBox::from_label(label)
        .selected_text(current.as_deref().unwrap_or(ANY))
        .show_ui(ui, |ui| {
            ui.selectable_value(current, None, ANY);
            for choice in choices {
                ui.selectable_value(current, Some(choice.clone()), choice.as_str());
            }
        });
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, now: f64) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Colour nodes");
        ui.horizontal(|ui| {
            for mode in ViewMode::ALL {
                ui.selectable_value(&mut self.view_mode, mode, mode.label());
            }
        });

        ui.separator();
        ui.label("Filters");
        let mut predicates: FilterPredicates = self.predicates.clone();
        option_combo(ui, "Area", &mut predicates.area, &self.options.areas);
        egui::ComboBox::from_label("Status")
            .selected_text(predicates.status.map_or(ANY, Status::label))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut predicates.status, None, ANY);
                for status in Status::ALL {
                    ui.selectable_value(&mut predicates.status, Some(status), status.label());
                }
            });
        option_combo(ui, "Level", &mut predicates.level, &self.options.levels);
        if ui
            .add_enabled(!predicates.is_empty(), egui::Button::new("Clear filters"))
            .clicked()
        {
            predicates = FilterPredicates::default();
        }
        self.set_predicates(predicates);

        ui.separator();
        ui.label("Search")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the filtered graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.label("Layout");
        let mut spacing = *self.spacing.display();
        ui.add(
            egui::Slider::new(&mut spacing, SPACING_RANGE)
                .text("spacing")
                .suffix(" px"),
        )
        .on_hover_text("Link distance between connected nodes.");
        self.adjust_spacing(spacing, now);

        let mut scale = *self.node_scale.display();
        ui.add(
            egui::Slider::new(&mut scale, SCALE_RANGE)
                .text("node size")
                .suffix("x"),
        );
        self.adjust_node_scale(scale, now);

        ui.separator();
        ui.label("View");
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.camera.zoom_in();
            }
            if ui.button("Zoom out").clicked() {
                self.camera.zoom_out();
            }
            if ui.button("Reset").clicked() {
                self.camera.reset();
            }
        });
        ui.label(format!("zoom {:.0}%", self.camera.zoom * 100.0));
    }
}
