use eframe::egui::{self, RichText, Ui};

use crate::knowledge::{FilteredNode, NodeKind};

use super::super::ViewModel;

fn describe(ui: &mut Ui, selected: &FilteredNode) {
    let node = &selected.node;
    ui.label(RichText::new(node.label.as_str()).strong());
    ui.small(node.id.as_str());
    ui.add_space(6.0);

    ui.label(format!("Kind: {}", node.kind_label()));
    if let Some(status) = node.status() {
        ui.label(format!("Status: {}", status.label()));
    }
    if let Some(area) = node.area() {
        ui.label(format!("Area: {}", area.name));
    }
    if let Some(level) = node.level() {
        ui.label(format!("Level: {level}"));
    }
    match &node.kind {
        NodeKind::Content(content) => {
            ui.label(format!("Item: {}", content.item_id));
            if let Some(parent) = &content.parent_id {
                ui.label(format!("Builds on: {parent}"));
            }
        }
        NodeKind::Journal(journal) => {
            ui.label(format!("Date: {}", journal.raw_date));
            ui.label(format!("Entry: {}", journal.entry_id));
        }
        NodeKind::Root | NodeKind::Area(_) => {}
    }

    ui.label(format!("Connections (filtered): {}", selected.connection_count));
    if selected.reachable {
        ui.label(format!("Distance from root: {}", selected.distance_from_root));
    } else {
        ui.label("Distance from root: unreachable");
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a content node to inspect it.");
            return;
        };

        let Some(index) = self.filtered.index_of(&selected_id) else {
            ui.label("The selected node is hidden by the current filters.");
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
            }
            return;
        };

        describe(ui, &self.filtered.nodes[index]);

        ui.separator();
        ui.label(RichText::new("Path from root").strong());
        match self.filtered.path_from_root(index) {
            Some(path) => {
                let rendered = path
                    .iter()
                    .map(|&step| self.filtered.nodes[step].node.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                ui.label(rendered);
            }
            None => {
                ui.label("Not connected to the root in the current view.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Connected nodes").strong());
        let mut neighbors = self
            .filtered
            .neighbors(index)
            .into_iter()
            .map(|neighbor| (neighbor, &self.filtered.nodes[neighbor].node))
            .collect::<Vec<_>>();
        neighbors.sort_by(|(_, a), (_, b)| a.label.cmp(&b.label));

        let mut activated = None;
        if neighbors.is_empty() {
            ui.label("No connections in the current view.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("neighbor_scroll")
                .max_height(320.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for (neighbor_index, neighbor) in neighbors {
                        let text = format!("{}  ({})", neighbor.label, neighbor.kind_label());
                        let inspectable = matches!(
                            neighbor.kind,
                            NodeKind::Content(_) | NodeKind::Journal(_)
                        );
                        if inspectable {
                            if ui.link(text).on_hover_text(neighbor.id.as_str()).clicked() {
                                activated = Some(neighbor_index);
                            }
                        } else {
                            ui.label(text);
                        }
                    }
                });
        }

        if let Some(neighbor_index) = activated {
            self.activate_node(neighbor_index);
        }
    }
}
