use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout, RichText};
use tracing::{debug, info, warn};

use crate::knowledge::{FilterOptions, FilterPredicates, GraphSnapshot, NodeKind, filter};

use super::super::debounce::Debounced;
use super::super::interaction::{Camera, GraphEvent, HoverState, click_action};
use super::super::physics::{LayoutParams, SimulationController};
use super::super::present::{Palette, parse_hex_color};
use super::super::{AppConfig, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(snapshot: GraphSnapshot, config: &AppConfig) -> Self {
        for node in &snapshot.nodes {
            if let NodeKind::Area(area) = &node.kind
                && let Err(error) = parse_hex_color(&area.color)
            {
                warn!(area = %area.name, %error, "area colour falls back to grey");
            }
        }

        let params = LayoutParams {
            link_distance: config.spacing,
            node_scale: config.node_scale,
        }
        .clamped();
        let predicates = FilterPredicates::default();

        Self {
            options: FilterOptions::from_snapshot(&snapshot),
            filtered: filter(&snapshot, &predicates),
            snapshot,
            predicates,
            filter_dirty: false,
            layout_identity: None,
            controller: SimulationController::new(params),
            spacing: Debounced::new(params.link_distance),
            node_scale: Debounced::new(params.node_scale),
            view_mode: config.view_mode,
            palette: Palette::with_accent(config.accent),
            camera: Camera::default(),
            hover: HoverState::default(),
            search: String::new(),
            search_match_cache: None,
            selected: None,
            date_view: None,
            events: Vec::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let now = ctx.input(|input| input.time);
        self.refresh_filter();
        self.commit_layout_params(now);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Knowledge Atlas");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!(
                        "nodes: {} / {}",
                        self.filtered.nodes.len(),
                        self.snapshot.node_count()
                    ));
                    ui.label(format!(
                        "edges: {} / {}",
                        self.filtered.edges.len(),
                        self.snapshot.edge_count()
                    ));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.layout_status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui, now));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading knowledge graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });

        self.draw_date_view(ctx);
        self.drain_events();

        let pending = [self.spacing.remaining(now), self.node_scale.remaining(now)]
            .into_iter()
            .flatten()
            .reduce(f64::min);
        if let Some(remaining) = pending {
            ctx.request_repaint_after(Duration::from_secs_f64(remaining));
        }
    }

    fn layout_status_text(&self) -> String {
        let generation = self.controller.generation();
        match self.controller.simulation() {
            Some(simulation) if simulation.is_settled() => format!(
                "layout settled at {:.0} px (build {generation})",
                simulation.params().link_distance
            ),
            Some(simulation) if simulation.alpha_target() > 0.0 => {
                format!("layout held warm while dragging (build {generation})")
            }
            Some(simulation) => {
                format!("layout alpha {:.3} (build {generation})", simulation.alpha())
            }
            None => "layout idle".to_owned(),
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
    }

    /// Routes a click on node `index` the same way from the canvas and the
    /// details panel: journals open their date, content opens details.
    pub(in crate::app) fn activate_node(&mut self, index: usize) {
        let Some(node) = self.filtered.nodes.get(index) else {
            return;
        };
        if let Some(event) = click_action(&node.node).into_event() {
            self.events.push(event);
        }
    }

    fn drain_events(&mut self) {
        for event in std::mem::take(&mut self.events) {
            match event {
                GraphEvent::NodeClicked { node_id } => {
                    let label = self
                        .filtered
                        .node(&node_id)
                        .map_or("", |node| node.node.label.as_str());
                    info!(node = %node_id, label, "node opened");
                    self.set_selected(Some(node_id));
                }
                GraphEvent::NavigateToDate(date) => {
                    info!(%date, "navigating to journal date");
                    self.date_view = Some(date);
                }
                GraphEvent::SpacingChanged(spacing) => {
                    debug!(spacing, "link spacing committed");
                }
                GraphEvent::ScaleChanged(scale) => {
                    debug!(scale, "node scale committed");
                }
            }
        }
    }

    fn draw_date_view(&mut self, ctx: &Context) {
        let Some(date) = self.date_view else {
            return;
        };

        let mut open = true;
        egui::Window::new("Journal")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.label(RichText::new(date.format("%A, %B %-d, %Y").to_string()).strong());
                ui.add_space(6.0);

                let entries = self
                    .snapshot
                    .nodes
                    .iter()
                    .filter_map(|node| match &node.kind {
                        NodeKind::Journal(journal) if journal.date == Some(date) => Some(journal),
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                if entries.is_empty() {
                    ui.label("No journal entry for this day.");
                }
                for entry in entries {
                    let state = if entry.is_complete {
                        "complete"
                    } else {
                        "open"
                    };
                    ui.label(format!("Entry {}: {state}", entry.entry_id));
                }
            });

        if !open {
            self.date_view = None;
        }
    }
}

#[cfg(test)]
impl ViewModel {
    pub(in crate::app) fn demo() -> Self {
        let config = AppConfig {
            source: crate::knowledge::SnapshotSource::Demo,
            self_label: "Me".to_owned(),
            accent: eframe::egui::Color32::from_rgb(139, 92, 246),
            spacing: 90.0,
            node_scale: 1.0,
            view_mode: super::super::ViewMode::Category,
        };
        let snapshot = crate::knowledge::collect_snapshot(&config.source, &config.self_label)
            .expect("demo snapshot");
        Self::new(snapshot, &config)
    }
}
