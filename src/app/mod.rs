use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use chrono::NaiveDate;
use eframe::egui::{self, Color32, Context};
use tracing::error;

use crate::knowledge::{
    FilterOptions, FilterPredicates, FilteredGraph, GraphSnapshot, SnapshotSource,
    collect_snapshot,
};

mod debounce;
mod graph;
mod interaction;
mod physics;
mod present;
mod ui;

pub(crate) use present::{ViewMode, parse_hex_color};

use debounce::Debounced;
use interaction::{Camera, GraphEvent, HoverState};
use physics::SimulationController;
use present::Palette;

/// Startup settings gathered from the command line.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: SnapshotSource,
    pub self_label: String,
    pub accent: Color32,
    pub spacing: f32,
    pub node_scale: f32,
    pub view_mode: ViewMode,
}

type LoadResult = Result<GraphSnapshot, String>;

pub struct KnowledgeAtlasApp {
    config: AppConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    snapshot: GraphSnapshot,
    options: FilterOptions,
    predicates: FilterPredicates,
    filtered: FilteredGraph,
    filter_dirty: bool,
    /// Identity of the filtered graph the running layout was built for.
    layout_identity: Option<u64>,
    controller: SimulationController,
    spacing: Debounced<f32>,
    node_scale: Debounced<f32>,
    view_mode: ViewMode,
    palette: Palette,
    camera: Camera,
    hover: HoverState,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    date_view: Option<NaiveDate>,
    events: Vec<GraphEvent>,
}

struct SearchMatchCache {
    query: String,
    graph_identity: u64,
    matches: Arc<HashSet<usize>>,
}

impl KnowledgeAtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let state = Self::start_load(&config);
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(config: &AppConfig) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let source = config.source.clone();
        let self_label = config.self_label.clone();

        thread::spawn(move || {
            let result =
                collect_snapshot(&source, &self_label).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: &AppConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }
}

impl AppState {
    fn from_load(result: LoadResult, config: &AppConfig) -> Self {
        match result {
            Ok(snapshot) => Self::Ready(Box::new(ViewModel::new(snapshot, config))),
            Err(error) => {
                error!(%error, "knowledge graph load failed");
                Self::Error(error)
            }
        }
    }
}

impl eframe::App for KnowledgeAtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(AppState::from_load(result, &self.config));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.config));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                let source = self.config.source.describe();
                model.show(ctx, &source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.config));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(AppState::from_load(result, &self.config));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
