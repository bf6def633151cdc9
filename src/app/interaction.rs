use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use eframe::egui::{Pos2, Rect, Vec2};
use tracing::warn;

use crate::knowledge::{FilteredGraph, Node, NodeKind};

pub(in crate::app) const ZOOM_RANGE: RangeInclusive<f32> = 0.2..=4.0;
const ZOOM_STEP: f32 = 1.2;
const WHEEL_ZOOM_SENSITIVITY: f32 = 0.0018;

pub(in crate::app) const HOVER_GROWTH: f32 = 1.25;
pub(in crate::app) const DIM_OPACITY: f32 = 0.2;
pub(in crate::app) const TRANSITION_SECS: f32 = 0.2;

/// View transform only; node positions are never touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub(in crate::app) fn world_to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + (world * self.zoom)
    }

    pub(in crate::app) fn screen_to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Zooms by `factor` keeping the world point under `anchor` fixed.
    pub(in crate::app) fn zoom_about(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let world = self.screen_to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end());
        self.pan = anchor - rect.center() - (world * self.zoom);
    }

    pub(in crate::app) fn zoom_wheel(&mut self, rect: Rect, anchor: Pos2, scroll: f32) {
        let factor = (1.0 + (scroll * WHEEL_ZOOM_SENSITIVITY)).clamp(0.85, 1.15);
        self.zoom_about(rect, anchor, factor);
    }

    /// Zooms about the canvas centre.
    fn zoom_centered(&mut self, factor: f32) {
        let previous = self.zoom;
        self.zoom = (self.zoom * factor).clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end());
        self.pan *= self.zoom / previous;
    }

    pub(in crate::app) fn zoom_in(&mut self) {
        self.zoom_centered(ZOOM_STEP);
    }

    pub(in crate::app) fn zoom_out(&mut self) {
        self.zoom_centered(1.0 / ZOOM_STEP);
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Hovered node and its first-degree neighbours in the current filtered graph.
#[derive(Debug, Default)]
pub(in crate::app) struct HoverState {
    index: Option<usize>,
    neighbors: HashSet<usize>,
}

impl HoverState {
    pub(in crate::app) fn index(&self) -> Option<usize> {
        self.index
    }

    pub(in crate::app) fn neighbors(&self) -> &HashSet<usize> {
        &self.neighbors
    }

    pub(in crate::app) fn update(&mut self, hovered: Option<usize>, graph: &FilteredGraph) {
        if hovered == self.index {
            return;
        }
        self.index = hovered;
        self.neighbors = hovered.map(|index| graph.neighbors(index)).unwrap_or_default();
    }

    pub(in crate::app) fn clear(&mut self) {
        self.index = None;
        self.neighbors.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct NodeVisual {
    pub opacity: f32,
    pub radius_factor: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct EdgeVisual {
    pub opacity: f32,
    pub width: f32,
}

/// Target look of node `index`; the view animates toward it.
pub(in crate::app) fn node_visual(index: usize, hover: &HoverState) -> NodeVisual {
    match hover.index() {
        Some(hovered) if hovered == index => NodeVisual {
            opacity: 1.0,
            radius_factor: HOVER_GROWTH,
        },
        Some(_) if !hover.neighbors().contains(&index) => NodeVisual {
            opacity: DIM_OPACITY,
            radius_factor: 1.0,
        },
        _ => NodeVisual {
            opacity: 1.0,
            radius_factor: 1.0,
        },
    }
}

pub(in crate::app) fn edge_visual(edge: (usize, usize), hover: &HoverState) -> EdgeVisual {
    match hover.index() {
        None => EdgeVisual {
            opacity: 0.6,
            width: 1.5,
        },
        Some(hovered) if edge.0 == hovered || edge.1 == hovered => EdgeVisual {
            opacity: 1.0,
            width: 2.5,
        },
        Some(_) => EdgeVisual {
            opacity: 0.1,
            width: 1.0,
        },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum ClickAction {
    /// Structural nodes are not inspectable.
    Ignore,
    OpenDetails { node_id: String },
    NavigateToDate { date: NaiveDate },
}

pub(in crate::app) fn click_action(node: &Node) -> ClickAction {
    match &node.kind {
        NodeKind::Root | NodeKind::Area(_) => ClickAction::Ignore,
        NodeKind::Content(_) => ClickAction::OpenDetails {
            node_id: node.id.clone(),
        },
        NodeKind::Journal(journal) => match journal.date {
            Some(date) => ClickAction::NavigateToDate { date },
            None => {
                warn!(
                    node = %node.id,
                    raw = %journal.raw_date,
                    "journal date unparsable; opening details instead"
                );
                ClickAction::OpenDetails {
                    node_id: node.id.clone(),
                }
            }
        },
    }
}

/// Events the graph canvas reports back to the surrounding application.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum GraphEvent {
    NodeClicked { node_id: String },
    SpacingChanged(f32),
    ScaleChanged(f32),
    NavigateToDate(NaiveDate),
}

impl ClickAction {
    pub(in crate::app) fn into_event(self) -> Option<GraphEvent> {
        match self {
            ClickAction::Ignore => None,
            ClickAction::OpenDetails { node_id } => Some(GraphEvent::NodeClicked { node_id }),
            ClickAction::NavigateToDate { date } => Some(GraphEvent::NavigateToDate(date)),
        }
    }
}

/// Closest circle under `pointer`; `circles` yields `(index, centre, radius)`.
pub(in crate::app) fn hit_test(
    circles: impl IntoIterator<Item = (usize, Pos2, f32)>,
    pointer: Pos2,
) -> Option<usize> {
    circles
        .into_iter()
        .filter_map(|(index, centre, radius)| {
            let distance = centre.distance(pointer);
            (distance <= radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use crate::knowledge::{
        FilterPredicates, JournalData, SnapshotSource, collect_snapshot, filter,
    };

    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    fn demo_graph() -> FilteredGraph {
        let snapshot = collect_snapshot(&SnapshotSource::Demo, "Me").expect("demo snapshot");
        filter(&snapshot, &FilterPredicates::default())
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let rect = canvas();
        let mut camera = Camera::default();
        let anchor = pos2(600.0, 150.0);
        let world = camera.screen_to_world(rect, anchor);

        camera.zoom_about(rect, anchor, 2.0);
        let after = camera.world_to_screen(rect, world);
        assert!((after - anchor).length() < 1e-3);

        let centre_world = camera.screen_to_world(rect, rect.center());
        camera.zoom_in();
        let centre_after = camera.screen_to_world(rect, rect.center());
        assert!((centre_after - centre_world).length() < 1e-3);

        for _ in 0..50 {
            camera.zoom_in();
        }
        assert_eq!(camera.zoom, 4.0);
        for _ in 0..50 {
            camera.zoom_out();
        }
        assert_eq!(camera.zoom, 0.2);

        camera.reset();
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn hover_dims_non_neighbours_only() {
        let graph = demo_graph();
        let matrices = graph.index_of("content-matrices").expect("demo node");
        let vectors = graph.index_of("content-vectors").expect("demo node");
        let cooking = graph.index_of("content-cooking").expect("demo node");

        let mut hover = HoverState::default();
        assert_eq!(node_visual(cooking, &hover).opacity, 1.0);

        hover.update(Some(matrices), &graph);
        assert_eq!(node_visual(matrices, &hover).radius_factor, HOVER_GROWTH);
        assert_eq!(node_visual(vectors, &hover).opacity, 1.0);
        assert_eq!(node_visual(cooking, &hover).opacity, DIM_OPACITY);
        assert!(
            edge_visual((vectors, matrices), &hover).width
                > edge_visual((0, cooking), &hover).width
        );

        hover.clear();
        assert_eq!(node_visual(cooking, &hover).opacity, 1.0);
    }

    #[test]
    fn click_routes_by_node_kind() {
        let graph = demo_graph();
        let root = graph.node("self").expect("root");
        assert_eq!(click_action(&root.node), ClickAction::Ignore);

        let area = graph.node("area-math").expect("area");
        assert_eq!(click_action(&area.node), ClickAction::Ignore);

        let content = graph.node("content-eigen").expect("content");
        assert_eq!(
            click_action(&content.node),
            ClickAction::OpenDetails {
                node_id: "content-eigen".to_owned()
            }
        );

        let journal = graph.node("journal-2025-03-02").expect("journal");
        let expected = NaiveDate::from_ymd_opt(2025, 3, 2).expect("valid date");
        assert_eq!(
            click_action(&journal.node),
            ClickAction::NavigateToDate { date: expected }
        );
        assert_eq!(
            click_action(&journal.node).into_event(),
            Some(GraphEvent::NavigateToDate(expected))
        );
    }

    #[test]
    fn unparsable_journal_date_opens_details() {
        let node = Node {
            id: "journal-x".to_owned(),
            label: "someday".to_owned(),
            kind: NodeKind::Journal(JournalData {
                entry_id: "x".to_owned(),
                date: None,
                raw_date: "someday".to_owned(),
                is_complete: false,
                area: None,
            }),
        };
        assert_eq!(
            click_action(&node),
            ClickAction::OpenDetails {
                node_id: "journal-x".to_owned()
            }
        );
    }

    #[test]
    fn hit_test_prefers_closest_circle() {
        let circles = [
            (0, pos2(0.0, 0.0), 20.0),
            (1, pos2(10.0, 0.0), 20.0),
            (2, pos2(100.0, 0.0), 5.0),
        ];
        assert_eq!(hit_test(circles, pos2(8.0, 0.0)), Some(1));
        assert_eq!(hit_test(circles, pos2(60.0, 0.0)), None);
    }
}
