use eframe::egui::Vec2;
use tracing::debug;

use crate::knowledge::FilteredGraph;

use super::super::present::radius_for;
use super::{DRAG_ALPHA_TARGET, LayoutParams, NUDGE_ALPHA, Simulation};

const FADE_IN_SECS: f64 = 0.6;

/// Sole owner of the running layout simulation.
///
/// Every rebuild stops the previous simulation first, so at most one
/// simulation ever advances. UI code only talks to this type.
pub(in crate::app) struct SimulationController {
    simulation: Option<Simulation>,
    params: LayoutParams,
    generation: u64,
    first_build_at: Option<f64>,
    dragging: Option<usize>,
}

impl SimulationController {
    pub(in crate::app) fn new(params: LayoutParams) -> Self {
        Self {
            simulation: None,
            params: params.clamped(),
            generation: 0,
            first_build_at: None,
            dragging: None,
        }
    }

    /// Tears down the current simulation and starts a fresh one for `graph`.
    ///
    /// Returns `false` without starting anything when the graph is empty.
    pub(in crate::app) fn rebuild(&mut self, graph: &FilteredGraph, now: f64) -> bool {
        self.stop();
        if graph.is_empty() {
            return false;
        }

        let seeds = graph
            .nodes
            .iter()
            .map(|node| {
                (
                    node.node.id.as_str(),
                    radius_for(&node.node, node.connection_count, 1.0),
                )
            })
            .collect::<Vec<_>>();
        let links = graph.edge_indices();

        self.simulation = Some(Simulation::new(&seeds, &links, self.params));
        self.generation += 1;
        self.first_build_at.get_or_insert(now);
        debug!(
            generation = self.generation,
            nodes = seeds.len(),
            links = links.len(),
            "layout simulation started"
        );
        true
    }

    pub(in crate::app) fn stop(&mut self) {
        if self.simulation.take().is_some() {
            self.dragging = None;
            debug!(generation = self.generation, "layout simulation stopped");
        }
    }

    pub(in crate::app) fn generation(&self) -> u64 {
        self.generation
    }

    pub(in crate::app) fn params(&self) -> LayoutParams {
        self.params
    }

    pub(in crate::app) fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        self.simulation
            .as_ref()
            .and_then(|simulation| simulation.nodes().get(index))
            .map(|node| node.position)
    }

    pub(in crate::app) fn set_link_distance(&mut self, distance: f32) {
        self.reconfigure(LayoutParams {
            link_distance: distance,
            ..self.params
        });
    }

    pub(in crate::app) fn set_node_scale(&mut self, scale: f32) {
        self.reconfigure(LayoutParams {
            node_scale: scale,
            ..self.params
        });
    }

    /// Applies new force parameters to the running simulation in place and
    /// nudges it so nodes glide toward the new equilibrium.
    pub(in crate::app) fn reconfigure(&mut self, params: LayoutParams) {
        let params = params.clamped();
        if params == self.params {
            return;
        }

        self.params = params;
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_params(params);
            simulation.nudge(NUDGE_ALPHA);
        }
    }

    pub(in crate::app) fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub(in crate::app) fn drag_start(&mut self, index: usize, world: Vec2) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        if index >= simulation.nodes().len() {
            return;
        }

        if let Some(previous) = self.dragging.replace(index) {
            simulation.release(previous);
        }
        simulation.pin(index, world);
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
    }

    pub(in crate::app) fn drag_to(&mut self, world: Vec2) {
        if let (Some(index), Some(simulation)) = (self.dragging, self.simulation.as_mut()) {
            simulation.pin(index, world);
        }
    }

    pub(in crate::app) fn drag_end(&mut self) {
        let Some(index) = self.dragging.take() else {
            return;
        };
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.release(index);
            simulation.set_alpha_target(0.0);
        }
    }

    /// One animation frame. Returns whether anything moved.
    pub(in crate::app) fn tick(&mut self) -> bool {
        self.simulation.as_mut().is_some_and(Simulation::tick)
    }

    /// Opacity of the canvas; only the very first build fades in.
    pub(in crate::app) fn fade_opacity(&self, now: f64) -> f32 {
        match self.first_build_at {
            Some(started) => ((now - started) / FADE_IN_SECS).clamp(0.0, 1.0) as f32,
            None => 0.0,
        }
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use crate::knowledge::{FilterPredicates, GraphSnapshot, Node, NodeKind, filter};

    use super::super::{COLLISION_PADDING, PinState};
    use super::*;

    fn params() -> LayoutParams {
        LayoutParams {
            link_distance: 90.0,
            node_scale: 1.0,
        }
    }

    fn snapshot() -> GraphSnapshot {
        crate::knowledge::collect_snapshot(&crate::knowledge::SnapshotSource::Demo, "Me")
            .expect("demo snapshot")
    }

    #[test]
    fn rebuild_replaces_previous_simulation() {
        let graph = filter(&snapshot(), &FilterPredicates::default());
        let mut controller = SimulationController::new(params());

        assert!(controller.rebuild(&graph, 0.0));
        assert_eq!(controller.generation(), 1);
        assert!(controller.rebuild(&graph, 1.0));
        assert_eq!(controller.generation(), 2);
        assert!(controller.simulation().is_some());

        controller.stop();
        assert!(controller.simulation().is_none());
        assert!(!controller.tick());
    }

    #[test]
    fn empty_graph_never_starts() {
        let mut controller = SimulationController::new(params());
        assert!(!controller.rebuild(&FilteredGraph::default(), 0.0));
        assert!(controller.simulation().is_none());
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn only_first_build_fades_in() {
        let graph = filter(&snapshot(), &FilterPredicates::default());
        let mut controller = SimulationController::new(params());
        assert_eq!(controller.fade_opacity(0.0), 0.0);

        controller.rebuild(&graph, 10.0);
        assert_eq!(controller.fade_opacity(10.0), 0.0);
        assert!((controller.fade_opacity(10.3) - 0.5).abs() < 1e-3);

        controller.rebuild(&graph, 20.0);
        assert_eq!(controller.fade_opacity(20.0), 1.0);
    }

    #[test]
    fn live_parameter_change_keeps_positions_and_reheats() {
        let graph = filter(&snapshot(), &FilterPredicates::default());
        let mut controller = SimulationController::new(params());
        controller.rebuild(&graph, 0.0);
        while controller.tick() {}

        let before = (0..graph.nodes.len())
            .filter_map(|index| controller.position(index))
            .collect::<Vec<_>>();
        controller.set_link_distance(150.0);
        controller.set_node_scale(1.5);
        let after = (0..graph.nodes.len())
            .filter_map(|index| controller.position(index))
            .collect::<Vec<_>>();

        assert_eq!(before, after);
        assert_eq!(controller.generation(), 1);
        let simulation = controller.simulation().expect("running");
        assert!(simulation.alpha() >= super::super::NUDGE_ALPHA);
        assert_eq!(simulation.params().link_distance, 150.0);
        assert_eq!(simulation.params().node_scale, 1.5);
    }

    #[test]
    fn scale_two_collision_radius_for_three_connection_content() {
        let node = Node {
            id: "content-x".to_owned(),
            label: "X".to_owned(),
            kind: NodeKind::Content(crate::knowledge::ContentData {
                item_id: "x".to_owned(),
                status: crate::knowledge::Status::Pending,
                area: None,
                level: None,
                parent_id: None,
            }),
        };
        let base = radius_for(&node, 3, 1.0);
        assert_eq!(base, 20.0);
        assert_eq!(radius_for(&node, 3, 2.0), 40.0);

        let mut simulation = Simulation::new(&[(node.id.as_str(), base)], &[], params());
        simulation.set_params(LayoutParams {
            node_scale: 2.0,
            ..params()
        });
        assert_eq!(simulation.rendered_radius(0), 40.0);
        assert_eq!(simulation.collision_radius(0), 40.0 + COLLISION_PADDING);
        assert_eq!(simulation.collision_radius(0), 60.0);
    }

    #[test]
    fn drag_moves_only_positions() {
        let graph = filter(&snapshot(), &FilterPredicates::default());
        let logical_before = graph.nodes.clone();
        let mut controller = SimulationController::new(params());
        controller.rebuild(&graph, 0.0);

        let dragged = graph.index_of("content-matrices").expect("demo node");
        controller.drag_start(dragged, vec2(300.0, 200.0));
        assert_eq!(controller.dragging(), Some(dragged));
        assert_eq!(
            controller.simulation().map(Simulation::alpha_target),
            Some(DRAG_ALPHA_TARGET)
        );
        let radii_before = controller
            .simulation()
            .expect("running")
            .nodes()
            .iter()
            .map(|node| node.base_radius)
            .collect::<Vec<_>>();
        for step in 0..20 {
            controller.drag_to(vec2(300.0 + step as f32, 200.0));
            controller.tick();
        }
        assert_eq!(controller.position(dragged), Some(vec2(319.0, 200.0)));

        let simulation = controller.simulation().expect("running");
        for (index, node) in simulation.nodes().iter().enumerate() {
            if index == dragged {
                assert_eq!(
                    node.pin,
                    PinState::Dragging {
                        pin: vec2(319.0, 200.0)
                    }
                );
            } else {
                assert_eq!(node.pin, PinState::Free, "node {index} was pinned");
            }
            assert_eq!(node.base_radius, radii_before[index]);
        }

        controller.drag_end();
        assert_eq!(controller.dragging(), None);
        let simulation = controller.simulation().expect("running");
        assert_eq!(simulation.alpha_target(), 0.0);
        assert!(matches!(
            simulation.nodes()[dragged].pin,
            PinState::Released { .. }
        ));
        assert!(
            simulation
                .nodes()
                .iter()
                .enumerate()
                .all(|(index, node)| index == dragged || node.pin == PinState::Free)
        );

        // The filtered graph is only borrowed by `rebuild`; layout state lives
        // in the simulation alone.
        assert_eq!(graph.nodes, logical_before);
    }
}
