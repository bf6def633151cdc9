use eframe::egui::Rect;
use tracing::debug;

use crate::knowledge::{FilterPredicates, filter};

use super::super::ViewModel;
use super::super::interaction::GraphEvent;

impl ViewModel {
    pub(in crate::app) fn set_predicates(&mut self, predicates: FilterPredicates) {
        if self.predicates == predicates {
            return;
        }
        self.predicates = predicates;
        self.filter_dirty = true;
    }

    /// Re-runs the filter after a predicate change. The layout itself is
    /// rebuilt later, once the canvas size is known.
    pub(in crate::app) fn refresh_filter(&mut self) {
        if !self.filter_dirty {
            return;
        }
        self.filter_dirty = false;

        self.filtered = filter(&self.snapshot, &self.predicates);
        self.hover.clear();
        self.search_match_cache = None;
        debug!(
            nodes = self.filtered.nodes.len(),
            edges = self.filtered.edges.len(),
            max_distance = self.filtered.max_distance,
            "filter applied"
        );
    }

    /// Applies a spacing edit to the running layout at once. The debounced
    /// value only commits once the slider has been quiet.
    pub(in crate::app) fn adjust_spacing(&mut self, spacing: f32, now: f64) {
        self.spacing.set(spacing, now);
        self.controller.set_link_distance(*self.spacing.display());
    }

    pub(in crate::app) fn adjust_node_scale(&mut self, scale: f32, now: f64) {
        self.node_scale.set(scale, now);
        self.controller.set_node_scale(*self.node_scale.display());
    }

    /// Reports slider values that have settled past the debounce window.
    pub(in crate::app) fn commit_layout_params(&mut self, now: f64) {
        if self.spacing.poll(now) {
            let spacing = *self.spacing.committed();
            self.events.push(GraphEvent::SpacingChanged(spacing));
        }
        if self.node_scale.poll(now) {
            let scale = *self.node_scale.committed();
            self.events.push(GraphEvent::ScaleChanged(scale));
        }
    }

    /// Rebuilds the layout when the filtered node or edge set changed.
    ///
    /// Deferred while the canvas has no area.
    pub(in crate::app) fn sync_layout(&mut self, rect: Rect, now: f64) {
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }

        let identity = self.filtered.identity();
        if self.layout_identity == Some(identity) {
            return;
        }

        self.layout_identity = Some(identity);
        if !self.controller.rebuild(&self.filtered, now) {
            debug!("filtered graph is empty; layout left stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, Rect, Vec2, vec2};

    use crate::app::ViewModel;
    use crate::app::interaction::GraphEvent;
    use crate::knowledge::FilterPredicates;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    fn positions(model: &ViewModel) -> Vec<Vec2> {
        (0..model.filtered.nodes.len())
            .filter_map(|index| model.controller.position(index))
            .collect()
    }

    #[test]
    fn zero_sized_canvas_defers_the_first_build() {
        let mut model = ViewModel::demo();

        model.sync_layout(Rect::from_min_size(Pos2::ZERO, Vec2::ZERO), 0.0);
        assert_eq!(model.controller.generation(), 0);
        assert!(model.controller.simulation().is_none());

        model.sync_layout(canvas(), 0.1);
        assert_eq!(model.controller.generation(), 1);
        assert!(model.controller.simulation().is_some());
    }

    #[test]
    fn predicate_change_rebuilds_only_when_the_graph_changes() {
        let mut model = ViewModel::demo();
        model.sync_layout(canvas(), 0.0);
        assert_eq!(model.controller.generation(), 1);

        model.set_predicates(FilterPredicates::default());
        model.refresh_filter();
        model.sync_layout(canvas(), 0.1);
        assert_eq!(model.controller.generation(), 1);

        let math = FilterPredicates {
            area: Some("Mathematics".to_owned()),
            ..FilterPredicates::default()
        };
        model.set_predicates(math.clone());
        model.refresh_filter();
        model.sync_layout(canvas(), 0.2);
        assert_eq!(model.controller.generation(), 2);
        assert!(model.filtered.index_of("area-history").is_none());

        model.set_predicates(math);
        model.refresh_filter();
        model.sync_layout(canvas(), 0.3);
        assert_eq!(model.controller.generation(), 2);
    }

    #[test]
    fn slider_edits_reach_the_running_layout_before_commit() {
        let mut model = ViewModel::demo();
        model.sync_layout(canvas(), 0.0);
        let root = model.filtered.index_of("self").expect("root node");

        model.adjust_spacing(200.0, 1.0);
        model.adjust_node_scale(2.0, 1.0);
        model.commit_layout_params(1.016);

        let simulation = model.controller.simulation().expect("running layout");
        assert_eq!(simulation.params().link_distance, 200.0);
        assert_eq!(simulation.params().node_scale, 2.0);
        assert_eq!(simulation.rendered_radius(root), 60.0);
        assert!(model.events.is_empty());

        model.commit_layout_params(1.4);
        assert_eq!(
            model.events,
            vec![
                GraphEvent::SpacingChanged(200.0),
                GraphEvent::ScaleChanged(2.0)
            ]
        );
    }

    #[test]
    fn parameter_change_keeps_generation_and_positions() {
        let mut model = ViewModel::demo();
        model.sync_layout(canvas(), 0.0);
        while model.controller.tick() {}
        let before = positions(&model);

        model.adjust_spacing(150.0, 1.0);
        model.commit_layout_params(2.0);
        model.refresh_filter();
        model.sync_layout(canvas(), 2.0);

        assert_eq!(model.controller.generation(), 1);
        assert_eq!(positions(&model), before);
        assert_eq!(model.controller.params().link_distance, 150.0);
    }
}
