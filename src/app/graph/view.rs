use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::knowledge::{EdgeKind, NodeKind};
use crate::util::canvas_label;

use super::super::interaction::{
    TRANSITION_SECS, edge_visual, hit_test, node_visual,
};
use super::super::present::{blend_color, color_for, label_offset};
use super::super::{SearchMatchCache, ViewModel};

const ARROW_LENGTH: f32 = 9.0;
const ARROW_HALF_WIDTH: f32 = 4.0;
const EDGE_GREY: Color32 = Color32::from_rgb(148, 156, 170);
const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

fn draw_arrowhead(painter: &Painter, tip: Pos2, direction: Vec2, color: Color32, zoom: f32) {
    let length = ARROW_LENGTH * zoom.sqrt();
    let half_width = ARROW_HALF_WIDTH * zoom.sqrt();
    let back = tip - (direction * length);
    let normal = vec2(-direction.y, direction.x) * half_width;
    painter.add(Shape::convex_polygon(
        vec![tip, back + normal, back - normal],
        color,
        Stroke::NONE,
    ));
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let identity = self.filtered.identity();
        if let Some(cached) = &self.search_match_cache
            && cached.graph_identity == identity
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .filtered
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| fuzzy_match_score(&matcher, &node.node.label, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_identity: identity,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn handle_canvas_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
        self.camera.zoom_wheel(rect, pointer, scroll);
    }

    /// World radius of node `index` before hover growth.
    fn world_radius(&self, index: usize) -> f32 {
        self.controller
            .simulation()
            .map_or(0.0, |simulation| simulation.rendered_radius(index))
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let ctx = ui.ctx().clone();
        let now = ctx.input(|input| input.time);

        draw_background(&painter, rect, self.camera.pan, self.camera.zoom);
        self.sync_layout(rect, now);
        self.handle_canvas_zoom(ui, rect, &response);

        if self.filtered.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes match the current filters.",
                FontId::proportional(16.0),
                Color32::from_gray(200),
            );
            return;
        }

        if self.controller.tick() {
            ctx.request_repaint();
        }

        let node_count = self.filtered.nodes.len();
        let camera = self.camera;
        let scale = self.controller.params().node_scale;
        let screen_positions = (0..node_count)
            .map(|index| {
                let world = self.controller.position(index).unwrap_or(Vec2::ZERO);
                camera.world_to_screen(rect, world)
            })
            .collect::<Vec<_>>();
        let world_radii = (0..node_count)
            .map(|index| self.world_radius(index))
            .collect::<Vec<_>>();

        let pointer = response.hover_pos();
        let hovered = pointer.and_then(|pointer| {
            hit_test(
                (0..node_count).map(|index| {
                    (index, screen_positions[index], world_radii[index] * camera.zoom)
                }),
                pointer,
            )
        });

        if response.drag_started_by(egui::PointerButton::Primary)
            && let (Some(index), Some(pointer)) = (hovered, pointer)
        {
            self.controller
                .drag_start(index, camera.screen_to_world(rect, pointer));
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            match (self.controller.dragging(), pointer) {
                (Some(_), Some(pointer)) => {
                    self.controller.drag_to(camera.screen_to_world(rect, pointer));
                }
                (Some(_), None) => {}
                (None, _) => self.camera.pan += response.drag_delta(),
            }
            ctx.request_repaint();
        }
        if response.drag_stopped() {
            self.controller.drag_end();
        }

        let focus = self.controller.dragging().or(hovered);
        self.hover.update(focus, &self.filtered);
        if focus.is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(index) = hovered
        {
            self.activate_node(index);
        }

        let fade = self.controller.fade_opacity(now);
        if fade < 1.0 {
            ctx.request_repaint();
        }
        let search_matches = self.cached_search_matches();
        let zoom_sqrt = camera.zoom.sqrt();

        for (edge_index, (edge, (source, target))) in self
            .filtered
            .edges
            .iter()
            .zip(self.filtered.edge_indices())
            .enumerate()
        {
            let visual = edge_visual((source, target), &self.hover);
            let opacity = ctx.animate_value_with_time(
                egui::Id::new(("edge-opacity", edge_index, &edge.source, &edge.target)),
                visual.opacity,
                TRANSITION_SECS,
            );
            let width = ctx.animate_value_with_time(
                egui::Id::new(("edge-width", edge_index, &edge.source, &edge.target)),
                visual.width,
                TRANSITION_SECS,
            );

            let start = screen_positions[source];
            let end = screen_positions[target];
            let delta = end - start;
            let length = delta.length();
            if length <= f32::EPSILON {
                continue;
            }
            let direction = delta / length;
            let tip = end - direction * (world_radii[target] * camera.zoom);
            let color = EDGE_GREY.gamma_multiply(opacity * fade);
            let stroke = Stroke::new((width * zoom_sqrt).clamp(0.5, 4.0), color);

            match edge.kind {
                EdgeKind::Mention => {
                    painter.extend(Shape::dashed_line(&[start, tip], stroke, 6.0, 4.0));
                }
                EdgeKind::Prerequisite | EdgeKind::Related => {
                    painter.line_segment([start, tip], stroke);
                }
            }
            if edge.kind == EdgeKind::Prerequisite || edge.kind == EdgeKind::Mention {
                draw_arrowhead(&painter, tip, direction, color, camera.zoom);
            }
        }

        let mut animating = false;
        for (index, filtered_node) in self.filtered.nodes.iter().enumerate() {
            let node = &filtered_node.node;
            let visual = node_visual(index, &self.hover);
            let opacity = ctx.animate_value_with_time(
                egui::Id::new(("node-opacity", node.id.as_str())),
                visual.opacity,
                TRANSITION_SECS,
            );
            let growth = ctx.animate_value_with_time(
                egui::Id::new(("node-growth", node.id.as_str())),
                visual.radius_factor,
                TRANSITION_SECS,
            );
            animating |= (opacity - visual.opacity).abs() > 1e-3
                || (growth - visual.radius_factor).abs() > 1e-3;

            let position = screen_positions[index];
            let world_radius = world_radii[index] * growth;
            let radius = world_radius * camera.zoom;
            let alpha = opacity * fade;

            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));
            let mut fill = color_for(
                node,
                self.view_mode,
                filtered_node.distance_from_root,
                &self.palette,
            );
            if is_match {
                fill = blend_color(fill, SEARCH_COLOR, 0.45);
            }

            painter.circle_filled(position, radius, fill.gamma_multiply(alpha));
            let outline = if is_selected {
                Stroke::new(2.5, SELECTED_COLOR.gamma_multiply(alpha))
            } else if is_match {
                Stroke::new(2.0, SEARCH_COLOR.gamma_multiply(alpha))
            } else {
                Stroke::new(1.0, Color32::from_black_alpha((190.0 * alpha) as u8))
            };
            painter.circle_stroke(position, radius, outline);

            let offset = label_offset(world_radius, scale) * camera.zoom;
            let label_color = if is_match {
                SEARCH_COLOR
            } else {
                Color32::from_gray(236)
            };
            let label = match &node.kind {
                NodeKind::Area(area) if !area.icon.is_empty() => {
                    canvas_label(&format!("{} {}", area.icon, node.label))
                }
                _ => canvas_label(&node.label),
            };
            painter.text(
                position + vec2(0.0, offset),
                Align2::CENTER_TOP,
                label,
                FontId::proportional((12.0 * zoom_sqrt).clamp(9.0, 18.0)),
                label_color.gamma_multiply(alpha),
            );
        }

        if animating {
            ctx.request_repaint();
        }

        if let Some(index) = hovered
            && let Some(hovered_node) = self.filtered.nodes.get(index)
        {
            let distance = if hovered_node.reachable {
                hovered_node.distance_from_root.to_string()
            } else {
                "unreachable".to_owned()
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  connections {}  |  distance {}",
                    hovered_node.node.label,
                    hovered_node.node.kind_label(),
                    hovered_node.connection_count,
                    distance
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
