use egui::{pos2, vec2, Align2, Pos2, Rect, Response, Sense, Stroke, TextStyle, Ui};

use crate::cells::CellId;
use crate::chart::SharedHover;
use crate::edges::EdgeDirection;
use crate::graph::GraphEdge;
use crate::graph::GraphElements;
use crate::selection::{GraphSelection, SelectOutcome, SelectionController};
use crate::themes;
use crate::themes::CellGraphStyle;

const CANVAS_PADDING: f32 = 12.0;
const SIDE_EDGE_OFFSET: f32 = 14.0;
const NODE_STRIPE: f32 = 4.0;

pub struct DependencyGraphResponse {
    pub response: Response,
    /// Set when a click changed or reactivated the selection this frame.
    pub outcome: Option<SelectOutcome>,
    pub hovered: Option<CellId>,
}

/// Paints laid-out [`GraphElements`] and turns clicks into selections.
#[must_use = "You should call `.show(ui)`"]
pub struct DependencyGraph<'a> {
    elements: &'a GraphElements,
    selection: &'a mut SelectionController,
    hover: Option<&'a SharedHover>,
    style: Option<CellGraphStyle>,
    edge_width: f32,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(elements: &'a GraphElements, selection: &'a mut SelectionController) -> Self {
        Self {
            elements,
            selection,
            hover: None,
            style: None,
            edge_width: 1.5,
        }
    }

    /// Publish the hovered node and highlight nodes hovered elsewhere.
    pub fn hover(mut self, hover: &'a SharedHover) -> Self {
        self.hover = Some(hover);
        self
    }

    pub fn edge_width(mut self, width: f32) -> Self {
        self.edge_width = width.max(0.5);
        self
    }

    pub fn show(self, ui: &mut Ui) -> DependencyGraphResponse {
        let _span = tracing::info_span!(
            "cellgraph_paint",
            nodes = self.elements.nodes.len(),
            edges = self.elements.edges.len()
        )
        .entered();
        let DependencyGraph {
            elements,
            selection,
            hover,
            style,
            edge_width,
        } = self;
        let style = style.unwrap_or_else(|| CellGraphStyle::from(ui.style().as_ref()));

        let bounds = elements.bounds();
        let content = if bounds.is_positive() {
            bounds.size()
        } else {
            egui::Vec2::ZERO
        };
        let desired = content + vec2(CANVAS_PADDING + SIDE_EDGE_OFFSET, CANVAS_PADDING) * 2.0;
        let (rect, response) = ui.allocate_exact_size(
            vec2(desired.x.max(ui.available_width()), desired.y),
            Sense::click(),
        );
        if !ui.is_rect_visible(rect) || elements.nodes.is_empty() {
            super::publish_hover(ui, response.id, hover, None);
            return DependencyGraphResponse {
                response,
                outcome: None,
                hovered: None,
            };
        }

        let offset_x = (rect.width() - content.x).max(0.0) * 0.5;
        let origin = pos2(rect.left() + offset_x, rect.top() + CANVAS_PADDING);
        let translate = origin - bounds.min;
        let node_rects: Vec<Rect> = elements
            .nodes
            .iter()
            .map(|node| node.rect().translate(translate))
            .collect();
        let node_rect = |id: &CellId| -> Option<Rect> {
            elements
                .nodes
                .iter()
                .position(|node| &node.id == id)
                .map(|idx| node_rects[idx])
        };

        let routes: Vec<Vec<Pos2>> = elements
            .edges
            .iter()
            .map(|edge| match (node_rect(&edge.source), node_rect(&edge.target)) {
                (Some(from), Some(to)) => route_edge(edge, from, to),
                _ => Vec::new(),
            })
            .collect();

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pos| rect.contains(*pos));
        let hovered_node = pointer.and_then(|pos| node_rects.iter().position(|r| r.contains(pos)));
        let hover_threshold = (edge_width * 3.0).max(5.0);
        let hovered_edge = if hovered_node.is_some() {
            None
        } else {
            pointer.and_then(|pos| {
                let mut best = hover_threshold * hover_threshold;
                let mut hovered = None;
                for (idx, points) in routes.iter().enumerate() {
                    let dist = distance_sq_to_polyline(pos, points);
                    if dist <= best {
                        best = dist;
                        hovered = Some(idx);
                    }
                }
                hovered
            })
        };

        let mut outcome = None;
        if response.clicked() {
            let target = match (hovered_node, hovered_edge) {
                (Some(idx), _) => GraphSelection::Node(elements.nodes[idx].id.clone()),
                (None, Some(idx)) => {
                    let edge = &elements.edges[idx];
                    GraphSelection::edge(edge.source.clone(), edge.target.clone())
                }
                (None, None) => GraphSelection::None,
            };
            log::debug!("graph click selects {target:?}");
            outcome = Some(selection.select(target, elements));
            ui.ctx().request_repaint();
        }
        if ui.input(|input| input.key_pressed(egui::Key::Escape)) {
            selection.clear_selection();
        }

        let hovered_cell = hovered_node.map(|idx| elements.nodes[idx].id.clone());
        super::publish_hover(ui, response.id, hover, hovered_cell.clone());

        let painter = ui.painter().with_clip_rect(rect);
        let focus = hovered_cell
            .clone()
            .or_else(|| hover.and_then(|hover| hover.get().cell().cloned()));
        let selected_node = match selection.selection() {
            GraphSelection::Node(id) => Some(id.clone()),
            _ => None,
        };
        let emphasis_active =
            focus.is_some() || hovered_edge.is_some() || !selection.selection().is_none();

        let mut active_routes = Vec::new();
        for (idx, (edge, points)) in elements.edges.iter().zip(&routes).enumerate() {
            let touches = |cell: &Option<CellId>| {
                cell.as_ref()
                    .is_some_and(|cell| &edge.source == cell || &edge.target == cell)
            };
            let is_active = hovered_edge == Some(idx)
                || selection.is_edge_selected(&edge.source, &edge.target)
                || touches(&focus)
                || touches(&selected_node);
            if is_active {
                active_routes.push(idx);
                continue;
            }
            let color = if emphasis_active {
                themes::blend(style.edge, style.background, 0.5)
            } else {
                style.edge
            };
            paint_edge(&painter, edge, points, Stroke::new(edge_width * edge.stroke_width, color));
        }
        for idx in active_routes {
            let edge = &elements.edges[idx];
            let stroke = Stroke::new(edge_width * edge.stroke_width.max(1.0) + 0.5, style.accent);
            paint_edge(&painter, edge, &routes[idx], stroke);
        }

        let font_id = TextStyle::Small.resolve(ui.style());
        for (node, &node_rect) in elements.nodes.iter().zip(&node_rects) {
            let is_selected = selection.is_node_selected(&node.id);
            let is_focused = focus.as_ref() == Some(&node.id);
            painter.rect_filled(node_rect, style.rounding, style.node_fill);
            let stripe = Rect::from_min_size(node_rect.min, vec2(NODE_STRIPE, node_rect.height()));
            painter.rect_filled(stripe, 0.0, themes::cell_color(node.id.as_str()));
            let outline = if is_selected || is_focused {
                style.highlight_stroke()
            } else {
                Stroke::new(1.0, style.outline)
            };
            painter.rect_stroke(node_rect, style.rounding, outline, egui::StrokeKind::Inside);

            let label = node_label(node.id.as_str(), node.cell.as_ref().map(|cell| cell.code()));
            painter.with_clip_rect(node_rect.shrink(2.0)).text(
                node_rect.left_top() + vec2(NODE_STRIPE + 4.0, 4.0),
                Align2::LEFT_TOP,
                label,
                font_id.clone(),
                style.ink,
            );
        }

        DependencyGraphResponse {
            response,
            outcome,
            hovered: hovered_cell,
        }
    }
}

impl crate::themes::Styled for DependencyGraph<'_> {
    type Style = CellGraphStyle;

    fn styled(mut self, style: Self::Style) -> Self {
        self.style = Some(style);
        self
    }
}

/// First non-blank line of the cell, or its id.
fn node_label(id: &str, code: Option<String>) -> String {
    code.as_deref()
        .and_then(|code| code.lines().map(str::trim).find(|line| !line.is_empty()))
        .map(str::to_owned)
        .unwrap_or_else(|| id.to_owned())
}

/// Minimap edges run in the gutters (inputs left, outputs right), tree
/// edges leave the bottom of the source and enter the top of the target.
fn route_edge(edge: &GraphEdge, from: Rect, to: Rect) -> Vec<Pos2> {
    match edge.direction {
        Some(EdgeDirection::Inputs) => {
            let x = from.left().min(to.left()) - SIDE_EDGE_OFFSET;
            vec![
                from.left_center(),
                pos2(x, from.center().y),
                pos2(x, to.center().y),
                to.left_center(),
            ]
        }
        Some(EdgeDirection::Outputs) => {
            let x = from.right().max(to.right()) + SIDE_EDGE_OFFSET;
            vec![
                from.right_center(),
                pos2(x, from.center().y),
                pos2(x, to.center().y),
                to.right_center(),
            ]
        }
        None if from.bottom() <= to.top() => {
            let mid = (from.bottom() + to.top()) * 0.5;
            vec![
                from.center_bottom(),
                pos2(from.center().x, mid),
                pos2(to.center().x, mid),
                to.center_top(),
            ]
        }
        None => {
            let mid = (from.right() + to.left()) * 0.5;
            vec![
                from.right_center(),
                pos2(mid, from.center().y),
                pos2(mid, to.center().y),
                to.left_center(),
            ]
        }
    }
}

fn paint_edge(painter: &egui::Painter, edge: &GraphEdge, points: &[Pos2], stroke: Stroke) {
    if points.len() < 2 {
        return;
    }
    if edge.animated {
        let time = painter.ctx().input(|input| input.time) as f32;
        painter.extend(egui::Shape::dashed_line_with_offset(
            points,
            stroke,
            &[6.0],
            &[4.0],
            (time * 12.0) % 10.0,
        ));
        painter.ctx().request_repaint();
    } else {
        painter.add(egui::Shape::line(points.to_vec(), stroke));
    }
    if let Some(&end) = points.last() {
        painter.circle_filled(end, stroke.width + 1.0, stroke.color);
    }
}

fn distance_sq_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let denom = ab.length_sq();
    if denom <= f32::EPSILON {
        return point.distance_sq(a);
    }
    let t = ((point - a).dot(ab) / denom).clamp(0.0, 1.0);
    point.distance_sq(a + ab * t)
}

fn distance_sq_to_polyline(point: Pos2, points: &[Pos2]) -> f32 {
    points
        .windows(2)
        .map(|seg| distance_sq_to_segment(point, seg[0], seg[1]))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_prefer_code() {
        assert_eq!(node_label("a", Some("\n  x = 1\ny".into())), "x = 1");
        assert_eq!(node_label("a", Some("   ".into())), "a");
        assert_eq!(node_label("a", None), "a");
    }

    #[test]
    fn tree_edges_route_downwards() {
        let edge = GraphEdge::new("a".into(), "b".into(), None);
        let from = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 40.0));
        let to = Rect::from_min_size(pos2(0.0, 100.0), vec2(100.0, 40.0));

        let points = route_edge(&edge, from, to);

        assert_eq!(points.first(), Some(&pos2(50.0, 40.0)));
        assert_eq!(points.last(), Some(&pos2(50.0, 100.0)));
    }

    #[test]
    fn polyline_distance() {
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        assert_eq!(distance_sq_to_polyline(pos2(5.0, 2.0), &points), 4.0);
        assert_eq!(distance_sq_to_polyline(pos2(0.0, 0.0), &[]), f32::INFINITY);
    }
}
