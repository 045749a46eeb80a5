use egui::{
    pos2, vec2, Align2, Rect, Response, RichText, Sense, Stroke, TextStyle, Ui, Widget,
};

use crate::cells::CellId;
use crate::chart::{format_chart_time, format_elapsed_time, ChartValues, SharedHover};
use crate::themes;
use crate::themes::CellGraphStyle;

/// Gantt-style chart of one run plus a textual row list. Hovering either
/// highlights the same cell in both.
#[must_use = "You should put this widget in a ui with `ui.add(widget);`"]
pub struct RunTimeline<'a> {
    rows: &'a [ChartValues],
    hover: &'a SharedHover,
    row_height: f32,
    show_list: bool,
    style: Option<CellGraphStyle>,
}

impl<'a> RunTimeline<'a> {
    pub fn new(rows: &'a [ChartValues], hover: &'a SharedHover) -> Self {
        Self {
            rows,
            hover,
            row_height: 16.0,
            show_list: true,
            style: None,
        }
    }

    pub fn row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height.max(8.0);
        self
    }

    pub fn show_list(mut self, show_list: bool) -> Self {
        self.show_list = show_list;
        self
    }
}

impl Widget for RunTimeline<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let RunTimeline {
            rows,
            hover,
            row_height,
            show_list,
            style,
        } = self;
        let style = style.unwrap_or_else(|| CellGraphStyle::from(ui.style().as_ref()));

        ui.vertical(|ui| {
            let (chart, chart_hovered) = paint_chart(ui, rows, hover, row_height, &style);
            let list_hovered = if show_list {
                paint_list(ui, rows, hover, &style)
            } else {
                None
            };
            super::publish_hover(ui, chart.id, Some(hover), chart_hovered.or(list_hovered));
            chart
        })
        .inner
    }
}

impl crate::themes::Styled for RunTimeline<'_> {
    type Style = CellGraphStyle;

    fn styled(mut self, style: Self::Style) -> Self {
        self.style = Some(style);
        self
    }
}

/// Time span covered by `rows`. In-flight rows extend to the latest known
/// timestamp.
fn time_range(rows: &[ChartValues]) -> Option<(f64, f64)> {
    let start = rows.iter().map(|row| row.start_time).fold(f64::INFINITY, f64::min);
    let end = rows
        .iter()
        .map(|row| row.end_time.unwrap_or(row.start_time))
        .fold(f64::NEG_INFINITY, f64::max);
    (start.is_finite() && end.is_finite()).then_some((start, end.max(start)))
}

fn row_label(row: &ChartValues) -> String {
    match row.cell_num {
        Some(num) => format!("cell-{num}"),
        None => row.cell.to_string(),
    }
}

fn paint_chart(
    ui: &mut Ui,
    rows: &[ChartValues],
    hover: &SharedHover,
    row_height: f32,
    style: &CellGraphStyle,
) -> (Response, Option<CellId>) {
    let font_id = TextStyle::Small.resolve(ui.style());
    let axis_height = ui.text_style_height(&TextStyle::Small) + 4.0;
    let label_width = 64.0;
    let desired = vec2(
        ui.available_width().max(128.0),
        rows.len() as f32 * row_height + axis_height,
    );
    let (rect, response) = ui.allocate_exact_size(desired, Sense::hover());
    let Some((start, end)) = time_range(rows) else {
        return (response, None);
    };
    if !ui.is_rect_visible(rect) {
        return (response, None);
    }

    let plot = Rect::from_min_max(
        pos2(rect.left() + label_width, rect.top()),
        pos2(rect.right(), rect.bottom() - axis_height),
    );
    let span = (end - start).max(1e-3);
    let x_at = |t: f64| plot.left() + ((t - start) / span) as f32 * plot.width();

    let painter = ui.painter().with_clip_rect(rect);
    let pointer = ui
        .input(|input| input.pointer.hover_pos())
        .filter(|pos| rect.contains(*pos));
    let mut hovered = None;

    for (idx, row) in rows.iter().enumerate() {
        let top = plot.top() + idx as f32 * row_height;
        let row_rect = Rect::from_min_max(pos2(rect.left(), top), pos2(plot.right(), top + row_height));
        if pointer.is_some_and(|pos| row_rect.contains(pos)) {
            hovered = Some(row.cell.clone());
        }
        let is_hovered = hover.is_hovered(&row.cell) || hovered.as_ref() == Some(&row.cell);

        painter.text(
            pos2(rect.left(), row_rect.center().y),
            Align2::LEFT_CENTER,
            row_label(row),
            font_id.clone(),
            themes::cell_color(row.cell.as_str()),
        );

        let x0 = x_at(row.start_time);
        let x1 = x_at(row.end_time.unwrap_or(end)).max(x0 + 2.0);
        let bar = Rect::from_min_max(pos2(x0, top + 2.0), pos2(x1, top + row_height - 2.0));
        let fill = style.bar_fill(row.tone());
        let fill = if row.is_in_flight() {
            themes::blend(fill, style.background, 0.5)
        } else {
            fill
        };
        painter.rect_filled(bar, style.rounding, fill);
        if is_hovered {
            painter.rect_stroke(bar, style.rounding, style.highlight_stroke(), egui::StrokeKind::Outside);
        }
    }

    painter.line_segment(
        [plot.left_bottom(), plot.right_bottom()],
        Stroke::new(1.0, style.outline),
    );
    painter.text(
        plot.left_bottom() + vec2(0.0, 2.0),
        Align2::LEFT_TOP,
        format_chart_time(start),
        font_id.clone(),
        style.ink,
    );
    painter.text(
        plot.right_bottom() + vec2(0.0, 2.0),
        Align2::RIGHT_TOP,
        format_elapsed_time(Some((end - start) * 1000.0)),
        font_id,
        style.ink,
    );

    (response, hovered)
}

fn paint_list(
    ui: &mut Ui,
    rows: &[ChartValues],
    hover: &SharedHover,
    style: &CellGraphStyle,
) -> Option<CellId> {
    let mut hovered = None;
    for row in rows {
        let is_hovered = hover.is_hovered(&row.cell);
        let text = format!(
            "{} {:<10} {}  {}",
            CellGraphStyle::status_icon(row.status),
            row_label(row),
            row.start_timestamp,
            row.elapsed_time
        );
        let mut rich = RichText::new(text).monospace();
        if is_hovered {
            rich = rich.color(style.accent);
        }
        let response = ui.add(egui::Label::new(rich).sense(Sense::hover()));
        if response.hovered() {
            hovered = Some(row.cell.clone());
        }
    }
    hovered
}
