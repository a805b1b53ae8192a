//! Charts drawn directly with the egui painter.

use super::theme;
use crate::core::processor::ChartBar;
use crate::core::report::group_thousands;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};

const CHART_HEIGHT: f32 = 220.0;
const MARGIN_LEFT: f32 = 70.0;
const MARGIN_BOTTOM: f32 = 22.0;
const MARGIN_TOP: f32 = 8.0;
const GRID_LINES: usize = 4;

/// One plotted line.
pub struct Line<'a> {
    pub name: &'a str,
    pub color: Color32,
    pub values: Vec<f64>,
}

/// Value range covering every point, always containing zero.
pub fn value_range<'a>(lines: impl IntoIterator<Item = &'a [f64]>) -> (f64, f64) {
    let (mut min, mut max) = (0.0_f64, 0.0_f64);
    for v in lines.into_iter().flatten() {
        min = min.min(*v);
        max = max.max(*v);
    }
    if max - min < f64::EPSILON {
        max = min + 1.0;
    }
    (min, max)
}

/// Index of the point closest to `x` when `count` points are spread over
/// `[left, right]`.
pub fn nearest_index(x: f32, left: f32, right: f32, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    if count == 1 || right <= left {
        return Some(0);
    }
    let step = (right - left) / (count - 1) as f32;
    let i = ((x - left) / step).round().clamp(0.0, (count - 1) as f32);
    Some(i as usize)
}

fn axis_text(value: f64) -> String {
    if value.fract().abs() > f64::EPSILON && value.abs() < 100.0 {
        format!("{value:.1}")
    } else if value < 0.0 {
        format!("-{}", group_thousands(value.abs().round() as u64))
    } else {
        group_thousands(value.round() as u64)
    }
}

struct Frame {
    plot: Rect,
    min: f64,
    max: f64,
    count: usize,
}

impl Frame {
    fn x(&self, i: usize) -> f32 {
        if self.count <= 1 {
            self.plot.center().x
        } else {
            self.plot.left() + self.plot.width() * i as f32 / (self.count - 1) as f32
        }
    }

    fn y(&self, v: f64) -> f32 {
        let t = ((v - self.min) / (self.max - self.min)) as f32;
        self.plot.bottom() - t * self.plot.height()
    }
}

fn draw_axes(painter: &egui::Painter, frame: &Frame, x_labels: &[String]) {
    let font = FontId::proportional(11.0);
    for k in 0..=GRID_LINES {
        let v = frame.min + (frame.max - frame.min) * k as f64 / GRID_LINES as f64;
        let y = frame.y(v);
        painter.line_segment(
            [Pos2::new(frame.plot.left(), y), Pos2::new(frame.plot.right(), y)],
            Stroke::new(1.0, theme::GRID),
        );
        painter.text(
            Pos2::new(frame.plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            axis_text(v),
            font.clone(),
            theme::muted_color(),
        );
    }

    if frame.min < 0.0 {
        let y = frame.y(0.0);
        painter.line_segment(
            [Pos2::new(frame.plot.left(), y), Pos2::new(frame.plot.right(), y)],
            Stroke::new(1.0, theme::COMMENT),
        );
    }

    // label every n-th slot so the axis stays readable
    let every = (x_labels.len() / 8).max(1);
    for (i, label) in x_labels.iter().enumerate().step_by(every) {
        painter.text(
            Pos2::new(frame.x(i), frame.plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            label,
            font.clone(),
            theme::muted_color(),
        );
    }
}

/// Line chart over the slots in `x_labels`. Hovering shows every line's value
/// at the nearest slot.
pub fn line_chart(ui: &mut egui::Ui, title: &str, x_labels: &[String], lines: &[Line<'_>]) {
    ui.horizontal(|ui| {
        ui.strong(title);
        for line in lines {
            ui.add_space(8.0);
            ui.colored_label(line.color, format!("● {}", line.name));
        }
    });

    let count = x_labels.len();
    if count == 0 {
        ui.label(egui::RichText::new("No turnout data yet.").color(theme::muted_color()));
        return;
    }

    let size = Vec2::new(ui.available_width(), CHART_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let plot = Rect::from_min_max(
        Pos2::new(rect.left() + MARGIN_LEFT, rect.top() + MARGIN_TOP),
        Pos2::new(rect.right() - 10.0, rect.bottom() - MARGIN_BOTTOM),
    );
    let (min, max) = value_range(lines.iter().map(|l| l.values.as_slice()));
    let frame = Frame {
        plot,
        min,
        max,
        count,
    };

    draw_axes(&painter, &frame, x_labels);

    for line in lines {
        let points: Vec<Pos2> = line
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| Pos2::new(frame.x(i), frame.y(*v)))
            .collect();
        if points.len() == 1 {
            painter.circle_filled(points[0], 3.0, line.color);
        } else {
            painter.add(Shape::line(points, Stroke::new(2.0, line.color)));
        }
    }

    let Some(pointer) = response.hover_pos() else {
        return;
    };
    if !plot.x_range().contains(pointer.x) {
        return;
    }
    let Some(i) = nearest_index(pointer.x, plot.left(), plot.right(), count) else {
        return;
    };
    let x = frame.x(i);
    painter.line_segment(
        [Pos2::new(x, plot.top()), Pos2::new(x, plot.bottom())],
        Stroke::new(1.0, theme::COMMENT),
    );
    for line in lines {
        if let Some(v) = line.values.get(i) {
            painter.circle_filled(Pos2::new(x, frame.y(*v)), 4.0, line.color);
        }
    }
    response.on_hover_ui_at_pointer(|ui| {
        ui.strong(&x_labels[i]);
        for line in lines {
            if let Some(v) = line.values.get(i) {
                ui.colored_label(line.color, format!("{}: {}", line.name, axis_text(*v)));
            }
        }
    });
}

/// Horizontal bars, one row per tally, longest first.
pub fn bar_chart(ui: &mut egui::Ui, title: &str, bars: &[ChartBar]) {
    ui.strong(title);
    if bars.is_empty() {
        ui.label(egui::RichText::new("No tallies.").color(theme::muted_color()));
        return;
    }

    let row_height = 20.0;
    let label_width = 180.0;
    let size = Vec2::new(ui.available_width(), row_height * bars.len() as f32 + 4.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let max_votes = bars.iter().map(|b| b.votes).max().unwrap_or(0).max(1);
    let bar_space = (rect.width() - label_width - 130.0).max(20.0);
    let font = FontId::proportional(12.0);

    let mut hovered = None;
    for (i, bar) in bars.iter().enumerate() {
        let top = rect.top() + i as f32 * row_height;
        let label: String = bar.label.chars().take(28).collect();
        painter.text(
            Pos2::new(rect.left(), top + row_height / 2.0),
            Align2::LEFT_CENTER,
            label,
            font.clone(),
            theme::FOREGROUND,
        );

        let width = bar_space * bar.votes as f32 / max_votes as f32;
        let bar_rect = Rect::from_min_size(
            Pos2::new(rect.left() + label_width, top + 3.0),
            Vec2::new(width.max(1.0), row_height - 6.0),
        );
        let row_rect = Rect::from_min_size(
            Pos2::new(rect.left(), top),
            Vec2::new(rect.width(), row_height),
        );
        let is_hovered = response
            .hover_pos()
            .is_some_and(|p| row_rect.contains(p));
        if is_hovered {
            hovered = Some(i);
        }
        let color = if is_hovered { theme::YELLOW } else { theme::BAR };
        painter.rect_filled(bar_rect, 2.0, color);
        painter.text(
            Pos2::new(bar_rect.right() + 6.0, top + row_height / 2.0),
            Align2::LEFT_CENTER,
            format!("{} ({:.2}%)", group_thousands(bar.votes), bar.percent),
            font.clone(),
            theme::muted_color(),
        );
    }

    if let Some(i) = hovered {
        let bar = &bars[i];
        response.on_hover_ui_at_pointer(|ui| {
            ui.strong(&bar.label);
            ui.label(format!("{} votes, {:.2}%", group_thousands(bar.votes), bar.percent));
        });
    }
}
