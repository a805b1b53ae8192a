//! Dark theme and the colors used by the charts.

use egui::{Color32, Rounding, Stroke, Visuals};

// Dracula palette
pub const BACKGROUND: Color32 = Color32::from_rgb(40, 42, 54);
pub const CURRENT_LINE: Color32 = Color32::from_rgb(68, 71, 90);
pub const FOREGROUND: Color32 = Color32::from_rgb(248, 248, 242);
pub const COMMENT: Color32 = Color32::from_rgb(98, 114, 164);
pub const CYAN: Color32 = Color32::from_rgb(139, 233, 253);
pub const GREEN: Color32 = Color32::from_rgb(80, 250, 123);
pub const ORANGE: Color32 = Color32::from_rgb(255, 184, 108);
pub const PINK: Color32 = Color32::from_rgb(255, 121, 198);
pub const PURPLE: Color32 = Color32::from_rgb(189, 147, 249);
pub const RED: Color32 = Color32::from_rgb(255, 85, 85);
pub const YELLOW: Color32 = Color32::from_rgb(241, 250, 140);

/// Line of the round being monitored.
pub const CURRENT_ROUND: Color32 = CYAN;
/// Line of the round it is compared against.
pub const PREVIOUS_ROUND: Color32 = ORANGE;
pub const DIFFERENCE: Color32 = GREEN;
pub const HOURLY: Color32 = PURPLE;
pub const DELTA: Color32 = YELLOW;
pub const BAR: Color32 = PINK;
pub const GRID: Color32 = CURRENT_LINE;

pub fn apply_dark_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = BACKGROUND;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, FOREGROUND);

    visuals.widgets.inactive.bg_fill = CURRENT_LINE;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, FOREGROUND);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = COMMENT;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    // dark text on the light accent
    visuals.widgets.active.bg_fill = PURPLE;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, BACKGROUND);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.selection.bg_fill = PINK;
    visuals.selection.stroke = Stroke::new(1.0, BACKGROUND);

    visuals.window_fill = BACKGROUND;
    visuals.panel_fill = BACKGROUND;
    visuals.extreme_bg_color = Color32::from_rgb(33, 34, 44);
    visuals.hyperlink_color = CYAN;

    ctx.set_visuals(visuals);
}

pub fn error_color() -> Color32 {
    RED
}

pub fn success_color() -> Color32 {
    GREEN
}

pub fn muted_color() -> Color32 {
    COMMENT
}
