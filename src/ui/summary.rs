//! Summary panel: totals, ranked tallies and the turnout tables.

use super::charts::{self, Line};
use super::theme;
use crate::core::model::TurnoutSeries;
use crate::core::monitor::CountryView;
use crate::core::processor::TurnoutStats;
use crate::core::report::{delta_text, group_thousands, signed};
use crate::core::search::display_name;
use crate::utils::clipboard;

/// Headline figures at the top of the summary panel.
pub fn totals(ui: &mut egui::Ui, view: &CountryView, live_total: Option<u64>) {
    egui::Grid::new("totals_grid")
        .num_columns(2)
        .spacing([16.0, 6.0])
        .show(ui, |ui| {
            ui.label("Country:");
            ui.strong(display_name(&view.summary.country));
            ui.end_row();

            ui.label("Votes counted:");
            ui.strong(group_thousands(view.summary.total_votes));
            ui.end_row();

            if let Some(latest) = view.latest {
                ui.label("Difference:");
                let diff = latest.current as i64 - latest.previous as i64;
                let color = if diff >= 0 {
                    theme::success_color()
                } else {
                    theme::error_color()
                };
                ui.colored_label(color, signed(diff));
                ui.end_row();

                ui.label("Hourly gain:");
                ui.label(signed(latest.hourly_increase));
                ui.end_row();
            }

            ui.label("Live total:");
            match live_total {
                Some(total) => ui.strong(group_thousands(total)),
                None => ui.label("-"),
            };
            ui.end_row();

            ui.label("Retrieved:");
            ui.label(
                view.summary
                    .retrieved_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            );
            ui.end_row();
        });
}

/// Ranked tallies of the selected country.
pub fn ranking(ui: &mut egui::Ui, view: &CountryView) {
    egui::ScrollArea::vertical()
        .id_salt("ranking_scroll")
        .max_height(260.0)
        .show(ui, |ui| {
            egui::Grid::new("ranking_grid")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui| {
                    ui.strong("#");
                    ui.strong("Label");
                    ui.strong("Votes");
                    ui.strong("%");
                    ui.end_row();

                    for row in &view.summary.rows {
                        ui.label(row.rank.to_string());
                        ui.label(&row.label);
                        ui.label(group_thousands(row.votes));
                        ui.label(format!("{:.2}", row.percent));
                        ui.end_row();
                    }
                });
        });
}

/// Turnout text tables with a copy button.
pub fn report(ui: &mut egui::Ui, view: &CountryView, status: &mut String) {
    ui.horizontal(|ui| {
        ui.strong("Turnout tables");
        if ui.button("📋 Copy").on_hover_text("Copy to clipboard").clicked() {
            *status = if clipboard::copy_to_clipboard(&view.report) {
                "Report copied to clipboard".to_string()
            } else {
                "Clipboard unavailable".to_string()
            };
        }
    });

    let mut text = view.report.clone();
    egui::ScrollArea::both()
        .id_salt("report_scroll")
        .max_height(360.0)
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY)
                    .interactive(false),
            );
        });
}

fn slot_labels(series: &TurnoutSeries) -> Vec<String> {
    series
        .samples
        .iter()
        .map(|s| s.slot.format("%d %H:00").to_string())
        .collect()
}

/// Both rounds and their difference for one scope.
pub fn turnout_chart(ui: &mut egui::Ui, series: &TurnoutSeries, labels: (&str, &str)) {
    let (current, previous) = labels;
    let samples = &series.samples;
    let lines = [
        Line {
            name: current,
            color: theme::CURRENT_ROUND,
            values: samples.iter().map(|s| s.current as f64).collect(),
        },
        Line {
            name: previous,
            color: theme::PREVIOUS_ROUND,
            values: samples.iter().map(|s| s.previous as f64).collect(),
        },
        Line {
            name: "Difference",
            color: theme::DIFFERENCE,
            values: samples.iter().map(|s| s.difference() as f64).collect(),
        },
    ];
    charts::line_chart(
        ui,
        &format!("Turnout: {}", series.scope),
        &slot_labels(series),
        &lines,
    );
}

/// Hourly gains and delta percentages for one scope.
pub fn stats_chart(ui: &mut egui::Ui, series: &TurnoutSeries, stats: &TurnoutStats) {
    let x_labels = slot_labels(series);
    charts::line_chart(
        ui,
        &format!("Hourly gain: {}", series.scope),
        &x_labels,
        &[Line {
            name: "Hourly gain",
            color: theme::HOURLY,
            values: stats.hourly_increases.iter().map(|v| *v as f64).collect(),
        }],
    );
    ui.add_space(8.0);
    charts::line_chart(
        ui,
        &format!("Delta %: {}", series.scope),
        &x_labels,
        &[Line {
            name: "Delta %",
            color: theme::DELTA,
            values: stats
                .delta_percents
                .iter()
                .map(|d| d.unwrap_or(0.0))
                .collect(),
        }],
    );
    if let Some(last) = stats.delta_percents.last() {
        ui.label(
            egui::RichText::new(format!("Latest delta: {}", delta_text(*last)))
                .color(theme::muted_color()),
        );
    }
}
